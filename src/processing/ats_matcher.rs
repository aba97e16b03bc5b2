//! ATS (Applicant Tracking System) keyword matching with synonym expansion

use crate::error::Result;
use crate::processing::keyword_extractor::KeywordSet;
use crate::processing::synonyms::SynonymTable;
use crate::processing::text_processor::{normalize_term, short_form_present, PhraseIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use strsim::{jaro_winkler, levenshtein};

/// ATS matcher for exact, synonym and near-match keyword matching
pub struct ATSMatcher {
    synonyms: Arc<SynonymTable>,
    near_match: bool,
    near_match_min_len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordMatch {
    pub keyword: String,
    /// Normalized form that was found in the resume.
    pub matched_form: String,
    pub count: usize,
    pub match_type: MatchType,
    /// Jaro-Winkler similarity of a near match; 1.0 otherwise.
    pub similarity_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Synonym,
    NearMatch,
}

/// Match outcome for one keyword collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionMatch {
    pub matched: Vec<KeywordMatch>,
    pub missing: Vec<String>,
    pub match_percentage: f64,
}

impl CollectionMatch {
    pub fn total(&self) -> usize {
        self.matched.len() + self.missing.len()
    }

    pub fn matched_keywords(&self) -> Vec<String> {
        self.matched.iter().map(|m| m.keyword.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMatchResult {
    pub required: CollectionMatch,
    pub preferred: CollectionMatch,
}

impl ATSMatcher {
    pub fn new(synonyms: Arc<SynonymTable>) -> Self {
        Self {
            synonyms,
            near_match: true,
            near_match_min_len: 6,
        }
    }

    /// Enable or disable the edit-distance pass
    pub fn with_near_match(mut self, enabled: bool) -> Self {
        self.near_match = enabled;
        self
    }

    /// Match both collections of a keyword set against resume text.
    pub fn match_keywords(&self, resume_text: &str, keywords: &KeywordSet) -> Result<KeywordMatchResult> {
        let normalized = normalize_term(resume_text);
        Ok(KeywordMatchResult {
            required: self.match_collection(resume_text, &normalized, &keywords.required)?,
            preferred: self.match_collection(resume_text, &normalized, &keywords.preferred)?,
        })
    }

    /// A collection with no keywords matches vacuously at 100%.
    pub fn match_collection(
        &self,
        resume_text: &str,
        normalized_resume: &str,
        keywords: &[String],
    ) -> Result<CollectionMatch> {
        if keywords.is_empty() {
            return Ok(CollectionMatch {
                matched: Vec::new(),
                missing: Vec::new(),
                match_percentage: 100.0,
            });
        }

        // Every synonym form of every keyword, tagged with its keyword index
        let forms: Vec<(usize, String)> = keywords
            .iter()
            .enumerate()
            .flat_map(|(kid, k)| self.synonyms.resolve(k).into_iter().map(move |f| (kid, f)))
            .collect();
        let index = PhraseIndex::new(forms.iter().enumerate().map(|(id, (_, f))| (f.as_str(), id)))?;

        let mut hits: HashMap<usize, HashMap<usize, usize>> = HashMap::new();
        for id in index.occurrences(normalized_resume) {
            let (kid, form) = &forms[id];
            if short_form_present(resume_text, form) {
                *hits.entry(*kid).or_default().entry(id).or_default() += 1;
            }
        }

        let resume_tokens: BTreeSet<&str> = normalized_resume.split(' ').collect();
        let mut matched = Vec::new();
        let mut missing = Vec::new();

        for (kid, keyword) in keywords.iter().enumerate() {
            let own_form = normalize_term(keyword);
            // prefer the keyword's own spelling, then the most frequent synonym
            let best = hits.get(&kid).and_then(|found| {
                found
                    .iter()
                    .max_by_key(|(id, count)| (forms[**id].1 == own_form, **count, std::cmp::Reverse(**id)))
                    .map(|(&id, _)| (id, found.values().sum::<usize>()))
            });

            if let Some((best, count)) = best {
                let matched_form = forms[best].1.clone();
                matched.push(KeywordMatch {
                    keyword: keyword.clone(),
                    match_type: if matched_form == own_form {
                        MatchType::Exact
                    } else {
                        MatchType::Synonym
                    },
                    matched_form,
                    count,
                    similarity_score: 1.0,
                });
            } else if let Some(near) = self.near_match_for(keyword, &resume_tokens) {
                matched.push(near);
            } else {
                missing.push(keyword.clone());
            }
        }

        let match_percentage = matched.len() as f64 / keywords.len() as f64 * 100.0;
        Ok(CollectionMatch {
            matched,
            missing,
            match_percentage,
        })
    }

    /// Single-token forms of at least `near_match_min_len` characters match a resume token
    /// one insertion or deletion away with the same first letter ("kubernete", "postgressql").
    fn near_match_for(&self, keyword: &str, resume_tokens: &BTreeSet<&str>) -> Option<KeywordMatch> {
        if !self.near_match {
            return None;
        }
        for form in self.synonyms.resolve(keyword) {
            let form_len = form.chars().count();
            if form.contains(' ') || form_len < self.near_match_min_len {
                continue;
            }
            let best = resume_tokens
                .iter()
                .filter(|token| {
                    let token_len = token.chars().count();
                    token_len.abs_diff(form_len) == 1
                        && token.chars().next() == form.chars().next()
                        && levenshtein(token, &form) == 1
                })
                .map(|token| (*token, jaro_winkler(token, &form)))
                .max_by(|a, b| a.1.total_cmp(&b.1));

            if let Some((token, similarity)) = best {
                return Some(KeywordMatch {
                    keyword: keyword.to_string(),
                    matched_form: token.to_string(),
                    count: 1,
                    match_type: MatchType::NearMatch,
                    similarity_score: similarity,
                });
            }
        }
        None
    }
}
