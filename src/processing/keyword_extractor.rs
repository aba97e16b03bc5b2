//! Job description keyword extraction and required/preferred classification

use crate::error::{Result, ScorerError};
use crate::processing::document::{is_bullet_line, strip_bullet_marker};
use crate::processing::synonyms::{SynonymTable, TermCategory};
use crate::processing::text_processor::{
    normalize_term, padded, short_form_present, PhraseIndex, TextProcessor,
};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// Two disjoint keyword collections. A keyword (or any of its synonyms) appears in at
/// most one of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordSet {
    pub required: Vec<String>,
    pub preferred: Vec<String>,
}

impl KeywordSet {
    /// Deduplicate by synonym group; a keyword listed in both collections stays required.
    pub fn new<R, P>(required: R, preferred: P, synonyms: &SynonymTable) -> Self
    where
        R: IntoIterator<Item = String>,
        P: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        let mut keep = |items: Vec<String>| -> Vec<String> {
            items
                .into_iter()
                .filter(|k| !k.trim().is_empty())
                .filter(|k| seen.insert(synonyms.key(k)))
                .collect()
        };
        let required = keep(required.into_iter().collect());
        let preferred = keep(preferred.into_iter().collect());
        Self { required, preferred }
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.preferred.is_empty()
    }

    pub fn len(&self) -> usize {
        self.required.len() + self.preferred.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionLabel {
    Requirements,
    Qualifications,
    Responsibilities,
    Preferred,
    Unlabeled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordKind {
    Technology,
    SoftSkill,
    Industry,
    Certification,
    Education,
    Role,
    Phrase,
}

impl From<TermCategory> for KeywordKind {
    fn from(category: TermCategory) -> Self {
        match category {
            TermCategory::Technology => KeywordKind::Technology,
            TermCategory::SoftSkill => KeywordKind::SoftSkill,
            TermCategory::Industry => KeywordKind::Industry,
            TermCategory::Certification => KeywordKind::Certification,
            TermCategory::Role => KeywordKind::Role,
        }
    }
}

/// Which precedence rule decided a keyword's class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationRule {
    PreferredSection,
    RequiredIndicator,
    Frequent,
    Repeated,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedKeyword {
    pub keyword: String,
    pub kind: KeywordKind,
    pub occurrences: usize,
    pub required: bool,
    pub rule: ClassificationRule,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedKeywords {
    pub keywords: KeywordSet,
    pub details: Vec<ExtractedKeyword>,
}

impl ExtractedKeywords {
    /// An empty result means the job description is unusable for ATS simulation.
    pub fn is_usable(&self) -> bool {
        !self.keywords.is_empty()
    }
}

const REQUIRED_INDICATORS: &[&str] = &[
    "required", "must have", "essential", "mandatory", "critical", "minimum", "necessary",
];

const GENERIC_WORDS: &[&str] = &[
    "about", "apply", "benefits", "requirements", "qualifications", "responsibilities",
    "preferred", "nice", "required", "equal", "opportunity", "employer", "inc", "llc", "ltd",
    "corp", "eeo", "job", "description", "title", "location", "remote", "hybrid", "salary",
    "summary", "overview", "bonus", "monday", "friday", "january", "february", "march",
    "april", "june", "july", "august", "september", "october", "november", "december",
    "senior", "junior", "lead", "principal", "staff", "engineer", "manager", "position",
];

const HEADING_WORDS: &[&str] = &[
    "preferred", "desired", "qualifications", "qualification", "requirements", "requirement",
    "required", "nice", "to", "have", "haves", "must", "skills", "minimum", "basic", "bonus",
    "points", "pluses", "what", "youll", "you", "will", "do", "bring", "responsibilities",
    "duties", "key", "job", "and", "experience", "additional", "technical", "your", "the",
    "role", "education", "core", "essential",
];

const NEUTRAL_HEADINGS: &[&str] = &[
    "about", "about us", "benefits", "perks", "company", "who we are", "our team", "culture",
    "compensation", "salary", "pay", "why join", "how to apply", "equal opportunity", "eeo",
    "location", "working here", "life at",
];

struct Candidate {
    display: String,
    kind: KeywordKind,
    forms: BTreeSet<String>,
    pattern: Option<usize>,
}

#[derive(Default)]
struct Evidence {
    occurrences: usize,
    in_preferred_section: bool,
    required_adjacent: bool,
}

pub struct KeywordExtractor {
    synonyms: Arc<SynonymTable>,
    processor: TextProcessor,
    term_index: PhraseIndex,
    term_forms: Vec<(usize, String)>,
    indicator_index: PhraseIndex,
    education_patterns: Vec<(&'static str, Regex)>,
    certification_regex: Regex,
    capitalized_regex: Regex,
    inline_heading_regex: Regex,
}

impl KeywordExtractor {
    pub fn new(synonyms: Arc<SynonymTable>) -> Result<Self> {
        let term_forms: Vec<(usize, String)> = synonyms
            .groups()
            .iter()
            .enumerate()
            .flat_map(|(gid, g)| g.forms.iter().map(move |f| (gid, f.clone())))
            .collect();
        let term_index = PhraseIndex::new(
            term_forms.iter().enumerate().map(|(id, (_, form))| (form.as_str(), id)),
        )?;
        let indicator_index = PhraseIndex::new(REQUIRED_INDICATORS.iter().map(|p| (*p, 0)))?;

        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| ScorerError::Processing(format!("Invalid extractor pattern: {}", e)))
        };

        let education_patterns = vec![
            ("Bachelor's Degree", compile(r"(?i)\bbachelor|\bb\.(?:s|a|sc)\.|\bbsc\b")?),
            ("Master's Degree", compile(r"(?i)\bmasters?'?s?\s+(?:degree|of|in)\b|\bm\.(?:s|a|sc)\.|\bmsc\b")?),
            ("MBA", compile(r"(?i)\bmba\b")?),
            ("PhD", compile(r"(?i)\bph\.?\s?d\b|\bdoctorate\b")?),
            ("Associate Degree", compile(r"(?i)\bassociate'?s?\s+degree\b")?),
        ];

        Ok(Self {
            synonyms,
            processor: TextProcessor::new(),
            term_index,
            term_forms,
            indicator_index,
            education_patterns,
            certification_regex: compile(
                r"\b(?:[A-Z][A-Za-z0-9+]*\s+){1,4}(?:Certification|Certificate)\b|\bCertified(?:\s+[A-Z][A-Za-z0-9+]*){1,4}",
            )?,
            capitalized_regex: compile(r"\b[A-Z][A-Za-z0-9+#]*(?: [A-Z][A-Za-z0-9+#]*){0,2}")?,
            inline_heading_regex: compile(r"^([A-Za-z][A-Za-z0-9 '/&()-]{0,48}?)\s*:\s*(.*)$")?,
        })
    }

    /// Keywords of a job description, classified as required or preferred.
    pub fn extract(&self, job_description: &str) -> ExtractedKeywords {
        if job_description.trim().is_empty() {
            return ExtractedKeywords::default();
        }

        let cleaned = self.processor.clean_text(job_description);
        let segments: Vec<(SectionLabel, String)> = self
            .split_sections(&cleaned)
            .into_iter()
            .flat_map(|(label, text)| {
                self.processor
                    .segments(&text)
                    .into_iter()
                    .map(move |s| (label, strip_bullet_marker(&s).to_string()))
            })
            .filter(|(_, s)| !s.is_empty())
            .collect();

        let candidates = self.collect_candidates(&segments);
        if candidates.is_empty() {
            return ExtractedKeywords::default();
        }
        let evidence = self.gather_evidence(&candidates, &segments);

        let mut required = Vec::new();
        let mut preferred = Vec::new();
        let mut details = Vec::new();
        for (candidate, ev) in candidates.iter().zip(evidence) {
            let (is_required, rule) = classify(&ev);
            if is_required {
                required.push(candidate.display.clone());
            } else {
                preferred.push(candidate.display.clone());
            }
            details.push(ExtractedKeyword {
                keyword: candidate.display.clone(),
                kind: candidate.kind,
                occurrences: ev.occurrences,
                required: is_required,
                rule,
            });
        }

        let keywords = KeywordSet::new(required, preferred, &self.synonyms);
        debug!(
            "Extracted {} required and {} preferred keywords",
            keywords.required.len(),
            keywords.preferred.len()
        );
        ExtractedKeywords { keywords, details }
    }

    /// Split text into labeled sections by heading cues. Inline headings ("Required: Java")
    /// keep their line so the heading word stays adjacent to its keywords.
    fn split_sections(&self, text: &str) -> Vec<(SectionLabel, String)> {
        let mut sections = Vec::new();
        let mut label = SectionLabel::Unlabeled;
        let mut body = String::new();

        let mut start = |new_label: SectionLabel, body: &mut String, label: &mut SectionLabel| {
            if !body.trim().is_empty() {
                sections.push((*label, std::mem::take(body)));
            }
            body.clear();
            *label = new_label;
        };

        for raw in text.lines() {
            let line = raw
                .trim()
                .trim_start_matches('#')
                .trim_matches('*')
                .trim();
            if line.is_empty() {
                continue;
            }

            if let Some(caps) = self.inline_heading_regex.captures(line) {
                let head = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let rest = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
                let head_words = head.split_whitespace().count();
                if head_words <= 5 {
                    match (heading_label(head), rest.is_empty()) {
                        (Some(new_label), false) => {
                            start(new_label, &mut body, &mut label);
                            body.push_str(line);
                            body.push('\n');
                            continue;
                        }
                        (_, true) => {
                            if let Some(new_label) = section_change(head) {
                                start(new_label, &mut body, &mut label);
                            }
                            continue;
                        }
                        (None, false) => {}
                    }
                }
            }

            if is_standalone_heading(line) {
                if let Some(new_label) = section_change(line) {
                    start(new_label, &mut body, &mut label);
                }
                continue;
            }

            body.push_str(line);
            body.push('\n');
        }
        start(SectionLabel::Unlabeled, &mut body, &mut label);
        sections
    }

    fn collect_candidates(&self, segments: &[(SectionLabel, String)]) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut push = |candidate: Candidate, key: String| {
            if !seen.contains_key(&key) {
                seen.insert(key, candidates.len());
                candidates.push(candidate);
            }
        };

        for (_, segment) in segments {
            let normalized = normalize_term(segment);

            for id in self.term_index.occurrences(&normalized) {
                let (gid, form) = &self.term_forms[id];
                if !short_form_present(segment, form) {
                    continue;
                }
                let group = &self.synonyms.groups()[*gid];
                push(
                    Candidate {
                        display: group.canonical.clone(),
                        kind: group.category.into(),
                        forms: group.forms.clone(),
                        pattern: None,
                    },
                    normalize_term(&group.canonical),
                );
            }

            for (idx, (display, regex)) in self.education_patterns.iter().enumerate() {
                if regex.is_match(segment) {
                    push(
                        Candidate {
                            display: display.to_string(),
                            kind: KeywordKind::Education,
                            forms: BTreeSet::new(),
                            pattern: Some(idx),
                        },
                        normalize_term(display),
                    );
                }
            }

            for m in self.certification_regex.find_iter(segment) {
                let display = m.as_str().trim().to_string();
                push(
                    Candidate {
                        kind: KeywordKind::Certification,
                        forms: self.synonyms.resolve(&display),
                        display: self.synonyms.canonical(&display),
                        pattern: None,
                    },
                    self.synonyms.key(&display),
                );
            }

            for phrase in self.capitalized_phrases(segment) {
                let key = self.synonyms.key(&phrase);
                push(
                    Candidate {
                        forms: self.synonyms.resolve(&phrase),
                        display: phrase,
                        kind: KeywordKind::Phrase,
                        pattern: None,
                    },
                    key,
                );
            }
        }
        candidates
    }

    /// Capitalized noun phrases that no vocabulary covers: acronyms and mixed-case
    /// product names, or multi-word proper names away from the start of a sentence.
    fn capitalized_phrases(&self, segment: &str) -> Vec<String> {
        let mut phrases = Vec::new();
        for m in self.capitalized_regex.find_iter(segment) {
            let words: Vec<&str> = m.as_str().split(' ').collect();
            let generic = words.iter().any(|w| {
                let lower = w.to_lowercase();
                GENERIC_WORDS.contains(&lower.as_str()) || self.processor.is_stop_word(&lower)
            });
            if generic || words.iter().any(|w| w.chars().count() < 2) {
                continue;
            }

            let keep = if words.len() == 1 {
                let word = words[0];
                word.chars().skip(1).any(|c| c.is_uppercase() || c.is_ascii_digit())
            } else {
                m.start() > 0
            };
            if !keep {
                continue;
            }

            let phrase = m.as_str().to_string();
            let covered = self.synonyms.group(&phrase).is_some()
                || self.education_patterns.iter().any(|(_, re)| re.is_match(&phrase));
            if !covered {
                phrases.push(phrase);
            }
        }
        phrases
    }

    fn gather_evidence(&self, candidates: &[Candidate], segments: &[(SectionLabel, String)]) -> Vec<Evidence> {
        let forms: Vec<(usize, &str)> = candidates
            .iter()
            .enumerate()
            .flat_map(|(cid, c)| c.forms.iter().map(move |f| (cid, f.as_str())))
            .collect();
        let mut evidence: Vec<Evidence> = candidates.iter().map(|_| Evidence::default()).collect();

        let index = match PhraseIndex::new(forms.iter().enumerate().map(|(id, (_, f))| (*f, id))) {
            Ok(index) => Some(index),
            Err(e) => {
                debug!("Candidate index unavailable, counting patterns only: {}", e);
                None
            }
        };

        for (label, segment) in segments {
            let normalized = normalize_term(segment);
            let mut counts: HashMap<usize, usize> = HashMap::new();

            if let Some(index) = &index {
                for id in index.occurrences(&normalized) {
                    let (cid, form) = forms[id];
                    if short_form_present(segment, form) {
                        *counts.entry(cid).or_default() += 1;
                    }
                }
            }
            for (cid, candidate) in candidates.iter().enumerate() {
                if let Some(p) = candidate.pattern {
                    let n = self.education_patterns[p].1.find_iter(segment).count();
                    if n > 0 {
                        *counts.entry(cid).or_default() += n;
                    }
                }
            }

            let has_indicator = !self.indicator_index.occurrences(&normalized).is_empty();
            for (cid, n) in counts {
                let ev = &mut evidence[cid];
                ev.occurrences += n;
                match label {
                    SectionLabel::Preferred => ev.in_preferred_section = true,
                    SectionLabel::Requirements | SectionLabel::Qualifications if has_indicator => {
                        ev.required_adjacent = true
                    }
                    _ => {}
                }
            }
        }
        evidence
    }
}

/// First matching rule wins.
fn classify(ev: &Evidence) -> (bool, ClassificationRule) {
    if ev.in_preferred_section {
        (false, ClassificationRule::PreferredSection)
    } else if ev.required_adjacent {
        (true, ClassificationRule::RequiredIndicator)
    } else if ev.occurrences >= 3 {
        (true, ClassificationRule::Frequent)
    } else if ev.occurrences == 2 {
        (false, ClassificationRule::Repeated)
    } else {
        (false, ClassificationRule::Default)
    }
}

fn heading_label(text: &str) -> Option<SectionLabel> {
    let normalized = padded(&normalize_term(text));
    let has = |needles: &[&str]| needles.iter().any(|n| normalized.contains(&padded(n)));

    if has(&["nice to have", "nice to haves", "preferred", "desired", "bonus", "pluses"]) {
        Some(SectionLabel::Preferred)
    } else if has(&["requirements", "requirement", "required", "must haves"]) {
        Some(SectionLabel::Requirements)
    } else if has(&["qualifications", "qualification"]) {
        Some(SectionLabel::Qualifications)
    } else if has(&["responsibilities", "duties", "what youll do", "what you will do"]) {
        Some(SectionLabel::Responsibilities)
    } else {
        None
    }
}

/// Section a heading opens. Sub-headings such as "Technical skills" open nothing, so the
/// lines under them stay in the enclosing section; company, benefits and similar blocks
/// close it.
fn section_change(heading: &str) -> Option<SectionLabel> {
    heading_label(heading).or_else(|| is_neutral_heading(heading).then_some(SectionLabel::Unlabeled))
}

fn is_neutral_heading(text: &str) -> bool {
    let normalized = padded(&normalize_term(text));
    NEUTRAL_HEADINGS.iter().any(|n| normalized.contains(&padded(n)))
}

/// Short heading lines made only of heading vocabulary ("Preferred Qualifications"), or
/// all-caps labels such as "BENEFITS".
fn is_standalone_heading(line: &str) -> bool {
    let words = line.split_whitespace().count();
    if words == 0 || words > 6 || is_bullet_line(line) || line.ends_with(['.', ',', ';']) {
        return false;
    }
    let vocabulary_only = normalize_term(line)
        .split(' ')
        .all(|w| HEADING_WORDS.contains(&w));
    if vocabulary_only && heading_label(line).is_some() {
        return true;
    }
    let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    words <= 4 && letters.len() >= 3 && letters.iter().all(|c| c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> KeywordExtractor {
        KeywordExtractor::new(Arc::new(SynonymTable::builtin().unwrap())).unwrap()
    }

    const STARTUP_JD: &str = r#"
Senior Rust Engineer
We move fast and own everything end-to-end.

Requirements:
- 5+ years Rust required
- Distributed systems experience is a must have
- Experience with PostgreSQL

Nice to have:
- Kubernetes and Kafka experience

About Us:
Fast-paced startup building payment infrastructure with Rust and PostgreSQL.
"#;

    #[test]
    fn test_empty_description_yields_empty_set() {
        let extracted = extractor().extract("   \n\t ");
        assert!(extracted.keywords.is_empty());
        assert!(!extracted.is_usable());
    }

    #[test]
    fn test_required_indicator_in_requirements_section() {
        let extracted = extractor().extract(STARTUP_JD);
        assert!(extracted.keywords.required.contains(&"Rust".to_string()));
        assert!(extracted.keywords.required.contains(&"Distributed Systems".to_string()));
        let rust = extracted.details.iter().find(|d| d.keyword == "Rust").unwrap();
        assert_eq!(rust.rule, ClassificationRule::RequiredIndicator);
    }

    #[test]
    fn test_preferred_section_wins() {
        let extracted = extractor().extract(STARTUP_JD);
        assert!(extracted.keywords.preferred.contains(&"Kubernetes".to_string()));
        assert!(extracted.keywords.preferred.contains(&"Apache Kafka".to_string()));
        assert!(!extracted.keywords.required.contains(&"Kubernetes".to_string()));
    }

    #[test]
    fn test_frequency_rules() {
        let jd = "We use Docker daily. Docker powers our CI/CD. Everything ships in Docker.\n\
                  Terraform manages infra. Terraform is reviewed weekly.\n\
                  Some Jira usage.";
        let extracted = extractor().extract(jd);
        let rule_of = |k: &str| extracted.details.iter().find(|d| d.keyword == k).unwrap().rule;
        assert!(extracted.keywords.required.contains(&"Docker".to_string()));
        assert_eq!(rule_of("Docker"), ClassificationRule::Frequent);
        assert_eq!(rule_of("Terraform"), ClassificationRule::Repeated);
        assert_eq!(rule_of("Jira"), ClassificationRule::Default);
        assert!(extracted.keywords.preferred.contains(&"Jira".to_string()));
    }

    #[test]
    fn test_synonyms_deduplicate_and_count_together() {
        let jd = "Experience with k8s. Kubernetes operators. Deep kube knowledge.";
        let extracted = extractor().extract(jd);
        let kube: Vec<_> = extracted.details.iter().filter(|d| d.keyword == "Kubernetes").collect();
        assert_eq!(kube.len(), 1);
        assert_eq!(kube[0].occurrences, 3);
        assert_eq!(extracted.keywords.len(), 1);
    }

    #[test]
    fn test_english_go_is_not_the_language() {
        let extracted = extractor().extract("Ready to go the extra mile with Python.");
        assert!(!extracted.keywords.preferred.contains(&"Go".to_string()));
        let extracted = extractor().extract("Services written in Go and Python.");
        assert!(extracted.keywords.preferred.contains(&"Go".to_string()));
    }

    #[test]
    fn test_education_and_certification_candidates() {
        let jd = "Qualifications:\nBachelor's degree in Computer Science required.\n\
                  Salesforce Administrator Certification preferred.";
        let extracted = extractor().extract(jd);
        assert!(extracted.keywords.required.contains(&"Bachelor's Degree".to_string()));
        assert!(extracted
            .details
            .iter()
            .any(|d| d.kind == KeywordKind::Certification && d.keyword.contains("Certification")));
    }

    #[test]
    fn test_capitalized_phrase_heuristic() {
        let jd = "You will report using Google Analytics and HubSpot dashboards.";
        let extracted = extractor().extract(jd);
        let phrases: Vec<_> = extracted
            .details
            .iter()
            .filter(|d| d.kind == KeywordKind::Phrase)
            .map(|d| d.keyword.as_str())
            .collect();
        assert!(phrases.contains(&"Google Analytics"));
        assert!(phrases.contains(&"HubSpot"));
        assert!(!phrases.contains(&"You"));
    }

    #[test]
    fn test_sub_heading_keeps_enclosing_section() {
        let extracted = extractor().extract("Requirements\nTechnical skills:\n- Python required");
        let python = extracted.details.iter().find(|d| d.keyword == "Python").unwrap();
        assert!(python.required);
        assert_eq!(python.rule, ClassificationRule::RequiredIndicator);

        let extracted = extractor().extract("Qualifications\nIn this role you will:\n- Build Rust services, a must have");
        let rust = extracted.details.iter().find(|d| d.keyword == "Rust").unwrap();
        assert_eq!(rust.rule, ClassificationRule::RequiredIndicator);
    }

    #[test]
    fn test_company_heading_closes_section() {
        // Rust is only mentioned after the preferred block has been closed
        let jd = "Nice to have:\n- Docker\nAbout Us:\nRust powers our API. Rust powers our workers. Rust ships daily.";
        let extracted = extractor().extract(jd);
        let rust = extracted.details.iter().find(|d| d.keyword == "Rust").unwrap();
        assert_eq!(rust.rule, ClassificationRule::Frequent);
        assert!(extracted.keywords.required.contains(&"Rust".to_string()));
    }

    #[test]
    fn test_sets_are_disjoint() {
        let extracted = extractor().extract(STARTUP_JD);
        for k in &extracted.keywords.required {
            assert!(!extracted.keywords.preferred.contains(k));
        }
    }

    #[test]
    fn test_keyword_set_new_prefers_required() {
        let synonyms = SynonymTable::builtin().unwrap();
        let set = KeywordSet::new(
            vec!["Kubernetes".to_string()],
            vec!["k8s".to_string(), "Go".to_string(), "golang".to_string()],
            &synonyms,
        );
        assert_eq!(set.required, vec!["Kubernetes"]);
        assert_eq!(set.preferred, vec!["Go"]);
    }
}
