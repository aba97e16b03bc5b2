//! Text processing and normalization shared by every matcher

use crate::error::{Result, ScorerError};
use aho_corasick::{AhoCorasick, MatchKind};
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Normalize a term or a block of text for matching: lowercase, `+`/`#` spelled out,
/// dots, ampersands and apostrophes dropped, every other non-alphanumeric character treated as a
/// separator, whitespace collapsed. Applied identically to reference tables and to
/// query-time text, so "Node.js", "node.js" and "NodeJS" all become `nodejs`.
pub fn normalize_term(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '+' => out.push_str("plus"),
            '#' => out.push_str("sharp"),
            '.' | '\'' | '\u{2019}' | '&' => {}
            c if c.is_alphanumeric() => out.extend(c.to_lowercase()),
            _ => out.push(' '),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized text padded with a space on either side so phrases can be matched on
/// word boundaries.
pub fn padded(normalized: &str) -> String {
    format!(" {} ", normalized)
}

/// One- and two-letter forms ("go", "r") only count when the source text writes them
/// capitalized as a standalone token, so the English verb "go" does not read as the
/// language. Longer forms always pass.
pub fn short_form_present(text: &str, form: &str) -> bool {
    if form.chars().count() > 2 {
        return true;
    }
    text.split(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
        .any(|token| {
            token.chars().next().is_some_and(|c| c.is_uppercase()) && normalize_term(token) == form
        })
}

pub struct TextProcessor {
    stop_words: HashSet<&'static str>,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        Self {
            stop_words: Self::create_stop_words(),
        }
    }

    /// Typographic normalization and whitespace cleanup; keeps line structure.
    pub fn clean_text(&self, text: &str) -> String {
        let unified = self.normalize_unicode(text);
        unified
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Split text into sentences
    pub fn split_sentences(&self, text: &str) -> Vec<String> {
        text.unicode_sentences()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Sentences and bullets: every line is split into sentences, so a bullet never
    /// merges with its neighbour.
    pub fn segments(&self, text: &str) -> Vec<String> {
        text.lines()
            .flat_map(|line| self.split_sentences(line))
            .collect()
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word.to_lowercase().as_str())
    }

    fn normalize_unicode(&self, text: &str) -> String {
        text.chars()
            .map(|c| match c {
                '\u{2018}' | '\u{2019}' => '\'',
                '\u{201C}' | '\u{201D}' => '"',
                '\u{2013}' | '\u{2014}' => '-',
                '\u{2026}' => '.',
                '\u{00A0}' => ' ',
                _ => c,
            })
            .collect()
    }

    fn create_stop_words() -> HashSet<&'static str> {
        [
            "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "in", "is",
            "it", "its", "of", "on", "or", "that", "the", "to", "was", "will", "with", "this",
            "but", "they", "have", "we", "our", "you", "your", "us", "who", "what", "which",
            "their", "if", "into", "about", "all", "any", "can", "do", "not", "so", "such",
            "than", "then", "these", "those", "would", "should", "must", "may", "also", "other",
            "more", "most", "very", "well", "over", "across", "within", "including", "etc",
            "join", "looking", "ideal", "candidate", "role", "team", "company", "work",
            "experience", "years", "year", "plus", "strong", "ability", "skills", "knowledge",
        ]
        .into_iter()
        .collect()
    }
}

/// Word-boundary phrase matcher over normalized text. Each phrase carries an id; one
/// search returns the id of every occurrence, overlaps included.
pub struct PhraseIndex {
    matcher: AhoCorasick,
    ids: Vec<usize>,
}

impl PhraseIndex {
    pub fn new<I, S>(phrases: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, usize)>,
        S: AsRef<str>,
    {
        let mut patterns = Vec::new();
        let mut ids = Vec::new();
        for (phrase, id) in phrases {
            let normalized = normalize_term(phrase.as_ref());
            if normalized.is_empty() {
                continue;
            }
            patterns.push(padded(&normalized));
            ids.push(id);
        }

        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(&patterns)
            .map_err(|e| ScorerError::Processing(format!("Failed to build phrase index: {}", e)))?;

        Ok(Self { matcher, ids })
    }

    /// Ids of every phrase occurrence in already normalized text, in text order.
    pub fn occurrences(&self, normalized: &str) -> Vec<usize> {
        let haystack = padded(normalized);
        self.matcher
            .find_overlapping_iter(&haystack)
            .map(|m| self.ids[m.pattern().as_usize()])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_term() {
        assert_eq!(normalize_term("Node.js"), "nodejs");
        assert_eq!(normalize_term("nodejs"), "nodejs");
        assert_eq!(normalize_term("C++"), "cplusplus");
        assert_eq!(normalize_term("C#"), "csharp");
        assert_eq!(normalize_term("  CI/CD   pipelines "), "ci cd pipelines");
        assert_eq!(normalize_term("Bachelor's Degree"), "bachelors degree");
    }

    #[test]
    fn test_short_form_guard() {
        assert!(short_form_present("Services in Go and Rust", "go"));
        assert!(!short_form_present("ready to go live", "go"));
        assert!(short_form_present("anything", "kubernetes"));
    }

    #[test]
    fn test_segments_split_lines_and_sentences() {
        let processor = TextProcessor::new();
        let segments = processor.segments("Python required. Go is a plus.\n- Kubernetes");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[2], "- Kubernetes");
    }

    #[test]
    fn test_clean_text_keeps_lines() {
        let processor = TextProcessor::new();
        let cleaned = processor.clean_text("Led   “platform”\u{2014}work\nSecond\tline");
        assert_eq!(cleaned, "Led \"platform\"-work\nSecond line");
    }

    #[test]
    fn test_phrase_index_word_boundaries() {
        let index = PhraseIndex::new(vec![("Java", 0), ("JavaScript", 1), ("machine learning", 2)]).unwrap();
        let text = normalize_term("JavaScript and machine-learning, plus Java. Java again");
        let hits = index.occurrences(&text);
        assert_eq!(hits.iter().filter(|&&id| id == 0).count(), 2);
        assert_eq!(hits.iter().filter(|&&id| id == 1).count(), 1);
        assert!(hits.contains(&2));
    }

    #[test]
    fn test_phrase_index_no_substring_coincidence() {
        let index = PhraseIndex::new(vec![("R", 0), ("Go", 1)]).unwrap();
        let hits = index.occurrences(&normalize_term("Reporting on Google products"));
        assert!(hits.is_empty());
    }
}
