//! ATS parseability checks on resume structure and extracted text

use crate::config::FormatWeights;
use crate::output::report::{Issue, Severity};
use crate::processing::document::ResumeDocument;
use serde::{Deserialize, Serialize};

const CATEGORY: &str = "format";
const MB: f64 = 1024.0 * 1024.0;

/// Characters that usually mean an encoding went wrong during extraction
const GARBLE_MARKERS: &[&str] = &["\u{FFFD}", "â€", "Ã", "\u{25A1}", "\u{FFFC}"];

/// Non-ASCII punctuation that survives extraction legitimately
const TYPOGRAPHIC: &[char] = &[
    '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2013}', '\u{2014}', '\u{2026}',
    '\u{2022}', '\u{00B7}', '\u{00A0}', '\u{20AC}', '\u{00A3}', '\u{00A5}', '\u{00A9}',
    '\u{00AE}', '\u{2122}', '\u{00B0}', '\u{25AA}', '\u{25E6}', '\u{2023}', '\u{25CF}',
    '\u{25CB}', '\u{25A0}', '\u{27A2}', '\u{2713}',
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubCheck {
    pub score: f64,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatChecks {
    pub text_extraction: SubCheck,
    pub sections: SubCheck,
    pub bullets: SubCheck,
    pub file_size: SubCheck,
    pub special_characters: SubCheck,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatCheckResult {
    pub passed: bool,
    /// Weighted score, 0.0–1.0
    pub score: f64,
    pub checks: FormatChecks,
    pub issues: Vec<Issue>,
}

pub struct FormatChecker {
    weights: FormatWeights,
}

impl FormatChecker {
    pub fn new(weights: FormatWeights) -> Self {
        Self { weights }
    }

    /// Run all five sub-checks and combine them with the configured weights.
    pub fn check(&self, document: &ResumeDocument, raw_text: &str) -> FormatCheckResult {
        let mut issues = Vec::new();
        let checks = FormatChecks {
            text_extraction: self.check_text_extraction(raw_text, &mut issues),
            sections: self.check_sections(document, &mut issues),
            bullets: self.check_bullets(document, &mut issues),
            file_size: self.check_file_size(document, raw_text, &mut issues),
            special_characters: self.check_special_characters(raw_text, &mut issues),
        };

        let w = &self.weights;
        let score = checks.text_extraction.score * w.text_extraction
            + checks.sections.score * w.sections
            + checks.bullets.score * w.bullets
            + checks.file_size.score * w.file_size
            + checks.special_characters.score * w.special_characters;

        FormatCheckResult {
            passed: score >= w.pass_threshold,
            score,
            checks,
            issues,
        }
    }

    fn check_text_extraction(&self, raw_text: &str, issues: &mut Vec<Issue>) -> SubCheck {
        let words = raw_text.split_whitespace().count();
        let garbled = raw_text.chars().filter(|&c| is_garbled_char(c)).count();

        let (score, detail) = if words < 50 {
            issues.push(Issue::new(
                Severity::Critical,
                CATEGORY,
                format!(
                    "Only {} words could be extracted; the file may be image-based or corrupted",
                    words
                ),
            ));
            (0.3, format!("{} words extracted", words))
        } else if words < 150 {
            issues.push(Issue::new(
                Severity::Warning,
                CATEGORY,
                format!("Only {} words extracted; ATS systems may see an incomplete resume", words),
            ));
            (0.6, format!("{} words extracted", words))
        } else if garbled as f64 / words as f64 > 0.10 {
            issues.push(Issue::new(
                Severity::Warning,
                CATEGORY,
                format!("Extracted text contains {} unreadable characters", garbled),
            ));
            (0.5, format!("{} words, {} garbled characters", words, garbled))
        } else {
            (1.0, format!("{} words extracted cleanly", words))
        };

        SubCheck {
            score,
            passed: score >= 1.0,
            detail,
        }
    }

    fn check_sections(&self, document: &ResumeDocument, issues: &mut Vec<Issue>) -> SubCheck {
        let sections = [
            ("Experience", document.has_experience()),
            ("Education", document.has_education()),
            ("Skills", document.has_skills()),
        ];
        let present = sections.iter().filter(|(_, found)| *found).count();
        let missing: Vec<&str> = sections
            .iter()
            .filter(|(_, found)| !found)
            .map(|(name, _)| *name)
            .collect();
        let passed = present >= 2;

        if !missing.is_empty() {
            let severity = if passed { Severity::Suggestion } else { Severity::Warning };
            issues.push(Issue::new(
                severity,
                CATEGORY,
                format!("Missing sections: {}", missing.join(", ")),
            ));
        }

        SubCheck {
            score: present as f64 / sections.len() as f64,
            passed,
            detail: format!("{} of {} core sections detected", present, sections.len()),
        }
    }

    fn check_bullets(&self, document: &ResumeDocument, issues: &mut Vec<Issue>) -> SubCheck {
        let count = document.all_bullets().len();
        let passed = count >= 3;

        if !passed {
            issues.push(Issue::new(
                Severity::Warning,
                CATEGORY,
                format!(
                    "Only {} bullet points detected; describe each role with bulleted achievements",
                    count
                ),
            ));
        } else if count < 5 {
            issues.push(Issue::new(
                Severity::Suggestion,
                CATEGORY,
                format!("{} bullet points detected; 5 or more read better to ATS parsers", count),
            ));
        }

        SubCheck {
            score: (count as f64 / 5.0).min(1.0),
            passed,
            detail: format!("{} bullet points", count),
        }
    }

    /// True byte size when the parser reported it, otherwise an estimate from word count,
    /// pages and embedded photo.
    fn check_file_size(&self, document: &ResumeDocument, raw_text: &str, issues: &mut Vec<Issue>) -> SubCheck {
        let meta = &document.metadata;
        let (bytes, estimated) = match meta.file_size_bytes {
            Some(bytes) => (bytes as f64, false),
            None => {
                let words = raw_text.split_whitespace().count().max(meta.word_count);
                let pages = meta.page_count.max(1) as f64;
                let photo = if meta.has_photo { 500.0 * 1024.0 } else { 0.0 };
                (words as f64 * 6.0 + pages * 50.0 * 1024.0 + photo, true)
            }
        };
        let size_mb = bytes / MB;

        let score = if size_mb <= 2.0 {
            1.0
        } else if size_mb <= 4.0 {
            0.5
        } else {
            0.0
        };
        if score < 1.0 {
            issues.push(Issue::new(
                if score == 0.0 { Severity::Critical } else { Severity::Warning },
                CATEGORY,
                format!(
                    "File size of {:.1} MB is over the 2 MB many ATS portals accept; remove images and embedded fonts",
                    size_mb
                ),
            ));
        }

        SubCheck {
            score,
            passed: score >= 1.0,
            detail: format!(
                "{:.2} MB{}",
                size_mb,
                if estimated { " (estimated)" } else { "" }
            ),
        }
    }

    fn check_special_characters(&self, raw_text: &str, issues: &mut Vec<Issue>) -> SubCheck {
        let count = count_garble_markers(raw_text);
        let passed = count < 5;

        if count > 0 {
            issues.push(Issue::new(
                if passed { Severity::Suggestion } else { Severity::Warning },
                CATEGORY,
                format!(
                    "{} garbled characters found; replace special symbols and unusual fonts",
                    count
                ),
            ));
        }

        SubCheck {
            score: (1.0 - count as f64 / 10.0).max(0.0),
            passed,
            detail: format!("{} garbled characters", count),
        }
    }
}

/// Mojibake sequences, replacement characters and stray control characters.
pub fn count_garble_markers(text: &str) -> usize {
    let markers: usize = GARBLE_MARKERS.iter().map(|m| text.matches(m).count()).sum();
    let controls = text
        .chars()
        .filter(|c| c.is_control() && !c.is_whitespace())
        .count();
    markers + controls
}

fn is_garbled_char(c: char) -> bool {
    if c.is_control() {
        return !c.is_whitespace();
    }
    !c.is_ascii() && !c.is_alphabetic() && !TYPOGRAPHIC.contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::processing::document::{Education, Experience};

    fn checker() -> FormatChecker {
        FormatChecker::new(Config::default().scoring.format)
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    fn full_document() -> ResumeDocument {
        ResumeDocument {
            experience: vec![Experience {
                title: Some("Engineer".to_string()),
                bullets: (0..6).map(|i| format!("Built thing {}", i)).collect(),
                ..Default::default()
            }],
            education: vec![Education {
                institution: Some("State University".to_string()),
                ..Default::default()
            }],
            skills: vec!["Rust".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_text_extraction_tiers() {
        let c = checker();
        let doc = ResumeDocument::default();
        assert_eq!(c.check(&doc, "").checks.text_extraction.score, 0.3);
        assert_eq!(c.check(&doc, &words(80)).checks.text_extraction.score, 0.6);
        assert_eq!(c.check(&doc, &words(200)).checks.text_extraction.score, 1.0);

        let garbled = format!("{} {}", words(150), "\u{2591}".repeat(40));
        assert_eq!(c.check(&doc, &garbled).checks.text_extraction.score, 0.5);
    }

    #[test]
    fn test_missing_sections_message() {
        let doc = ResumeDocument {
            experience: full_document().experience,
            ..Default::default()
        };
        let result = checker().check(&doc, &words(200));
        assert!((result.checks.sections.score - 1.0 / 3.0).abs() < 1e-9);
        assert!(!result.checks.sections.passed);
        let issue = result
            .issues
            .iter()
            .find(|i| i.message == "Missing sections: Education, Skills")
            .unwrap();
        assert_eq!(issue.severity, Severity::Warning);
    }

    #[test]
    fn test_bullet_scoring() {
        let mut doc = full_document();
        doc.experience[0].bullets.truncate(2);
        let result = checker().check(&doc, &words(200));
        assert_eq!(result.checks.bullets.score, 0.4);
        assert!(!result.checks.bullets.passed);
    }

    #[test]
    fn test_file_size_uses_reported_bytes() {
        let mut doc = full_document();
        doc.metadata.file_size_bytes = Some(3 * 1024 * 1024);
        assert_eq!(checker().check(&doc, &words(200)).checks.file_size.score, 0.5);
        doc.metadata.file_size_bytes = Some(5 * 1024 * 1024);
        assert_eq!(checker().check(&doc, &words(200)).checks.file_size.score, 0.0);
        doc.metadata.file_size_bytes = None;
        assert_eq!(checker().check(&doc, &words(200)).checks.file_size.score, 1.0);
    }

    #[test]
    fn test_special_characters_decay() {
        let text = format!("{} {}", words(200), "\u{FFFD}".repeat(6));
        let result = checker().check(&full_document(), &text);
        assert!((result.checks.special_characters.score - 0.4).abs() < 1e-9);
        assert!(!result.checks.special_characters.passed);
    }

    #[test]
    fn test_clean_resume_passes() {
        let result = checker().check(&full_document(), &words(300));
        assert!(result.passed);
        assert!((result.score - 1.0).abs() < 1e-9);
        assert!(result.issues.is_empty());
    }
}
