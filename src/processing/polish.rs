//! Structure, professional-polish and content-depth sub-scores

use crate::config::{ContentTargets, LevelThreshold};
use crate::output::report::{Issue, Severity};
use crate::processing::document::ResumeDocument;
use crate::processing::taxonomy::ExperienceLevel;

/// A 0.0–1.0 ratio for one category together with the findings behind it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubScore {
    pub ratio: f64,
    pub issues: Vec<Issue>,
}

pub struct PolishScorer {
    content: ContentTargets,
}

impl PolishScorer {
    pub fn new(content: ContentTargets) -> Self {
        Self { content }
    }

    /// ATS-simulation structure: section completeness 50%, contact 30%, date consistency 20%.
    pub fn structure(&self, document: &ResumeDocument, date_issues: usize) -> SubScore {
        let mut issues = Vec::new();
        let sections = core_sections(document);
        let contact = contact_completeness(document, "structure", &mut issues);

        let entries = document.experience.len();
        let dates = if entries == 0 {
            0.0
        } else {
            1.0 - date_issues.min(entries) as f64 / entries as f64
        };

        SubScore {
            ratio: sections * 0.5 + contact * 0.3 + dates * 0.2,
            issues,
        }
    }

    /// Quality-coach polish: length 35%, contact 35%, section completeness 30%.
    pub fn polish(&self, document: &ResumeDocument, level: ExperienceLevel, threshold: &LevelThreshold) -> SubScore {
        let mut issues = Vec::new();
        let length = length_fit(document, level, threshold, &mut issues);
        let contact = contact_completeness(document, "polish", &mut issues);

        let mut present = core_sections(document) * 3.0;
        if document.has_summary() {
            present += 1.0;
        } else {
            issues.push(Issue::new(
                Severity::Suggestion,
                "polish",
                "Add a short professional summary at the top",
            ));
        }

        SubScore {
            ratio: length * 0.35 + contact * 0.35 + present / 4.0 * 0.30,
            issues,
        }
    }

    /// Vague-phrase avoidance blended with bullets-per-role structure.
    pub fn content_depth(&self, document: &ResumeDocument, vague_phrase_score: f64) -> SubScore {
        let mut issues = Vec::new();
        let (min, max) = (self.content.min_bullets_per_role, self.content.max_bullets_per_role);

        let roles: Vec<(String, usize)> = document
            .experience
            .iter()
            .map(|e| {
                let name = e.title.clone().or_else(|| e.company.clone()).unwrap_or_else(|| "a role".to_string());
                (name, e.bullet_texts().len())
            })
            .collect();

        let structure = if roles.is_empty() {
            issues.push(Issue::new(
                Severity::Warning,
                "contentDepth",
                "No experience entries to assess",
            ));
            0.0
        } else {
            let total: f64 = roles
                .iter()
                .map(|(name, n)| {
                    let n = *n;
                    if n < min {
                        issues.push(Issue::new(
                            Severity::Suggestion,
                            "contentDepth",
                            format!("{} has {} bullets; aim for {}-{}", name, n, min, max),
                        ));
                        n as f64 / min as f64
                    } else if n > max {
                        issues.push(Issue::new(
                            Severity::Suggestion,
                            "contentDepth",
                            format!("{} has {} bullets; trim to the strongest {}", name, n, max),
                        ));
                        max as f64 / n as f64
                    } else {
                        1.0
                    }
                })
                .sum();
            total / roles.len() as f64
        };

        let share = self.content.vague_phrase_share;
        SubScore {
            ratio: vague_phrase_score.clamp(0.0, 1.0) * share + structure * (1.0 - share),
            issues,
        }
    }
}

/// Share of experience, education and skills present.
///
/// Missing sections are reported once by the format check, so this only scores.
fn core_sections(document: &ResumeDocument) -> f64 {
    let present = [document.has_experience(), document.has_education(), document.has_skills()];
    present.iter().filter(|found| **found).count() as f64 / present.len() as f64
}

/// Name 30%, email 30%, phone 20%, location or a profile link 20%.
fn contact_completeness(document: &ResumeDocument, category: &str, issues: &mut Vec<Issue>) -> f64 {
    let contact = &document.contact;
    let filled = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.trim().is_empty());

    let mut score = 0.0;
    let mut missing = Vec::new();
    for (label, present, weight) in [
        ("name", filled(&contact.name), 0.3),
        ("email", filled(&contact.email), 0.3),
        ("phone", filled(&contact.phone), 0.2),
        (
            "location or profile link",
            filled(&contact.location) || contact.links.iter().any(|l| !l.trim().is_empty()),
            0.2,
        ),
    ] {
        if present {
            score += weight;
        } else {
            missing.push(label);
        }
    }

    if !missing.is_empty() {
        let severity = if !filled(&contact.email) && !filled(&contact.phone) {
            Severity::Critical
        } else {
            Severity::Warning
        };
        issues.push(Issue::new(
            severity,
            category,
            format!("Contact details missing: {}", missing.join(", ")),
        ));
    }
    score
}

fn length_fit(
    document: &ResumeDocument,
    level: ExperienceLevel,
    threshold: &LevelThreshold,
    issues: &mut Vec<Issue>,
) -> f64 {
    let words = document.word_count();
    let (min, max) = (threshold.min_words, threshold.max_words);

    let mut score = if words < min {
        issues.push(Issue::new(
            Severity::Suggestion,
            "polish",
            format!("Resume is {} words; aim for {}-{} at {} level", words, min, max, level),
        ));
        words as f64 / min.max(1) as f64
    } else if words > max {
        issues.push(Issue::new(
            Severity::Suggestion,
            "polish",
            format!("Resume is {} words; tighten it to {}-{} at {} level", words, min, max, level),
        ));
        max as f64 / words as f64
    } else {
        1.0
    };

    let pages = document.metadata.page_count;
    if pages > threshold.max_pages {
        issues.push(Issue::new(
            Severity::Warning,
            "polish",
            format!("{} pages is long for {} level; keep it to {}", pages, level, threshold.max_pages),
        ));
        score *= 0.7;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::processing::document::{ContactInfo, Education, Experience};

    fn scorer() -> PolishScorer {
        PolishScorer::new(Config::default().scoring.content)
    }

    fn complete() -> ResumeDocument {
        ResumeDocument {
            contact: ContactInfo {
                name: Some("Jane Doe".to_string()),
                email: Some("jane@example.com".to_string()),
                phone: Some("555-0100".to_string()),
                location: Some("Denver, CO".to_string()),
                links: Vec::new(),
            },
            summary: Some("Backend engineer".to_string()),
            experience: vec![Experience {
                title: Some("Engineer".to_string()),
                bullets: (0..4).map(|i| format!("Built service {}", i)).collect(),
                ..Default::default()
            }],
            education: vec![Education {
                degree: Some("BS Computer Science".to_string()),
                ..Default::default()
            }],
            skills: vec!["Rust".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_structure_full_marks() {
        let result = scorer().structure(&complete(), 0);
        assert!((result.ratio - 1.0).abs() < 1e-9);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_structure_date_issues_and_missing_contact() {
        let mut doc = complete();
        doc.contact = ContactInfo::default();
        let result = scorer().structure(&doc, 1);
        assert!((result.ratio - 0.5).abs() < 1e-9);
        assert!(result.issues.iter().any(|i| i.severity == Severity::Critical));
    }

    #[test]
    fn test_empty_document_scores_zero() {
        let doc = ResumeDocument::default();
        let threshold = Config::default().scoring.levels.mid;
        let s = scorer();
        assert_eq!(s.structure(&doc, 0).ratio, 0.0);
        assert_eq!(s.polish(&doc, ExperienceLevel::Mid, &threshold).ratio, 0.0);
        assert_eq!(s.content_depth(&doc, 0.0).ratio, 0.0);
    }

    #[test]
    fn test_missing_sections_only_lower_the_ratio() {
        let mut doc = complete();
        doc.education.clear();
        let threshold = Config::default().scoring.levels.mid;
        let s = scorer();

        let structure = s.structure(&doc, 0);
        assert!((structure.ratio - (0.5 * 2.0 / 3.0 + 0.5)).abs() < 1e-9);
        assert!(structure.issues.is_empty());

        let polish = s.polish(&doc, ExperienceLevel::Mid, &threshold);
        assert!(polish.ratio < 1.0);
        assert!(!polish.issues.iter().any(|i| i.message.to_lowercase().contains("education")));
    }

    #[test]
    fn test_polish_length_against_level() {
        let mut doc = complete();
        doc.metadata.word_count = 500;
        let levels = Config::default().scoring.levels;
        let s = scorer();

        let mid = s.polish(&doc, ExperienceLevel::Mid, &levels.mid);
        assert!((mid.ratio - 1.0).abs() < 1e-9);

        // 500 words against a 600-word minimum
        let lead = s.polish(&doc, ExperienceLevel::Lead, &levels.lead);
        let expected = 0.35 * (500.0 / 600.0) + 0.35 + 0.30;
        assert!((lead.ratio - expected).abs() < 1e-9);

        doc.metadata.page_count = 3;
        let long = s.polish(&doc, ExperienceLevel::Mid, &levels.mid);
        assert!((long.ratio - (0.35 * 0.7 + 0.65)).abs() < 1e-9);
    }

    #[test]
    fn test_content_depth_blend() {
        let mut doc = complete();
        let s = scorer();
        assert!((s.content_depth(&doc, 1.0).ratio - 1.0).abs() < 1e-9);

        doc.experience[0].bullets.truncate(1);
        let result = s.content_depth(&doc, 0.5);
        let expected = 0.5 * 0.6 + (1.0 / 3.0) * 0.4;
        assert!((result.ratio - expected).abs() < 1e-9);
        assert_eq!(result.issues.len(), 1);
    }
}
