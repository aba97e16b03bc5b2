//! Score report structures handed to callers and formatters

use crate::processing::action_verbs::VerbStats;
use crate::processing::ats_matcher::KeywordMatch;
use crate::processing::document::YearMonth;
use crate::processing::format_checker::FormatCheckResult;
use crate::processing::quantification::QuantificationStats;
use crate::processing::red_flags::PenaltySummary;
use crate::processing::taxonomy::ExperienceLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scoring mode chosen from the inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// A usable job description was supplied
    AtsSimulation,
    /// No job description; role taxonomy keywords stand in
    QualityCoach,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::AtsSimulation => write!(f, "ATS Simulation"),
            Mode::QualityCoach => write!(f, "Quality Coach"),
        }
    }
}

/// Issue severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Suggestion,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Suggestion => "suggestion",
            Severity::Info => "info",
        };
        write!(f, "{}", label)
    }
}

/// A finding raised by one of the scoring components
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub category: String,
    pub message: String,
}

impl Issue {
    pub fn new(severity: Severity, category: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            category: category.to_string(),
            message: message.into(),
        }
    }
}

/// Issue messages bucketed by severity. Serialized in severity order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueBuckets {
    pub critical: Vec<String>,
    pub warning: Vec<String>,
    pub suggestion: Vec<String>,
    pub info: Vec<String>,
}

impl IssueBuckets {
    /// Bucket issues, keeping first-seen order within a bucket and dropping repeats.
    pub fn from_issues<'a, I>(issues: I) -> Self
    where
        I: IntoIterator<Item = &'a Issue>,
    {
        let mut buckets = Self::default();
        for issue in issues {
            buckets.push(issue.severity, &issue.message);
        }
        buckets
    }

    pub fn push(&mut self, severity: Severity, message: &str) {
        let bucket = self.bucket_mut(severity);
        if !bucket.iter().any(|m| m == message) {
            bucket.push(message.to_string());
        }
    }

    pub fn get(&self, severity: Severity) -> &[String] {
        match severity {
            Severity::Critical => &self.critical,
            Severity::Warning => &self.warning,
            Severity::Suggestion => &self.suggestion,
            Severity::Info => &self.info,
        }
    }

    /// Every message in severity order.
    pub fn iter(&self) -> impl Iterator<Item = (Severity, &str)> {
        [Severity::Critical, Severity::Warning, Severity::Suggestion, Severity::Info]
            .into_iter()
            .flat_map(move |s| self.get(s).iter().map(move |m| (s, m.as_str())))
    }

    pub fn len(&self) -> usize {
        self.critical.len() + self.warning.len() + self.suggestion.len() + self.info.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bucket_mut(&mut self, severity: Severity) -> &mut Vec<String> {
        match severity {
            Severity::Critical => &mut self.critical,
            Severity::Warning => &mut self.warning,
            Severity::Suggestion => &mut self.suggestion,
            Severity::Info => &mut self.info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub score: f64,
    pub max_score: f64,
    pub issues: Vec<String>,
}

impl CategoryScore {
    /// Score from a 0.0–1.0 ratio, rounded to one decimal.
    pub fn from_ratio(ratio: f64, max_score: f64) -> Self {
        Self {
            score: round1(ratio.clamp(0.0, 1.0) * max_score),
            max_score,
            issues: Vec::new(),
        }
    }

    pub fn percentage(&self) -> f64 {
        if self.max_score > 0.0 {
            self.score / self.max_score * 100.0
        } else {
            0.0
        }
    }
}

/// Where the keyword universe came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordSource {
    JobDescription,
    RoleTaxonomy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordDetails {
    pub source: KeywordSource,
    /// Every matched keyword, required first
    pub matched: Vec<String>,
    /// Every missing keyword, required first
    pub missing: Vec<String>,
    pub required_matched: Vec<String>,
    pub required_missing: Vec<String>,
    pub preferred_matched: Vec<String>,
    pub preferred_missing: Vec<String>,
    pub required_percentage: f64,
    pub preferred_percentage: f64,
    /// How each matched keyword was found
    pub matches: Vec<KeywordMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStats {
    pub action_verbs: VerbStats,
    pub quantification: QuantificationStats,
    pub vague_phrases: usize,
}

/// Complete result of one scoring pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub overall_score: u8,
    pub mode: Mode,
    pub breakdown: BTreeMap<String, CategoryScore>,
    pub keyword_details: KeywordDetails,
    pub issues: IssueBuckets,
    /// Advisory; present in ATS simulation only
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub auto_reject: Option<bool>,
    pub penalties: PenaltySummary,
    pub content_stats: ContentStats,
    pub format_check: FormatCheckResult,
    pub role: String,
    pub level: ExperienceLevel,
    pub as_of: YearMonth,
}

impl ScoreReport {
    /// Sum of category scores before penalties
    pub fn category_total(&self) -> f64 {
        self.breakdown.values().map(|c| c.score).sum()
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
