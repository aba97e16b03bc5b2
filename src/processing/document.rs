//! Resume document structures as produced by the external parser

use crate::error::{Result, ScorerError};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parsed resume handed to the scorer. Immutable input: the scorer never mutates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeDocument {
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub metadata: ResumeMetadata,
    /// Plain text as extracted from the source file. Empty when the parser only
    /// delivered structured fields.
    #[serde(default)]
    pub raw_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<YearMonth>,
    pub end_date: Option<EndDate>,
    pub employment_type: Option<EmploymentType>,
    #[serde(default)]
    pub bullets: Vec<String>,
    /// Free-form description block; may contain its own bullet lines.
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub field: Option<String>,
    pub graduation_date: Option<YearMonth>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeMetadata {
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub word_count: usize,
    #[serde(default)]
    pub has_photo: bool,
    #[serde(default)]
    pub source_format: SourceFormat,
    /// True byte size of the uploaded file, when the parser knows it.
    pub file_size_bytes: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Pdf,
    Docx,
    Text,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Freelance,
    #[serde(other)]
    Other,
}

/// Month-granularity calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

/// End of a position: a concrete month or an open-ended "present".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EndDate {
    Month(YearMonth),
    Present,
}

const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ScorerError::InvalidInput(format!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Absolute month number, used for differences.
    pub fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    /// Whole months from `self` to `later`; negative when `later` is earlier.
    pub fn months_until(&self, later: &YearMonth) -> i64 {
        later.ordinal() - self.ordinal()
    }
}

impl FromStr for YearMonth {
    type Err = ScorerError;

    /// Accepts `2020-03`, `2020/03`, `03/2020`, `Mar 2020`, `March 2020` and a bare `2020`
    /// (read as January).
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let invalid = || ScorerError::InvalidInput(format!("Unrecognized date: '{}'", s));

        if trimmed.is_empty() {
            return Err(invalid());
        }

        let numeric = trimmed.starts_with(|c: char| c.is_ascii_digit());
        if let Some((left, right)) = trimmed.split_once(['-', '/', '.']).filter(|_| numeric) {
            let (left, right) = (left.trim(), right.trim());
            if let (Ok(a), Ok(b)) = (left.parse::<i32>(), right.parse::<u32>()) {
                if left.len() == 4 {
                    return YearMonth::new(a, b);
                }
            }
            if let (Ok(m), Ok(y)) = (left.parse::<u32>(), right.parse::<i32>()) {
                if right.len() == 4 {
                    return YearMonth::new(y, m);
                }
            }
            return Err(invalid());
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        match parts.as_slice() {
            [year] => {
                let y = year.parse::<i32>().map_err(|_| invalid())?;
                YearMonth::new(y, 1)
            }
            [month, year] => {
                let lower = month.trim_end_matches([',', '.']).to_lowercase();
                let idx = MONTH_NAMES
                    .iter()
                    .position(|name| lower.starts_with(name))
                    .ok_or_else(invalid)?;
                let y = year.parse::<i32>().map_err(|_| invalid())?;
                YearMonth::new(y, idx as u32 + 1)
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for YearMonth {
    type Error = ScorerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl TryFrom<String> for EndDate {
    type Error = ScorerError;

    fn try_from(value: String) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "present" | "current" | "now" | "ongoing" => Ok(EndDate::Present),
            _ => value.parse().map(EndDate::Month),
        }
    }
}

impl From<EndDate> for String {
    fn from(value: EndDate) -> Self {
        match value {
            EndDate::Month(ym) => ym.to_string(),
            EndDate::Present => "present".to_string(),
        }
    }
}

/// Lines that begin with a bullet marker.
pub fn is_bullet_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some('•' | '-' | '*' | '▪' | '◦' | '‣' | '●' | '○' | '■' | '–' | '➢' | '✓') => true,
        Some(c) if c.is_ascii_digit() => {
            let rest: String = trimmed.chars().skip_while(|c| c.is_ascii_digit()).take(1).collect();
            rest == "." || rest == ")"
        }
        _ => false,
    }
}

/// Strip a leading bullet marker and surrounding whitespace.
pub fn strip_bullet_marker(line: &str) -> &str {
    let trimmed = line.trim();
    if !is_bullet_line(trimmed) {
        return trimmed;
    }
    trimmed
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches(|c: char| !c.is_alphanumeric() && c != '$')
        .trim()
}

impl Experience {
    pub fn is_current(&self) -> bool {
        matches!(self.end_date, Some(EndDate::Present))
    }

    /// Resolved end month; open-ended roles end at `as_of`.
    pub fn end_month(&self, as_of: YearMonth) -> Option<YearMonth> {
        match self.end_date {
            Some(EndDate::Month(ym)) => Some(ym),
            Some(EndDate::Present) => Some(as_of),
            None => None,
        }
    }

    /// Internships and contract roles are short by nature.
    pub fn is_temporary(&self) -> bool {
        if matches!(
            self.employment_type,
            Some(EmploymentType::Internship | EmploymentType::Contract | EmploymentType::Freelance)
        ) {
            return true;
        }
        self.title
            .as_deref()
            .map(|t| {
                let lower = t.to_lowercase();
                lower.contains("intern") || lower.contains("contract") || lower.contains("freelance")
            })
            .unwrap_or(false)
    }

    /// Parsed bullets followed by bullet-marked lines of the description.
    pub fn bullet_texts(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .bullets
            .iter()
            .map(|b| strip_bullet_marker(b))
            .filter(|b| !b.is_empty())
            .collect();
        if let Some(description) = &self.description {
            out.extend(
                description
                    .lines()
                    .filter(|l| is_bullet_line(l))
                    .map(strip_bullet_marker)
                    .filter(|b| !b.is_empty()),
            );
        }
        out
    }

    pub fn text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(title) = &self.title {
            parts.push(title);
        }
        if let Some(company) = &self.company {
            parts.push(company);
        }
        parts.extend(self.bullets.iter().map(|b| b.as_str()));
        if let Some(description) = &self.description {
            parts.push(description);
        }
        parts.join("\n")
    }
}

impl ResumeDocument {
    /// Text the scorer matches against: the extracted text when present, otherwise the
    /// structured fields stitched back together.
    pub fn full_text(&self) -> String {
        if !self.raw_text.trim().is_empty() {
            return self.raw_text.clone();
        }
        self.assembled_text()
    }

    fn assembled_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        let contact = &self.contact;
        for field in [&contact.name, &contact.email, &contact.phone, &contact.location]
            .into_iter()
            .flatten()
        {
            parts.push(field.clone());
        }
        parts.extend(contact.links.iter().cloned());
        if let Some(summary) = &self.summary {
            parts.push(summary.clone());
        }
        for exp in &self.experience {
            parts.push(exp.text());
        }
        for edu in &self.education {
            let line: Vec<&str> = [&edu.degree, &edu.field, &edu.institution]
                .into_iter()
                .flatten()
                .map(|s| s.as_str())
                .collect();
            parts.push(line.join(" "));
        }
        if !self.skills.is_empty() {
            parts.push(self.skills_text());
        }
        parts.extend(self.certifications.iter().cloned());
        parts
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn experience_text(&self) -> String {
        self.experience
            .iter()
            .map(|e| e.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn skills_text(&self) -> String {
        self.skills.join(", ")
    }

    /// Every bullet across all experience entries, in document order.
    pub fn all_bullets(&self) -> Vec<&str> {
        self.experience.iter().flat_map(|e| e.bullet_texts()).collect()
    }

    /// Word count reported by the parser, or counted from the full text.
    pub fn word_count(&self) -> usize {
        if self.metadata.word_count > 0 {
            self.metadata.word_count
        } else {
            self.full_text().split_whitespace().count()
        }
    }

    pub fn has_experience(&self) -> bool {
        self.experience.iter().any(|e| {
            e.title.as_deref().is_some_and(|t| !t.trim().is_empty())
                || e.company.as_deref().is_some_and(|c| !c.trim().is_empty())
                || !e.bullet_texts().is_empty()
        })
    }

    pub fn has_education(&self) -> bool {
        self.education.iter().any(|e| {
            e.institution.as_deref().is_some_and(|s| !s.trim().is_empty())
                || e.degree.as_deref().is_some_and(|s| !s.trim().is_empty())
        })
    }

    pub fn has_skills(&self) -> bool {
        self.skills.iter().any(|s| !s.trim().is_empty())
    }

    pub fn has_summary(&self) -> bool {
        self.summary.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_month_parsing() {
        assert_eq!("2020-03".parse::<YearMonth>().unwrap(), YearMonth { year: 2020, month: 3 });
        assert_eq!("03/2020".parse::<YearMonth>().unwrap(), YearMonth { year: 2020, month: 3 });
        assert_eq!("March 2020".parse::<YearMonth>().unwrap(), YearMonth { year: 2020, month: 3 });
        assert_eq!("Sep. 2019".parse::<YearMonth>().unwrap(), YearMonth { year: 2019, month: 9 });
        assert_eq!("2018".parse::<YearMonth>().unwrap(), YearMonth { year: 2018, month: 1 });
        assert!("2020-13".parse::<YearMonth>().is_err());
        assert!("someday".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_months_until() {
        let a = YearMonth::new(2018, 1).unwrap();
        let b = YearMonth::new(2019, 9).unwrap();
        assert_eq!(a.months_until(&b), 20);
        assert_eq!(b.months_until(&a), -20);
    }

    #[test]
    fn test_end_date_present() {
        let json = r#"{"title": "Engineer", "start_date": "2021-02", "end_date": "Present"}"#;
        let exp: Experience = serde_json::from_str(json).unwrap();
        assert!(exp.is_current());
        let as_of = YearMonth::new(2024, 6).unwrap();
        assert_eq!(exp.end_month(as_of), Some(as_of));
    }

    #[test]
    fn test_invalid_month_rejected_on_deserialize() {
        let json = r#"{"start_date": "2021-14"}"#;
        assert!(serde_json::from_str::<Experience>(json).is_err());
    }

    #[test]
    fn test_bullet_detection() {
        assert!(is_bullet_line("• Built things"));
        assert!(is_bullet_line("  - Built things"));
        assert!(is_bullet_line("1. Built things"));
        assert!(!is_bullet_line("Built things"));
        assert!(!is_bullet_line("2020 was a year"));
        assert_eq!(strip_bullet_marker("• Built things"), "Built things");
        assert_eq!(strip_bullet_marker("2) Built things"), "Built things");
    }

    #[test]
    fn test_bullet_texts_include_description_lines() {
        let exp = Experience {
            bullets: vec!["Led the migration".to_string()],
            description: Some("Team overview\n- Developed APIs\n* Reduced costs".to_string()),
            ..Default::default()
        };
        assert_eq!(exp.bullet_texts(), vec!["Led the migration", "Developed APIs", "Reduced costs"]);
    }

    #[test]
    fn test_full_text_falls_back_to_fields() {
        let resume = ResumeDocument {
            skills: vec!["Rust".to_string(), "Python".to_string()],
            ..Default::default()
        };
        assert!(resume.full_text().contains("Rust, Python"));
        assert!(resume.has_skills());
        assert!(!resume.has_experience());
    }
}
