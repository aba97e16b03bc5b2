//! Output formatters: console, JSON and Markdown renderings of a score report

use crate::config::OutputFormat;
use crate::error::{Result, ScorerError};
use crate::output::report::{CategoryScore, Mode, ScoreReport, Severity};
use colored::{Color, Colorize};
use std::path::Path;

/// Trait for formatting score reports
pub trait OutputFormatter {
    fn format_report(&self, report: &ScoreReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Console formatter with colors
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// JSON formatter for API integration and structured data
pub struct JsonFormatter {
    pretty: bool,
}

/// Markdown formatter for documentation and reports
pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// Report generator that coordinates different formatters
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

/// Human-readable category names, in display order
const CATEGORY_LABELS: &[(&str, &str)] = &[
    ("requiredKeywords", "Required Keywords"),
    ("preferredKeywords", "Preferred Keywords"),
    ("roleKeywords", "Role Keywords"),
    ("actionVerbs", "Action Verbs"),
    ("quantification", "Quantification"),
    ("contentDepth", "Content Depth"),
    ("format", "Format"),
    ("structure", "Structure"),
    ("polish", "Professional Polish"),
];

/// Categories in display order, followed by any unknown ones.
fn ordered_categories(report: &ScoreReport) -> Vec<(&str, &CategoryScore)> {
    let mut out: Vec<(&str, &CategoryScore)> = CATEGORY_LABELS
        .iter()
        .filter_map(|(key, label)| report.breakdown.get(*key).map(|c| (*label, c)))
        .collect();
    out.extend(
        report
            .breakdown
            .iter()
            .filter(|(key, _)| !CATEGORY_LABELS.iter().any(|(k, _)| k == key))
            .map(|(key, c)| (key.as_str(), c)),
    );
    out
}

fn verdict(score: u8) -> &'static str {
    match score {
        90..=100 => "Excellent: ready to submit",
        80..=89 => "Strong: minor polish left",
        70..=79 => "Good: a few targeted fixes will help",
        60..=69 => "Fair: noticeable gaps to close",
        _ => "Needs work: address the critical issues first",
    }
}

fn severity_title(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "Critical",
        Severity::Warning => "Warnings",
        Severity::Suggestion => "Suggestions",
        Severity::Info => "Notes",
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            3 => "▒",
            _ => "░",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            3 => Color::Yellow,
            _ => Color::White,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: u8) -> String {
        let (badge, color) = match score {
            90..=100 => ("EXCELLENT", Color::Green),
            80..=89 => ("VERY GOOD", Color::BrightGreen),
            70..=79 => ("GOOD", Color::Yellow),
            60..=69 => ("FAIR", Color::BrightYellow),
            50..=59 => ("BELOW AVG", Color::Red),
            _ => ("POOR", Color::BrightRed),
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_severity_icon(&self, severity: Severity) -> &'static str {
        match (severity, self.use_colors) {
            (Severity::Critical, true) => "🚨",
            (Severity::Warning, true) => "⚠️",
            (Severity::Suggestion, true) => "💡",
            (Severity::Info, true) => "ℹ️",
            (Severity::Critical, false) => "[!]",
            (Severity::Warning, false) => "[*]",
            (Severity::Suggestion, false) => "[+]",
            (Severity::Info, false) => "[i]",
        }
    }

    fn severity_color(severity: Severity) -> Color {
        match severity {
            Severity::Critical => Color::Red,
            Severity::Warning => Color::Yellow,
            Severity::Suggestion => Color::Cyan,
            Severity::Info => Color::BrightBlack,
        }
    }

    fn format_bar(&self, category: &CategoryScore) -> String {
        let filled = (category.percentage() / 10.0).round().clamp(0.0, 10.0) as usize;
        let bar = format!("{}{}", "■".repeat(filled), "□".repeat(10 - filled));
        let color = match category.percentage() {
            p if p >= 80.0 => Color::Green,
            p if p >= 60.0 => Color::Yellow,
            _ => Color::Red,
        };
        self.colorize(&bar, color)
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &ScoreReport) -> Result<String> {
        let mut output = String::new();

        // Header
        output.push_str(&self.format_header("📊 ATS RESUME SCORE", 1));
        output.push_str(&format!(
            "Mode: {} | Role: {} ({}) | As of: {}\n",
            report.mode, report.role, report.level, report.as_of
        ));

        // Summary
        output.push_str(&self.format_header("Summary", 2));
        output.push_str(&format!(
            "Overall Score: {}/100 {}\n",
            report.overall_score,
            self.format_score_badge(report.overall_score)
        ));
        output.push_str(&format!("Verdict: {}\n", self.colorize(verdict(report.overall_score), Color::Cyan)));
        if let Some(auto_reject) = report.auto_reject {
            let text = if auto_reject {
                self.colorize("likely auto-rejected (required keywords below threshold)", Color::Red)
            } else {
                self.colorize("passes the required-keyword screen", Color::Green)
            };
            output.push_str(&format!("ATS screen: {}\n", text));
        }

        // Breakdown
        output.push_str(&self.format_header("Score Breakdown", 3));
        for (label, category) in ordered_categories(report) {
            output.push_str(&format!(
                "  {:<22} {} {:>5.1} / {:<4}\n",
                label,
                self.format_bar(category),
                category.score,
                category.max_score
            ));
        }
        if report.penalties.applied && report.penalties.total > 0 {
            output.push_str(&format!(
                "  {:<22} {}\n",
                "Red-flag penalties",
                self.colorize(&format!("-{}", report.penalties.total), Color::Red)
            ));
        }

        // Keywords
        let keywords = &report.keyword_details;
        output.push_str(&self.format_header("🔍 Keywords", 3));
        output.push_str(&format!(
            "Required: {:.0}% matched | Preferred: {:.0}% matched\n",
            keywords.required_percentage, keywords.preferred_percentage
        ));
        if !keywords.matched.is_empty() {
            output.push_str(&format!("  ✓ {}\n", self.colorize(&keywords.matched.join(", "), Color::Green)));
        }
        if !keywords.missing.is_empty() {
            output.push_str(&format!("  ✗ {}\n", self.colorize(&keywords.missing.join(", "), Color::Red)));
        }

        // Issues
        output.push_str(&self.format_header("📋 Issues", 2));
        if report.issues.is_empty() {
            output.push_str(&self.colorize("No issues found.\n", Color::Green));
        }
        for severity in [Severity::Critical, Severity::Warning, Severity::Suggestion, Severity::Info] {
            let messages = report.issues.get(severity);
            if messages.is_empty() || (severity == Severity::Info && !self.detailed) {
                continue;
            }
            output.push_str(&self.colorize(
                &format!("{} ({})\n", severity_title(severity), messages.len()),
                Self::severity_color(severity),
            ));
            for message in messages {
                output.push_str(&format!("  {} {}\n", self.format_severity_icon(severity), message));
            }
        }

        if self.detailed {
            output.push_str(&self.format_header("📊 Detailed Analysis", 2));

            let verbs = &report.content_stats.action_verbs;
            output.push_str(&format!(
                "Action verbs: {}/{} bullets classified ({:.0}%), average tier {:.2}\n",
                verbs.classified, verbs.total, verbs.coverage_pct, verbs.average_tier
            ));
            let quant = &report.content_stats.quantification;
            output.push_str(&format!(
                "Quantification: {} high, {} medium, {} low of {} bullets (weighted rate {:.0}%)\n",
                quant.high, quant.medium, quant.low, quant.total, quant.weighted_rate
            ));
            output.push_str(&format!("Vague phrases: {}\n", report.content_stats.vague_phrases));

            let format = &report.format_check;
            output.push_str(&format!(
                "Format check: {:.0}% ({})\n",
                format.score * 100.0,
                if format.passed { "passed" } else { "failed" }
            ));
            let checks = &format.checks;
            for (name, check) in [
                ("text extraction", &checks.text_extraction),
                ("sections", &checks.sections),
                ("bullets", &checks.bullets),
                ("file size", &checks.file_size),
                ("special characters", &checks.special_characters),
            ] {
                output.push_str(&format!("  {:<20} {:.1}  {}\n", name, check.score, check.detail));
            }

            if !report.penalties.items.is_empty() {
                output.push_str(&format!(
                    "Penalties: {} raw, {} after cap of {}\n",
                    report.penalties.raw_total, report.penalties.total, report.penalties.cap
                ));
                for item in &report.penalties.items {
                    output.push_str(&format!("  -{} {:?}: {}\n", item.points, item.rule, item.detail));
                }
            }
        }

        // Footer
        output.push_str(&format!(
            "\n{} Generated by ATS Scorer v{}\n",
            self.colorize("ℹ️", Color::Blue),
            env!("CARGO_PKG_VERSION")
        ));

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &ScoreReport) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn markdown_score_badge(score: u8) -> &'static str {
        match score {
            90..=100 => "🟢 Excellent",
            80..=89 => "🟢 Very Good",
            70..=79 => "🟡 Good",
            60..=69 => "🟡 Fair",
            _ => "🔴 Needs Work",
        }
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &ScoreReport) -> Result<String> {
        let mut output = String::new();

        output.push_str("# 📊 ATS Resume Score\n\n");
        if self.include_metadata {
            output.push_str(&format!(
                "**Mode:** {} | **Role:** {} ({}) | **As of:** {}\n\n",
                report.mode, report.role, report.level, report.as_of
            ));
        }

        output.push_str("## Summary\n\n");
        output.push_str(&format!(
            "**Overall Score:** {}/100 {}\n\n",
            report.overall_score,
            Self::markdown_score_badge(report.overall_score)
        ));
        output.push_str(&format!("**Verdict:** {}\n\n", verdict(report.overall_score)));
        if report.mode == Mode::AtsSimulation {
            if let Some(auto_reject) = report.auto_reject {
                output.push_str(&format!(
                    "**Auto-reject risk:** {}\n\n",
                    if auto_reject { "yes" } else { "no" }
                ));
            }
        }

        output.push_str("### Score Breakdown\n\n");
        output.push_str("| Category | Score | Max |\n");
        output.push_str("|----------|-------|-----|\n");
        for (label, category) in ordered_categories(report) {
            output.push_str(&format!("| {} | {:.1} | {} |\n", label, category.score, category.max_score));
        }
        if report.penalties.applied && report.penalties.total > 0 {
            output.push_str(&format!("| Red-flag penalties | -{} | {} |\n", report.penalties.total, report.penalties.cap));
        }
        output.push('\n');

        let keywords = &report.keyword_details;
        output.push_str("## 🔍 Keywords\n\n");
        output.push_str(&format!(
            "Required matched: **{:.0}%** | Preferred matched: **{:.0}%**\n\n",
            keywords.required_percentage, keywords.preferred_percentage
        ));
        if !keywords.matched.is_empty() {
            output.push_str(&format!("- **Matched:** {}\n", keywords.matched.join(", ")));
        }
        if !keywords.missing.is_empty() {
            output.push_str(&format!("- **Missing:** {}\n", keywords.missing.join(", ")));
        }
        output.push('\n');

        output.push_str("## 📋 Issues\n\n");
        for severity in [Severity::Critical, Severity::Warning, Severity::Suggestion, Severity::Info] {
            let messages = report.issues.get(severity);
            if messages.is_empty() {
                continue;
            }
            output.push_str(&format!("### {}\n\n", severity_title(severity)));
            for message in messages {
                output.push_str(&format!("- {}\n", message));
            }
            output.push('\n');
        }

        if self.include_metadata {
            output.push_str("---\n\n");
            output.push_str(&format!("*Generated by ATS Scorer v{}*\n", env!("CARGO_PKG_VERSION")));
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(true, false),
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter::new(true),
        }
    }

    pub fn with_options(use_colors: bool, detailed: bool, pretty_json: bool, include_metadata: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
        }
    }

    pub fn generate_report(&self, report: &ScoreReport, format: &OutputFormat) -> Result<String> {
        let formatter: &dyn OutputFormatter = match format {
            OutputFormat::Console => &self.console_formatter,
            OutputFormat::Json => &self.json_formatter,
            OutputFormat::Markdown => &self.markdown_formatter,
        };
        if formatter.supports_format() != *format {
            return Err(ScorerError::OutputFormatting(format!("No formatter for {:?}", format)));
        }
        formatter.format_report(report)
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// Utility functions for saving reports
pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}

pub fn suggest_filename(format: &OutputFormat, resume_name: &str, timestamp: bool) -> String {
    let base_name = Path::new(resume_name)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    match format {
        OutputFormat::Console => format!("{}_score{}.txt", base_name, timestamp_suffix),
        OutputFormat::Json => format!("{}_score{}.json", base_name, timestamp_suffix),
        OutputFormat::Markdown => format!("{}_score{}.md", base_name, timestamp_suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::processing::analyzer::{ScoreRequest, ScoringEngine};
    use crate::processing::document::ResumeDocument;

    fn report() -> ScoreReport {
        let resume = ResumeDocument {
            summary: Some("Analyst".to_string()),
            skills: vec!["SQL".to_string(), "Excel".to_string()],
            ..Default::default()
        };
        ScoringEngine::new(&Config::default())
            .unwrap()
            .score(&ScoreRequest::new(resume, "data_analyst", "mid", "2024-06".parse().unwrap()))
            .unwrap()
    }

    #[test]
    fn test_console_without_colors() {
        let text = ConsoleFormatter::new(false, true).format_report(&report()).unwrap();
        assert!(text.contains("ATS RESUME SCORE"));
        assert!(text.contains("Quality Coach"));
        assert!(text.contains("Role Keywords"));
        assert!(text.contains("Format check"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn test_json_round_trips() {
        let report = report();
        let json = JsonFormatter::new(false).format_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mode"], "quality_coach");
        assert!(value.get("autoReject").is_none());
        let back: ScoreReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.overall_score, report.overall_score);
        assert_eq!(back.breakdown.len(), report.breakdown.len());
    }

    #[test]
    fn test_markdown_table() {
        let text = MarkdownFormatter::new(false).format_report(&report()).unwrap();
        assert!(text.contains("| Category | Score | Max |"));
        assert!(text.contains("| Professional Polish |"));
    }

    #[test]
    fn test_suggest_filename() {
        assert_eq!(suggest_filename(&OutputFormat::Json, "resumes/jane.json", false), "jane_score.json");
        assert_eq!(suggest_filename(&OutputFormat::Markdown, "jane", false), "jane_score.md");
    }
}
