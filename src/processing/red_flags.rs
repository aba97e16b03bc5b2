//! Red-flag detection: employment gaps, date problems, job hopping, vague phrasing,
//! verb repetition and section balance

use crate::config::RedFlagLimits;
use crate::output::report::{Issue, Severity};
use crate::processing::action_verbs::ActionVerbClassifier;
use crate::processing::document::{Experience, ResumeDocument, YearMonth};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

const CATEGORY: &str = "redFlags";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyRule {
    EmploymentGap,
    DateInconsistency,
    JobHopping,
    Repetition,
    SectionBalance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyItem {
    pub rule: PenaltyRule,
    pub points: u32,
    pub detail: String,
}

/// Red-flag deductions. `total` is the capped sum; it is subtracted from the score only
/// when `applied` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PenaltySummary {
    pub items: Vec<PenaltyItem>,
    pub raw_total: u32,
    pub cap: u32,
    pub total: u32,
    pub applied: bool,
}

impl PenaltySummary {
    pub fn deduction(&self) -> f64 {
        if self.applied {
            self.total as f64
        } else {
            0.0
        }
    }

    pub fn points_for(&self, rule: PenaltyRule) -> u32 {
        self.items.iter().filter(|i| i.rule == rule).map(|i| i.points).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmploymentGap {
    pub from: YearMonth,
    pub to: YearMonth,
    pub months: i64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedFlagReport {
    pub gaps: Vec<EmploymentGap>,
    pub date_issues: usize,
    pub short_tenures: usize,
    pub vague_phrases: usize,
    /// 1.0 with no vague phrasing, falling to 0.0
    pub vague_phrase_score: f64,
    pub repeated_verbs: BTreeMap<String, usize>,
    pub experience_share: Option<f64>,
    pub skills_share: Option<f64>,
    pub penalties: PenaltySummary,
    pub issues: Vec<Issue>,
}

pub struct RedFlagValidator {
    limits: RedFlagLimits,
    verbs: Arc<ActionVerbClassifier>,
}

impl RedFlagValidator {
    pub fn new(limits: RedFlagLimits, verbs: Arc<ActionVerbClassifier>) -> Self {
        Self { limits, verbs }
    }

    /// Run every check. `as_of` closes open-ended roles.
    pub fn validate(&self, document: &ResumeDocument, as_of: YearMonth) -> RedFlagReport {
        let mut report = RedFlagReport::default();
        let mut items = Vec::new();

        self.check_gaps(&document.experience, as_of, &mut report, &mut items);
        self.check_dates(&document.experience, as_of, &mut report, &mut items);
        self.check_job_hopping(&document.experience, as_of, &mut report, &mut items);
        self.check_vague_phrases(document, &mut report);
        self.check_repetition(document, &mut report, &mut items);
        self.check_section_balance(document, &mut report, &mut items);

        let raw_total: u32 = items.iter().map(|i: &PenaltyItem| i.points).sum();
        report.penalties = PenaltySummary {
            items,
            raw_total,
            cap: self.limits.total_penalty_cap,
            total: raw_total.min(self.limits.total_penalty_cap),
            applied: self.limits.apply_penalties,
        };
        report
    }

    /// Gaps between the latest end so far and the next start, over entries sorted by start.
    fn check_gaps(
        &self,
        experience: &[Experience],
        as_of: YearMonth,
        report: &mut RedFlagReport,
        items: &mut Vec<PenaltyItem>,
    ) {
        let mut spans: Vec<(YearMonth, YearMonth)> = experience
            .iter()
            .filter_map(|e| Some((e.start_date?, e.end_month(as_of)?)))
            .filter(|(start, end)| start <= end)
            .collect();
        spans.sort();

        let mut latest_end: Option<YearMonth> = None;
        for (start, end) in spans {
            if let Some(prev_end) = latest_end {
                let months = prev_end.months_until(&start);
                if months > self.limits.gap_threshold_months {
                    let severity = if months >= self.limits.gap_critical_months {
                        Severity::Critical
                    } else if months >= self.limits.gap_warning_months {
                        Severity::Warning
                    } else {
                        Severity::Suggestion
                    };
                    report.issues.push(Issue::new(
                        severity,
                        CATEGORY,
                        format!(
                            "{}-month employment gap between {} and {}; consider explaining it",
                            months, prev_end, start
                        ),
                    ));
                    report.gaps.push(EmploymentGap {
                        from: prev_end,
                        to: start,
                        months,
                        severity,
                    });
                }
            }
            latest_end = Some(latest_end.map_or(end, |e| e.max(end)));
        }

        let total_months: i64 = report.gaps.iter().map(|g| g.months).sum();
        let points = ((total_months / self.limits.months_per_gap_point) as u32).min(self.limits.gap_penalty_cap);
        if points > 0 {
            items.push(PenaltyItem {
                rule: PenaltyRule::EmploymentGap,
                points,
                detail: format!("{} months of gaps", total_months),
            });
        }
    }

    fn check_dates(
        &self,
        experience: &[Experience],
        as_of: YearMonth,
        report: &mut RedFlagReport,
        items: &mut Vec<PenaltyItem>,
    ) {
        for entry in experience {
            let mut problems = Vec::new();
            match entry.start_date {
                None => problems.push("missing start date".to_string()),
                Some(start) if start > as_of => problems.push(format!("start date {} is in the future", start)),
                Some(_) => {}
            }
            if entry.end_date.is_none() {
                problems.push("missing end date".to_string());
            }
            if let (Some(start), Some(end)) = (entry.start_date, entry.end_month(as_of)) {
                if end < start && !entry.is_current() {
                    problems.push(format!("end date {} is before start date {}", end, start));
                }
            }
            if problems.is_empty() {
                continue;
            }

            report.date_issues += 1;
            report.issues.push(Issue::new(
                Severity::Critical,
                CATEGORY,
                format!("{}: {}", describe(entry), problems.join(", ")),
            ));
        }

        let points = (report.date_issues as u32 * self.limits.date_issue_penalty)
            .min(self.limits.date_issue_penalty_cap);
        if points > 0 {
            items.push(PenaltyItem {
                rule: PenaltyRule::DateInconsistency,
                points,
                detail: format!("{} entries with date problems", report.date_issues),
            });
        }
    }

    /// Finished, permanent roles shorter than the job-hop threshold. Tenure counts both
    /// the start and end month.
    fn check_job_hopping(
        &self,
        experience: &[Experience],
        as_of: YearMonth,
        report: &mut RedFlagReport,
        items: &mut Vec<PenaltyItem>,
    ) {
        let short: Vec<String> = experience
            .iter()
            .filter(|e| !e.is_current() && !e.is_temporary())
            .filter_map(|e| {
                let start = e.start_date?;
                let end = e.end_month(as_of)?;
                let tenure = start.months_until(&end) + 1;
                (tenure > 0 && tenure < self.limits.job_hop_months).then(|| describe(e))
            })
            .collect();

        report.short_tenures = short.len();
        if short.is_empty() {
            return;
        }
        report.issues.push(Issue::new(
            Severity::Warning,
            CATEGORY,
            format!(
                "{} permanent roles lasted under {} months: {}",
                short.len(),
                self.limits.job_hop_months,
                short.join("; ")
            ),
        ));
        items.push(PenaltyItem {
            rule: PenaltyRule::JobHopping,
            points: (short.len() as u32).min(self.limits.job_hop_penalty_cap),
            detail: format!("{} short tenures", short.len()),
        });
    }

    fn check_vague_phrases(&self, document: &ResumeDocument, report: &mut RedFlagReport) {
        let count: usize = document
            .all_bullets()
            .iter()
            .map(|b| self.verbs.count_weak_phrases(b))
            .sum::<usize>()
            + document
                .summary
                .as_deref()
                .map(|s| self.verbs.count_weak_phrases(s))
                .unwrap_or(0);

        let zero_at = self.limits.vague_phrase_zero_at as f64;
        report.vague_phrases = count;
        report.vague_phrase_score = (1.0 - count as f64 / zero_at).clamp(0.0, 1.0);

        if count > 0 {
            report.issues.push(Issue::new(
                if count >= self.limits.vague_phrase_zero_at {
                    Severity::Warning
                } else {
                    Severity::Suggestion
                },
                CATEGORY,
                format!(
                    "{} vague phrases such as \"responsible for\"; lead with what you achieved",
                    count
                ),
            ));
        }
    }

    fn check_repetition(&self, document: &ResumeDocument, report: &mut RedFlagReport, items: &mut Vec<PenaltyItem>) {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for bullet in document.all_bullets() {
            if let Some(verb) = self.verbs.leading_verb(bullet) {
                *counts.entry(verb).or_default() += 1;
            }
        }
        counts.retain(|_, n| *n >= self.limits.repetition_threshold);

        for (verb, n) in &counts {
            report.issues.push(Issue::new(
                Severity::Suggestion,
                CATEGORY,
                format!("\"{}\" opens {} bullets; vary your action verbs", verb, n),
            ));
        }
        if !counts.is_empty() {
            items.push(PenaltyItem {
                rule: PenaltyRule::Repetition,
                points: (counts.len() as u32).min(self.limits.repetition_penalty_cap),
                detail: counts.keys().cloned().collect::<Vec<_>>().join(", "),
            });
        }
        report.repeated_verbs = counts;
    }

    fn check_section_balance(
        &self,
        document: &ResumeDocument,
        report: &mut RedFlagReport,
        items: &mut Vec<PenaltyItem>,
    ) {
        let total = document.full_text().split_whitespace().count();
        if total == 0 {
            return;
        }
        let share = |words: usize| (words as f64 / total as f64 * 100.0).min(100.0);
        let experience_share = share(document.experience_text().split_whitespace().count());
        let skills_share = share(document.skills_text().split_whitespace().count());
        report.experience_share = Some(experience_share);
        report.skills_share = Some(skills_share);

        let limits = &self.limits;
        if experience_share < limits.min_experience_share || experience_share > limits.max_experience_share {
            report.issues.push(Issue::new(
                Severity::Warning,
                CATEGORY,
                format!(
                    "Experience is {:.0}% of the resume; aim for {:.0}-{:.0}%",
                    experience_share, limits.min_experience_share, limits.max_experience_share
                ),
            ));
            items.push(PenaltyItem {
                rule: PenaltyRule::SectionBalance,
                points: limits.balance_penalty,
                detail: format!("experience share {:.0}%", experience_share),
            });
        }
        if skills_share > limits.max_skills_share {
            report.issues.push(Issue::new(
                Severity::Warning,
                CATEGORY,
                format!(
                    "Skills take up {:.0}% of the resume, which reads as keyword stuffing",
                    skills_share
                ),
            ));
            items.push(PenaltyItem {
                rule: PenaltyRule::SectionBalance,
                points: limits.balance_penalty,
                detail: format!("skills share {:.0}%", skills_share),
            });
        }
    }
}

fn describe(entry: &Experience) -> String {
    match (entry.title.as_deref(), entry.company.as_deref()) {
        (Some(title), Some(company)) => format!("{} at {}", title, company),
        (Some(title), None) => title.to_string(),
        (None, Some(company)) => company.to_string(),
        (None, None) => "Untitled position".to_string(),
    }
}
