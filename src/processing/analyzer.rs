//! Adaptive scoring engine: picks ATS simulation or quality coach mode, runs every
//! component and combines their sub-scores into one report

use crate::config::{Config, LevelThreshold, ModeAWeights, ModeBWeights};
use crate::error::Result;
use crate::output::report::{
    round1, CategoryScore, ContentStats, Issue, IssueBuckets, KeywordDetails, KeywordSource, Mode,
    ScoreReport, Severity,
};
use crate::processing::action_verbs::{ActionVerbClassifier, VerbStats};
use crate::processing::ats_matcher::{ATSMatcher, CollectionMatch, KeywordMatchResult};
use crate::processing::document::{ResumeDocument, YearMonth};
use crate::processing::format_checker::{FormatCheckResult, FormatChecker};
use crate::processing::keyword_extractor::{KeywordExtractor, KeywordSet};
use crate::processing::polish::{PolishScorer, SubScore};
use crate::processing::quantification::{QuantificationClassifier, QuantificationStats};
use crate::processing::red_flags::{RedFlagReport, RedFlagValidator};
use crate::processing::synonyms::SynonymTable;
use crate::processing::taxonomy::{ExperienceLevel, RoleTaxonomy, TaxonomyEntry};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Number of missing keywords named in a single issue message
const MISSING_SHOWN: usize = 8;

/// One scoring call. `as_of` anchors open-ended roles and gap checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub resume: ResumeDocument,
    pub job_description: Option<String>,
    pub role: String,
    pub level: String,
    pub as_of: YearMonth,
}

impl ScoreRequest {
    pub fn new(resume: ResumeDocument, role: &str, level: &str, as_of: YearMonth) -> Self {
        Self {
            resume,
            job_description: None,
            role: role.to_string(),
            level: level.to_string(),
            as_of,
        }
    }

    pub fn with_job_description(mut self, job_description: impl Into<String>) -> Self {
        self.job_description = Some(job_description.into());
        self
    }
}

/// Main scoring engine that coordinates all scoring components
pub struct ScoringEngine {
    config: Config,
    synonyms: Arc<SynonymTable>,
    taxonomy: Arc<RoleTaxonomy>,
    extractor: KeywordExtractor,
    matcher: ATSMatcher,
    verbs: Arc<ActionVerbClassifier>,
    quantifier: QuantificationClassifier,
    format_checker: FormatChecker,
    red_flags: RedFlagValidator,
    polish: PolishScorer,
    /// Component forced to fail in tests
    #[cfg(test)]
    failing: Option<&'static str>,
}

/// Outputs of the mode-independent components
struct Components {
    keywords: KeywordMatchResult,
    format: FormatCheckResult,
    red_flags: RedFlagReport,
    verbs: VerbStats,
    quantification: QuantificationStats,
    issues: Vec<Issue>,
}

impl ScoringEngine {
    /// Create an engine, loading reference tables from the configured paths or the
    /// built-in tables. Failure here is fatal for the process.
    pub fn new(config: &Config) -> Result<Self> {
        let synonyms = match &config.reference.synonyms_path {
            Some(path) => SynonymTable::from_file(path)?,
            None => SynonymTable::builtin()?,
        };
        let taxonomy = match &config.reference.taxonomy_path {
            Some(path) => RoleTaxonomy::from_file(path)?,
            None => RoleTaxonomy::builtin()?,
        };
        Self::with_reference(config, Arc::new(synonyms), Arc::new(taxonomy))
    }

    /// Create an engine around already loaded reference tables.
    pub fn with_reference(config: &Config, synonyms: Arc<SynonymTable>, taxonomy: Arc<RoleTaxonomy>) -> Result<Self> {
        config.validate()?;
        let verbs = Arc::new(ActionVerbClassifier::new()?);
        let scoring = &config.scoring;

        info!(
            "Scoring engine ready: {} synonym groups, {} roles",
            synonyms.len(),
            taxonomy.roles().count()
        );

        Ok(Self {
            extractor: KeywordExtractor::new(Arc::clone(&synonyms))?,
            matcher: ATSMatcher::new(Arc::clone(&synonyms)),
            quantifier: QuantificationClassifier::new()?,
            format_checker: FormatChecker::new(scoring.format.clone()),
            red_flags: RedFlagValidator::new(scoring.red_flags.clone(), Arc::clone(&verbs)),
            polish: PolishScorer::new(scoring.content.clone()),
            verbs,
            synonyms,
            taxonomy,
            config: config.clone(),
            #[cfg(test)]
            failing: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    pub fn taxonomy(&self) -> &RoleTaxonomy {
        &self.taxonomy
    }

    pub fn extractor(&self) -> &KeywordExtractor {
        &self.extractor
    }

    /// Score one resume. Only invalid role, level or date input is an error; every
    /// other problem degrades the affected category and is reported as an issue.
    pub fn score(&self, request: &ScoreRequest) -> Result<ScoreReport> {
        // 1. Validate before any scoring
        let level: ExperienceLevel = request.level.parse()?;
        let entry = self.taxonomy.lookup(&request.role, level)?;
        YearMonth::new(request.as_of.year, request.as_of.month)?;
        let threshold = self.config.scoring.levels.for_level(level);
        let resume = &request.resume;

        // 2. Mode selection
        let mut issues = Vec::new();
        let extracted = request.job_description.as_deref().and_then(|jd| {
            self.guarded("keywordExtraction", &mut issues, || Ok(self.extractor.extract(jd)))
        });
        let (mode, keywords, source) = match extracted {
            Some(extracted) if extracted.is_usable() => {
                (Mode::AtsSimulation, extracted.keywords, KeywordSource::JobDescription)
            }
            _ => {
                if request.job_description.is_some() {
                    issues.push(Issue::new(
                        Severity::Info,
                        "mode",
                        "No keywords could be extracted from the job description; scored against the role profile instead",
                    ));
                }
                issues.push(Issue::new(
                    Severity::Info,
                    "mode",
                    format!(
                        "Quality Coach mode: keywords come from the {} ({}) profile",
                        entry.role_name, level
                    ),
                ));
                (Mode::QualityCoach, entry.keyword_set(&self.synonyms), KeywordSource::RoleTaxonomy)
            }
        };
        info!(
            "Scoring in {} mode with {} required and {} preferred keywords",
            mode,
            keywords.required.len(),
            keywords.preferred.len()
        );

        // 3. Components
        let components = self.run_components(resume, &keywords, request.as_of);
        issues.extend(components.issues.iter().cloned());

        // 4. Mode-specific aggregation
        let (breakdown, auto_reject) = match mode {
            Mode::AtsSimulation => {
                let structure = self.guarded("structure", &mut issues, || {
                    Ok(self.polish.structure(resume, components.red_flags.date_issues))
                })
                .unwrap_or_default();
                let (breakdown, auto_reject) = self.ats_simulation(&components, structure, &mut issues);
                (breakdown, Some(auto_reject))
            }
            Mode::QualityCoach => {
                let breakdown = self.quality_coach(resume, &entry, level, threshold, &components, &mut issues);
                (breakdown, None)
            }
        };

        let category_total: f64 = breakdown.values().map(|c| c.score).sum();
        let overall_score = overall_score(category_total, components.red_flags.penalties.deduction());
        debug!(
            "Categories {:.1}, penalties {}, overall {}",
            category_total, components.red_flags.penalties.total, overall_score
        );

        Ok(ScoreReport {
            overall_score,
            mode,
            breakdown,
            keyword_details: keyword_details(source, &components.keywords),
            issues: IssueBuckets::from_issues(&issues),
            auto_reject,
            penalties: components.red_flags.penalties.clone(),
            content_stats: ContentStats {
                action_verbs: components.verbs.clone(),
                quantification: components.quantification.clone(),
                vague_phrases: components.red_flags.vague_phrases,
            },
            format_check: components.format,
            role: entry.role_id,
            level,
            as_of: request.as_of,
        })
    }

    /// Extract the keyword set a job description would score against.
    pub fn extract_keywords(&self, job_description: &str) -> KeywordSet {
        self.extractor.extract(job_description).keywords
    }

    fn run_components(&self, resume: &ResumeDocument, keywords: &KeywordSet, as_of: YearMonth) -> Components {
        let mut issues = Vec::new();
        let matching_text = matching_text(resume);
        let raw_text = if resume.raw_text.trim().is_empty() {
            resume.full_text()
        } else {
            resume.raw_text.clone()
        };
        let bullets = resume.all_bullets();

        let keywords = self.guarded("keywords", &mut issues, || {
            self.matcher.match_keywords(&matching_text, keywords)
        })
        .unwrap_or_else(|| unmatched(keywords));

        let format = self.guarded("format", &mut issues, || Ok(self.format_checker.check(resume, &raw_text)))
            .unwrap_or_default();
        issues.extend(format.issues.iter().cloned());

        let red_flags = self.guarded("redFlags", &mut issues, || Ok(self.red_flags.validate(resume, as_of)))
            .unwrap_or_default();
        issues.extend(red_flags.issues.iter().cloned());

        let verbs = self.guarded("actionVerbs", &mut issues, || Ok(self.verbs.stats(bullets.iter().copied())))
            .unwrap_or_default();
        let quantification = self.guarded("quantification", &mut issues, || {
            Ok(self.quantifier.stats(bullets.iter().copied()))
        })
        .unwrap_or_default();

        Components {
            keywords,
            format,
            red_flags,
            verbs,
            quantification,
            issues,
        }
    }

    fn ats_simulation(
        &self,
        components: &Components,
        structure: SubScore,
        issues: &mut Vec<Issue>,
    ) -> (BTreeMap<String, CategoryScore>, bool) {
        let weights = &self.config.scoring.mode_a;
        let required = &components.keywords.required;
        let preferred = &components.keywords.preferred;
        let auto_reject = is_auto_reject(required.match_percentage, self.config.scoring.auto_reject_threshold);

        let mut keyword_issues = Vec::new();
        if auto_reject {
            keyword_issues.push(Issue::new(
                Severity::Critical,
                "requiredKeywords",
                format!(
                    "Only {:.0}% of required keywords matched; below {:.0}% an ATS is likely to reject the resume",
                    required.match_percentage, self.config.scoring.auto_reject_threshold
                ),
            ));
        }
        if let Some(issue) = missing_issue(required, Severity::Warning, "requiredKeywords", "Missing required keywords") {
            keyword_issues.push(issue);
        }
        let mut preferred_issues = Vec::new();
        if let Some(issue) = missing_issue(preferred, Severity::Suggestion, "preferredKeywords", "Consider adding") {
            preferred_issues.push(issue);
        }

        let ratios = ModeARatios {
            required: required.match_percentage / 100.0,
            preferred: preferred.match_percentage / 100.0,
            format: components.format.score,
            structure: structure.ratio,
        };
        let mut breakdown = ats_breakdown(weights, &ratios);

        attach(&mut breakdown, "requiredKeywords", &keyword_issues);
        attach(&mut breakdown, "preferredKeywords", &preferred_issues);
        attach(&mut breakdown, "format", &components.format.issues);
        attach(&mut breakdown, "structure", &structure.issues);

        issues.extend(keyword_issues);
        issues.extend(preferred_issues);
        issues.extend(structure.issues);
        (breakdown, auto_reject)
    }

    fn quality_coach(
        &self,
        resume: &ResumeDocument,
        entry: &TaxonomyEntry,
        level: ExperienceLevel,
        threshold: &LevelThreshold,
        components: &Components,
        issues: &mut Vec<Issue>,
    ) -> BTreeMap<String, CategoryScore> {
        let weights = &self.config.scoring.mode_b;
        let required = &components.keywords.required;
        let preferred = &components.keywords.preferred;

        let mut keyword_issues = Vec::new();
        if let Some(issue) = missing_issue(required, Severity::Warning, "roleKeywords", "Core skills for this role not found") {
            keyword_issues.push(issue);
        }
        if let Some(issue) = missing_issue(preferred, Severity::Suggestion, "roleKeywords", "Consider adding") {
            keyword_issues.push(issue);
        }

        let verb_issues = self.verb_issues(resume, entry, &components.verbs);
        let quant_issues = quantification_issues(entry, &components.quantification, threshold);

        let depth = self.guarded("contentDepth", issues, || {
            Ok(self.polish.content_depth(resume, components.red_flags.vague_phrase_score))
        })
        .unwrap_or_default();
        let polish = self.guarded("polish", issues, || Ok(self.polish.polish(resume, level, threshold)))
            .unwrap_or_default();

        let ratios = ModeBRatios {
            required: required.match_percentage / 100.0,
            preferred: preferred.match_percentage / 100.0,
            average_tier: components.verbs.average_tier,
            coverage: components.verbs.coverage_pct / 100.0,
            quantification_rate: components.quantification.weighted_rate,
            content_depth: depth.ratio,
            format: components.format.score,
            polish: polish.ratio,
        };
        let mut breakdown = coach_breakdown(weights, threshold, &ratios);

        attach(&mut breakdown, "roleKeywords", &keyword_issues);
        attach(&mut breakdown, "actionVerbs", &verb_issues);
        attach(&mut breakdown, "quantification", &quant_issues);
        attach(&mut breakdown, "contentDepth", &depth.issues);
        attach(&mut breakdown, "format", &components.format.issues);
        attach(&mut breakdown, "polish", &polish.issues);

        issues.extend(keyword_issues);
        issues.extend(verb_issues);
        issues.extend(quant_issues);
        issues.extend(depth.issues);
        issues.extend(polish.issues);
        breakdown
    }

    fn verb_issues(&self, resume: &ResumeDocument, entry: &TaxonomyEntry, stats: &VerbStats) -> Vec<Issue> {
        let mut issues = Vec::new();
        if stats.total == 0 {
            issues.push(Issue::new(
                Severity::Warning,
                "actionVerbs",
                "No bullet points found to assess action verbs",
            ));
            return issues;
        }
        if stats.weak_count() > 0 {
            issues.push(Issue::new(
                Severity::Warning,
                "actionVerbs",
                format!(
                    "{} bullets open with passive phrasing such as \"responsible for\"",
                    stats.weak_count()
                ),
            ));
        }
        if stats.unclassified() > 0 {
            issues.push(Issue::new(
                Severity::Suggestion,
                "actionVerbs",
                format!("{} bullets do not start with an action verb", stats.unclassified()),
            ));
        }

        let used: BTreeSet<String> = resume
            .all_bullets()
            .iter()
            .filter_map(|b| self.verbs.leading_verb(b))
            .collect();
        let typical: Vec<&str> = entry
            .profile
            .action_verbs
            .iter()
            .filter(|v| self.verbs.leading_verb(v).is_some_and(|form| !used.contains(&form)))
            .map(|v| v.as_str())
            .collect();
        if !typical.is_empty() && typical.len() == entry.profile.action_verbs.len() {
            issues.push(Issue::new(
                Severity::Info,
                "actionVerbs",
                format!("Verbs typical for {} roles: {}", entry.role_name, typical.join(", ")),
            ));
        }
        issues
    }

    /// `isolate` with a per-engine failure switch for tests.
    fn guarded<T, F>(&self, category: &str, issues: &mut Vec<Issue>, component: F) -> Option<T>
    where
        F: FnOnce() -> Result<T>,
    {
        #[cfg(test)]
        if self.failing.is_some_and(|name| name == category) {
            return isolate(category, issues, || -> Result<T> {
                Err(crate::error::ScorerError::Processing("component unavailable".to_string()))
            });
        }
        isolate(category, issues, component)
    }
}

/// Run a component, turning an error or a panic into a degraded category plus an issue.
fn isolate<T, F>(category: &str, issues: &mut Vec<Issue>, component: F) -> Option<T>
where
    F: FnOnce() -> Result<T>,
{
    let failure = match panic::catch_unwind(AssertUnwindSafe(component)) {
        Ok(Ok(value)) => return Some(value),
        Ok(Err(e)) => e.to_string(),
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "component panicked".to_string()),
    };
    warn!("{} scoring failed: {}", category, failure);
    issues.push(Issue::new(
        Severity::Warning,
        category,
        format!("The {} check could not be completed and scored 0: {}", category, failure),
    ));
    None
}

/// Advisory auto-reject flag: required match strictly below the threshold.
pub fn is_auto_reject(required_percentage: f64, threshold: f64) -> bool {
    required_percentage < threshold
}

/// Category sum minus penalties, rounded and clamped to 0–100.
pub fn overall_score(category_total: f64, penalty: f64) -> u8 {
    let score = (category_total - penalty).round();
    if score.is_nan() {
        return 0;
    }
    score.clamp(0.0, 100.0) as u8
}

/// Component ratios feeding the ATS simulation weights, each 0.0–1.0
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeARatios {
    pub required: f64,
    pub preferred: f64,
    pub format: f64,
    pub structure: f64,
}

pub fn ats_breakdown(weights: &ModeAWeights, ratios: &ModeARatios) -> BTreeMap<String, CategoryScore> {
    BTreeMap::from([
        ("requiredKeywords".to_string(), CategoryScore::from_ratio(ratios.required, weights.required_keywords)),
        ("preferredKeywords".to_string(), CategoryScore::from_ratio(ratios.preferred, weights.preferred_keywords)),
        ("format".to_string(), CategoryScore::from_ratio(ratios.format, weights.format)),
        ("structure".to_string(), CategoryScore::from_ratio(ratios.structure, weights.structure)),
    ])
}

/// Component measurements feeding the quality coach weights
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeBRatios {
    pub required: f64,
    pub preferred: f64,
    pub average_tier: f64,
    /// Classified share of bullets, 0.0–1.0
    pub coverage: f64,
    /// Weighted quantification rate, 0–100
    pub quantification_rate: f64,
    pub content_depth: f64,
    pub format: f64,
    pub polish: f64,
}

pub fn coach_breakdown(
    weights: &ModeBWeights,
    threshold: &LevelThreshold,
    ratios: &ModeBRatios,
) -> BTreeMap<String, CategoryScore> {
    let keywords = 0.7 * ratios.required + 0.3 * ratios.preferred;
    let verbs = (ratios.average_tier / threshold.expected_verb_tier).min(1.0) * ratios.coverage;
    let quantification = (ratios.quantification_rate / threshold.target_quantification_rate).min(1.0);

    BTreeMap::from([
        ("roleKeywords".to_string(), CategoryScore::from_ratio(keywords, weights.role_keywords)),
        ("actionVerbs".to_string(), CategoryScore::from_ratio(verbs, weights.action_verbs)),
        ("quantification".to_string(), CategoryScore::from_ratio(quantification, weights.quantification)),
        ("contentDepth".to_string(), CategoryScore::from_ratio(ratios.content_depth, weights.content_depth)),
        ("format".to_string(), CategoryScore::from_ratio(ratios.format, weights.format)),
        ("polish".to_string(), CategoryScore::from_ratio(ratios.polish, weights.polish)),
    ])
}

fn quantification_issues(entry: &TaxonomyEntry, stats: &QuantificationStats, threshold: &LevelThreshold) -> Vec<Issue> {
    let mut issues = Vec::new();
    if stats.total == 0 {
        return issues;
    }
    if stats.weighted_rate < threshold.target_quantification_rate {
        issues.push(Issue::new(
            Severity::Suggestion,
            "quantification",
            format!(
                "Quantification rate is {:.0}%; aim for {:.0}% with percentages, revenue or scale figures",
                stats.weighted_rate, threshold.target_quantification_rate
            ),
        ));
    }
    if stats.quantified() < entry.profile.expected_metrics {
        issues.push(Issue::new(
            Severity::Suggestion,
            "quantification",
            format!(
                "{} quantified bullets; {} {} resumes usually show at least {}",
                stats.quantified(),
                entry.level,
                entry.role_name,
                entry.profile.expected_metrics
            ),
        ));
    }
    issues
}

fn missing_issue(collection: &CollectionMatch, severity: Severity, category: &str, label: &str) -> Option<Issue> {
    if collection.missing.is_empty() {
        return None;
    }
    let shown: Vec<&str> = collection.missing.iter().take(MISSING_SHOWN).map(|s| s.as_str()).collect();
    let more = collection.missing.len().saturating_sub(MISSING_SHOWN);
    let suffix = if more > 0 { format!(" and {} more", more) } else { String::new() };
    Some(Issue::new(severity, category, format!("{}: {}{}", label, shown.join(", "), suffix)))
}

fn attach(breakdown: &mut BTreeMap<String, CategoryScore>, category: &str, issues: &[Issue]) {
    if let Some(score) = breakdown.get_mut(category) {
        for issue in issues {
            if !score.issues.contains(&issue.message) {
                score.issues.push(issue.message.clone());
            }
        }
    }
}

/// Resume text used for keyword matching. Skills and certifications are appended when
/// the extracted text is used so structured-only skills still count.
fn matching_text(resume: &ResumeDocument) -> String {
    if resume.raw_text.trim().is_empty() {
        return resume.full_text();
    }
    let mut text = resume.raw_text.clone();
    for extra in resume.skills.iter().chain(resume.certifications.iter()) {
        text.push('\n');
        text.push_str(extra);
    }
    text
}

fn unmatched(keywords: &KeywordSet) -> KeywordMatchResult {
    let none = |missing: &[String]| CollectionMatch {
        matched: Vec::new(),
        missing: missing.to_vec(),
        match_percentage: if missing.is_empty() { 100.0 } else { 0.0 },
    };
    KeywordMatchResult {
        required: none(&keywords.required),
        preferred: none(&keywords.preferred),
    }
}

fn keyword_details(source: KeywordSource, result: &KeywordMatchResult) -> KeywordDetails {
    let required_matched = result.required.matched_keywords();
    let preferred_matched = result.preferred.matched_keywords();
    KeywordDetails {
        source,
        matched: required_matched.iter().chain(&preferred_matched).cloned().collect(),
        missing: result
            .required
            .missing
            .iter()
            .chain(&result.preferred.missing)
            .cloned()
            .collect(),
        required_matched,
        required_missing: result.required.missing.clone(),
        preferred_matched,
        preferred_missing: result.preferred.missing.clone(),
        required_percentage: round1(result.required.match_percentage),
        preferred_percentage: round1(result.preferred.match_percentage),
        matches: result
            .required
            .matched
            .iter()
            .chain(&result.preferred.matched)
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScorerError;
    use crate::processing::document::{ContactInfo, Education, EndDate, Experience};

    fn engine() -> ScoringEngine {
        ScoringEngine::new(&Config::default()).unwrap()
    }

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn resume() -> ResumeDocument {
        ResumeDocument {
            contact: ContactInfo {
                name: Some("Sam Rivera".to_string()),
                email: Some("sam@example.com".to_string()),
                phone: Some("555-0100".to_string()),
                location: Some("Austin, TX".to_string()),
                links: Vec::new(),
            },
            summary: Some("Backend engineer building reliable Python and Docker services".to_string()),
            experience: vec![Experience {
                title: Some("Software Engineer".to_string()),
                company: Some("Acme".to_string()),
                start_date: Some(ym("2019-01")),
                end_date: Some(EndDate::Present),
                bullets: vec![
                    "Built Python services handling 2M requests per day".to_string(),
                    "Led migration to Docker, cutting deploy time by 40%".to_string(),
                    "Optimized SQL queries for 10K+ users".to_string(),
                ],
                ..Default::default()
            }],
            education: vec![Education {
                degree: Some("BS Computer Science".to_string()),
                institution: Some("State University".to_string()),
                ..Default::default()
            }],
            skills: vec!["Python".to_string(), "Docker".to_string(), "SQL".to_string()],
            ..Default::default()
        }
    }

    const JD: &str = "Requirements:\n- Python is required\n- Docker experience required\n- Kubernetes required\n\nNice to have:\n- Terraform\n";

    #[test]
    fn test_mode_selection() {
        let e = engine();
        let coach = e
            .score(&ScoreRequest::new(resume(), "software_engineer", "mid", ym("2024-06")))
            .unwrap();
        assert_eq!(coach.mode, Mode::QualityCoach);
        assert!(coach.auto_reject.is_none());
        assert_eq!(coach.breakdown.len(), 6);

        let ats = e
            .score(&ScoreRequest::new(resume(), "software_engineer", "mid", ym("2024-06")).with_job_description(JD))
            .unwrap();
        assert_eq!(ats.mode, Mode::AtsSimulation);
        assert_eq!(ats.breakdown.len(), 4);
        assert_eq!(ats.keyword_details.source, KeywordSource::JobDescription);
    }

    #[test]
    fn test_blank_job_description_falls_back() {
        let report = engine()
            .score(&ScoreRequest::new(resume(), "general", "mid", ym("2024-06")).with_job_description("   \n"))
            .unwrap();
        assert_eq!(report.mode, Mode::QualityCoach);
        assert!(report.issues.info.iter().any(|m| m.contains("job description")));
    }

    #[test]
    fn test_invalid_role_and_level_are_errors() {
        let e = engine();
        let err = e
            .score(&ScoreRequest::new(resume(), "astronaut", "mid", ym("2024-06")))
            .unwrap_err();
        assert!(matches!(err, ScorerError::UnknownRole(_)));
        let err = e
            .score(&ScoreRequest::new(resume(), "general", "wizard", ym("2024-06")))
            .unwrap_err();
        assert!(matches!(err, ScorerError::UnknownLevel(_)));
        let err = e
            .score(&ScoreRequest::new(resume(), "bad/role", "mid", ym("2024-06")))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_auto_reject_threshold() {
        assert!(is_auto_reject(59.0, 60.0));
        assert!(!is_auto_reject(60.0, 60.0));
    }

    #[test]
    fn test_ats_required_keyword_weight() {
        let weights = Config::default().scoring.mode_a;
        let breakdown = ats_breakdown(
            &weights,
            &ModeARatios {
                required: 12.0 / 15.0,
                preferred: 0.5,
                format: 1.0,
                structure: 0.9,
            },
        );
        assert_eq!(breakdown["requiredKeywords"].score, 40.0);
        assert_eq!(breakdown["preferredKeywords"].score, 10.0);
        assert_eq!(breakdown["format"].score, 20.0);
        assert_eq!(breakdown["structure"].score, 9.0);
        let total: f64 = breakdown.values().map(|c| c.score).sum();
        assert_eq!(overall_score(total, 0.0), 79);
        assert_eq!(overall_score(total, 3.0), 76);
    }

    #[test]
    fn test_coach_breakdown_caps_at_targets() {
        let config = Config::default();
        let breakdown = coach_breakdown(
            &config.scoring.mode_b,
            &config.scoring.levels.mid,
            &ModeBRatios {
                required: 1.0,
                preferred: 0.0,
                average_tier: 3.5,
                coverage: 0.5,
                quantification_rate: 80.0,
                content_depth: 1.0,
                format: 1.0,
                polish: 0.5,
            },
        );
        assert_eq!(breakdown["roleKeywords"].score, 17.5);
        assert_eq!(breakdown["actionVerbs"].score, 5.0);
        assert_eq!(breakdown["quantification"].score, 10.0);
        assert_eq!(breakdown["polish"].score, 10.0);
    }

    #[test]
    fn test_overall_score_is_clamped() {
        assert_eq!(overall_score(5.0, 18.0), 0);
        assert_eq!(overall_score(140.0, 0.0), 100);
        assert_eq!(overall_score(f64::NAN, 0.0), 0);
    }

    #[test]
    fn test_isolate_degrades_on_panic_and_error() {
        let mut issues = Vec::new();
        let value: Option<u8> = isolate("format", &mut issues, || panic!("boom"));
        assert!(value.is_none());
        let value: Option<u8> = isolate("keywords", &mut issues, || {
            Err(ScorerError::Processing("bad shape".to_string()))
        });
        assert!(value.is_none());
        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.contains("boom"));
        assert_eq!(issues[1].category, "keywords");
    }

    #[test]
    fn test_failed_component_zeroes_only_its_category() {
        let request = ScoreRequest::new(resume(), "software_engineer", "mid", ym("2024-06"));
        let healthy = engine().score(&request).unwrap();

        let mut e = engine();
        e.failing = Some("actionVerbs");
        let degraded = e.score(&request).unwrap();

        assert_eq!(degraded.mode, Mode::QualityCoach);
        assert_eq!(degraded.breakdown.len(), 6);
        assert_eq!(degraded.breakdown["actionVerbs"].score, 0.0);
        assert!(healthy.breakdown["actionVerbs"].score > 0.0);
        for (name, category) in &degraded.breakdown {
            if name != "actionVerbs" {
                assert_eq!(category.score, healthy.breakdown[name].score, "{}", name);
            }
        }
        assert!(degraded
            .issues
            .warning
            .iter()
            .any(|m| m.starts_with("The actionVerbs check could not be completed and scored 0")));
        assert!(degraded.overall_score < healthy.overall_score);
        assert_eq!(degraded.keyword_details, healthy.keyword_details);
    }

    #[test]
    fn test_failed_format_check_in_ats_mode() {
        let request = ScoreRequest::new(resume(), "software_engineer", "mid", ym("2024-06")).with_job_description(JD);
        let healthy = engine().score(&request).unwrap();

        let mut e = engine();
        e.failing = Some("format");
        let degraded = e.score(&request).unwrap();

        assert_eq!(degraded.breakdown["format"].score, 0.0);
        assert_eq!(degraded.breakdown["requiredKeywords"].score, healthy.breakdown["requiredKeywords"].score);
        assert_eq!(degraded.auto_reject, healthy.auto_reject);
        assert!(degraded.issues.warning.iter().any(|m| m.contains("The format check could not be completed")));
    }

    #[test]
    fn test_coach_category_values() {
        let report = engine()
            .score(&ScoreRequest::new(resume(), "software_engineer", "mid", ym("2024-06")))
            .unwrap();
        let b = &report.breakdown;

        // Built (2), Led (3), Optimized (2): 2.33 average clears the 2.3 mid target
        assert_eq!(b["actionVerbs"].score, 10.0);
        // 40% (1.0) plus two scale figures (0.7 each): 80% against a 40% target
        assert!((report.content_stats.quantification.weighted_rate - 80.0).abs() < 1e-9);
        assert_eq!(b["quantification"].score, 10.0);
        // three bullets in the one role and no vague phrasing
        assert_eq!(b["contentDepth"].score, 10.0);

        let details = &report.keyword_details;
        let keywords = 25.0 * (0.7 * details.required_percentage + 0.3 * details.preferred_percentage) / 100.0;
        assert!((b["roleKeywords"].score - keywords).abs() <= 0.1);
        assert!((b["format"].score - report.format_check.score * 25.0).abs() <= 0.05);
        assert!(b["polish"].score > 0.0 && b["polish"].score < 20.0);
    }

    #[test]
    fn test_empty_resume_scores_in_range() {
        let report = engine()
            .score(&ScoreRequest::new(ResumeDocument::default(), "general", "entry", ym("2024-06")))
            .unwrap();
        assert!(report.overall_score <= 100);
        assert_eq!(report.format_check.checks.text_extraction.score, 0.3);
    }

    #[test]
    fn test_missing_section_reported_once() {
        let mut doc = resume();
        doc.education.clear();
        let e = engine();
        for request in [
            ScoreRequest::new(doc.clone(), "software_engineer", "mid", ym("2024-06")),
            ScoreRequest::new(doc.clone(), "software_engineer", "mid", ym("2024-06")).with_job_description(JD),
        ] {
            let report = e.score(&request).unwrap();
            let mentions = report
                .issues
                .iter()
                .filter(|(_, m)| m.to_lowercase().contains("education"))
                .count();
            assert_eq!(mentions, 1);
        }
    }

    #[test]
    fn test_issues_merge_components() {
        let mut doc = resume();
        doc.contact.email = None;
        doc.contact.phone = None;
        let report = engine()
            .score(&ScoreRequest::new(doc, "software_engineer", "mid", ym("2024-06")).with_job_description(JD))
            .unwrap();
        assert!(!report.issues.critical.is_empty());
        assert!(report.breakdown["structure"].issues.iter().any(|m| m.contains("Contact details")));
    }
}
