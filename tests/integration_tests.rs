//! Integration tests for the ATS scorer

use ats_scorer::config::Config;
use ats_scorer::input::InputManager;
use ats_scorer::output::formatter::{ReportGenerator, suggest_filename};
use ats_scorer::output::report::{Mode, Severity};
use ats_scorer::processing::action_verbs::{ActionVerbClassifier, VerbTier};
use ats_scorer::processing::analyzer::{ats_breakdown, is_auto_reject, overall_score, ModeARatios};
use ats_scorer::processing::document::{EndDate, Experience, ResumeDocument, YearMonth};
use ats_scorer::processing::quantification::{MetricQuality, QuantificationClassifier};
use ats_scorer::processing::red_flags::PenaltyRule;
use ats_scorer::{CachedScorer, ScoreRequest, ScoringEngine};
use std::path::Path;

fn as_of() -> YearMonth {
    "2024-06".parse().unwrap()
}

fn engine() -> ScoringEngine {
    ScoringEngine::new(&Config::default()).unwrap()
}

async fn fixture_resume() -> ResumeDocument {
    InputManager::new()
        .load_resume(Path::new("tests/fixtures/data_analyst_resume.json"))
        .await
        .unwrap()
}

fn role(title: &str, start: &str, end: Option<&str>, bullets: &[&str]) -> Experience {
    Experience {
        title: Some(title.to_string()),
        company: Some("Acme".to_string()),
        start_date: Some(start.parse().unwrap()),
        end_date: Some(match end {
            Some(month) => EndDate::Month(month.parse().unwrap()),
            None => EndDate::Present,
        }),
        bullets: bullets.iter().map(|b| b.to_string()).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_job_description_extraction_from_txt_and_markdown() {
    let mut manager = InputManager::new();
    let txt = manager
        .extract_text(Path::new("tests/fixtures/data_analyst_job.txt"))
        .await
        .unwrap();
    let md = manager
        .extract_text(Path::new("tests/fixtures/data_analyst_job.md"))
        .await
        .unwrap();
    assert!(!md.contains("**"));
    assert!(!md.contains("##"));
    assert_eq!(manager.cache_size(), 2);

    let engine = engine();
    let from_txt = engine.extract_keywords(&txt);
    let from_md = engine.extract_keywords(&md);
    for keyword in ["SQL", "Tableau", "Excel"] {
        assert!(from_txt.required.contains(&keyword.to_string()), "{} not required", keyword);
    }
    for keyword in ["Python", "Looker"] {
        assert!(from_txt.preferred.contains(&keyword.to_string()), "{} not preferred", keyword);
    }
    assert_eq!(from_txt, from_md);
}

#[tokio::test]
async fn test_unsupported_and_missing_files() {
    let mut manager = InputManager::new();
    assert!(manager.extract_text(Path::new("tests/fixtures/unsupported.xyz")).await.is_err());
    assert!(manager.extract_text(Path::new("tests/fixtures/nonexistent.txt")).await.is_err());
    assert!(manager.load_resume(Path::new("tests/fixtures/nonexistent.json")).await.is_err());
}

#[tokio::test]
async fn test_malformed_resume_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    tokio::fs::write(&path, r#"{"experience": [{"start_date": "2020-13"}]}"#).await.unwrap();

    let err = InputManager::new().load_resume(&path).await.unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_full_ats_simulation_from_files() {
    let resume = fixture_resume().await;
    let job = InputManager::new()
        .extract_text(Path::new("tests/fixtures/data_analyst_job.txt"))
        .await
        .unwrap();

    let request = ScoreRequest::new(resume, "data_analyst", "mid", as_of()).with_job_description(job);
    let report = engine().score(&request).unwrap();

    assert_eq!(report.mode, Mode::AtsSimulation);
    assert_eq!(report.auto_reject, Some(false));
    assert_eq!(report.keyword_details.required_percentage, 100.0);
    assert_eq!(report.keyword_details.preferred_percentage, 100.0);
    assert!(report.keyword_details.missing.is_empty());
    let keys: Vec<&str> = report.breakdown.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["format", "preferredKeywords", "requiredKeywords", "structure"]);
    assert_eq!(report.breakdown["requiredKeywords"].score, 50.0);
    assert!(report.overall_score >= 70);
    assert!(report.issues.critical.is_empty());
}

#[tokio::test]
async fn test_quality_coach_without_job_description() {
    let resume = fixture_resume().await;
    let report = engine()
        .score(&ScoreRequest::new(resume, "data_analyst", "mid", as_of()))
        .unwrap();

    assert_eq!(report.mode, Mode::QualityCoach);
    assert_eq!(report.auto_reject, None);
    assert_eq!(report.breakdown.len(), 6);
    assert!(report.breakdown.contains_key("actionVerbs"));
    assert!(report.breakdown.contains_key("polish"));
    assert!(report.issues.get(Severity::Info).iter().any(|m| m.contains("Data Analyst")));
    assert!(report.overall_score <= 100);
}

#[tokio::test]
async fn test_scoring_is_deterministic() {
    let resume = fixture_resume().await;
    let request = ScoreRequest::new(resume, "data_analyst", "senior", as_of())
        .with_job_description("Requirements:\n- SQL required\n- Power BI required\nNice to have: Looker");
    let engine = engine();

    let first = engine.score(&request).unwrap().to_json().unwrap();
    let second = engine.score(&request).unwrap().to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_scoring_shares_reference_tables() {
    let engine = engine();
    let resumes: Vec<ResumeDocument> = (0..4)
        .map(|i| ResumeDocument {
            skills: vec!["SQL".to_string(), format!("Skill{}", i)],
            experience: vec![role("Analyst", "2020-01", None, &["Analyzed sales data in SQL"])],
            ..Default::default()
        })
        .collect();

    let expected: Vec<u8> = resumes
        .iter()
        .map(|r| engine.score(&ScoreRequest::new(r.clone(), "data_analyst", "mid", as_of())).unwrap().overall_score)
        .collect();

    let scores: Vec<u8> = std::thread::scope(|scope| {
        let handles: Vec<_> = resumes
            .iter()
            .map(|r| {
                let engine = &engine;
                scope.spawn(move || {
                    engine
                        .score(&ScoreRequest::new(r.clone(), "data_analyst", "mid", as_of()))
                        .unwrap()
                        .overall_score
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(scores, expected);
}

#[test]
fn test_empty_resume_without_job_description() {
    let report = engine()
        .score(&ScoreRequest::new(ResumeDocument::default(), "general", "entry", as_of()))
        .unwrap();

    assert_eq!(report.format_check.checks.text_extraction.score, 0.3);
    assert!(report.overall_score < 40);
    assert!(report.breakdown.values().all(|c| c.score >= 0.0 && c.score <= c.max_score));
}

#[test]
fn test_empty_required_collection_is_vacuous_match() {
    let resume = ResumeDocument {
        skills: vec!["Python".to_string()],
        ..Default::default()
    };
    // Only a preferred section: nothing is required
    let request = ScoreRequest::new(resume, "general", "mid", as_of())
        .with_job_description("Nice to have:\n- Python and Looker");
    let report = engine().score(&request).unwrap();

    assert_eq!(report.mode, Mode::AtsSimulation);
    assert_eq!(report.keyword_details.required_percentage, 100.0);
    assert_eq!(report.breakdown["requiredKeywords"].score, 50.0);
    assert_eq!(report.auto_reject, Some(false));
}

#[test]
fn test_auto_reject_boundary() {
    let threshold = Config::default().scoring.auto_reject_threshold;
    assert!(is_auto_reject(59.0, threshold));
    assert!(!is_auto_reject(60.0, threshold));

    let resume = ResumeDocument {
        skills: vec!["Rust".to_string()],
        ..Default::default()
    };
    let request = ScoreRequest::new(resume, "software_engineer", "mid", as_of())
        .with_job_description("Requirements:\n- Rust and Kubernetes are required");
    let report = engine().score(&request).unwrap();
    assert_eq!(report.keyword_details.required_percentage, 50.0);
    assert_eq!(report.auto_reject, Some(true));
    assert_eq!(report.keyword_details.required_missing, vec!["Kubernetes".to_string()]);
}

fn required_list(keywords: &[&str]) -> String {
    let bullets: Vec<String> = keywords.iter().map(|k| format!("- {} required", k)).collect();
    format!("Requirements:\n{}\n", bullets.join("\n"))
}

fn with_skills(skills: &[&str]) -> ResumeDocument {
    ResumeDocument {
        skills: skills.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

#[test]
fn test_three_of_five_required_is_not_rejected() {
    let jd = required_list(&["SQL", "Tableau", "Excel", "Python", "Looker"]);
    let request = ScoreRequest::new(with_skills(&["SQL", "Tableau", "Excel"]), "data_analyst", "mid", as_of())
        .with_job_description(jd);
    let report = engine().score(&request).unwrap();

    assert_eq!(report.mode, Mode::AtsSimulation);
    assert_eq!(report.keyword_details.required_matched.len(), 3);
    assert_eq!(report.keyword_details.required_percentage, 60.0);
    assert_eq!(report.auto_reject, Some(false));
    assert_eq!(report.breakdown["requiredKeywords"].score, 30.0);
    assert!(!report.issues.critical.iter().any(|m| m.contains("required keywords matched")));
}

#[test]
fn test_thirteen_of_twenty_two_required_is_rejected() {
    let required = [
        "Python", "Java", "Ruby", "Kotlin", "Scala", "Django", "Flask", "Redux", "GraphQL", "Pandas",
        "NumPy", "Snowflake", "Databricks", "Tableau", "Looker", "MySQL", "Redis", "Cassandra",
        "SQLite", "Ansible", "Jenkins", "Nginx",
    ];
    let request = ScoreRequest::new(with_skills(&required[..13]), "software_engineer", "mid", as_of())
        .with_job_description(required_list(&required));
    let report = engine().score(&request).unwrap();

    assert_eq!(report.keyword_details.required_matched.len(), 13);
    assert_eq!(report.keyword_details.required_missing.len(), 9);
    // 13 / 22 = 59.09%
    assert_eq!(report.keyword_details.required_percentage, 59.1);
    assert_eq!(report.auto_reject, Some(true));
    assert!(report.issues.critical.iter().any(|m| m.starts_with("Only 59% of required keywords matched")));
}

#[test]
fn test_hand_computed_ats_weights() {
    let weights = Config::default().scoring.mode_a;
    let breakdown = ats_breakdown(
        &weights,
        &ModeARatios {
            required: 12.0 / 15.0,
            preferred: 0.5,
            format: 0.9,
            structure: 1.0,
        },
    );
    assert_eq!(breakdown["requiredKeywords"].score, 40.0);
    assert_eq!(breakdown["preferredKeywords"].score, 10.0);
    assert_eq!(breakdown["format"].score, 18.0);
    assert_eq!(breakdown["structure"].score, 10.0);

    let total: f64 = breakdown.values().map(|c| c.score).sum();
    assert_eq!(overall_score(total, 3.0), 75);
}

#[test]
fn test_weak_phrase_bullets() {
    let classifier = ActionVerbClassifier::new().unwrap();
    let bullets = [
        "Responsible for managing the data warehouse",
        "Responsible for weekly reports",
        "Responsible for onboarding analysts",
        "Responsible for developing dashboards",
        "Responsible for vendor relationships",
    ];
    let weak = classifier.classify_bullet(bullets[3]).unwrap();
    assert_eq!(weak.tier, VerbTier::Weak);

    let stats = classifier.stats(bullets.iter().copied());
    assert_eq!(stats.coverage_pct, 100.0);
    assert_eq!(stats.average_tier, 0.0);
}

#[test]
fn test_business_metric_outranks_bare_number() {
    let classifier = QuantificationClassifier::new().unwrap();
    assert_eq!(
        classifier.classify_bullet("Grew revenue by 25% across 3 regions"),
        Some(MetricQuality::High)
    );
    assert_eq!(classifier.classify_bullet("Maintained the reporting pipeline"), None);
}

#[test]
fn test_twenty_month_gap_is_penalized() {
    let resume = ResumeDocument {
        summary: Some("Analyst returning after a sabbatical focused on statistics coursework".to_string()),
        experience: vec![
            role("Analyst", "2018-12", Some("2020-03"), &["Analyzed churn for 40 clients"]),
            role("Senior Analyst", "2021-11", None, &["Automated weekly KPI reports in SQL"]),
        ],
        skills: vec!["SQL".to_string()],
        ..Default::default()
    };
    let report = engine()
        .score(&ScoreRequest::new(resume, "data_analyst", "mid", as_of()))
        .unwrap();

    assert_eq!(report.penalties.points_for(PenaltyRule::EmploymentGap), 3);
    assert!(report.issues.critical.iter().any(|m| m.contains("20-month")));
}

#[test]
fn test_cached_scorer_reuses_reports() {
    let mut scorer = CachedScorer::new(engine());
    let request = ScoreRequest::new(ResumeDocument::default(), "general", "mid", as_of());
    let first = scorer.score(&request).unwrap();
    let second = scorer.score(&request).unwrap();
    assert_eq!(first, second);
    assert_eq!(scorer.cache_size(), 1);
}

#[test]
fn test_reports_render_in_every_format() {
    let report = engine()
        .score(&ScoreRequest::new(ResumeDocument::default(), "general", "mid", as_of()))
        .unwrap();
    let generator = ReportGenerator::with_options(false, true, true, true);

    let json = generator.generate_report(&report, &ats_scorer::config::OutputFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["overallScore"], report.overall_score);
    assert_eq!(value["mode"], "quality_coach");
    assert!(value.get("autoReject").is_none());

    let markdown = generator
        .generate_report(&report, &ats_scorer::config::OutputFormat::Markdown)
        .unwrap();
    assert!(markdown.starts_with('#'));

    assert_eq!(
        suggest_filename(&ats_scorer::config::OutputFormat::Markdown, "resumes/jordan.json", false),
        "jordan_score.md"
    );
}
