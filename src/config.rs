//! Configuration management for the ATS scorer

use crate::error::{Result, ScorerError};
use crate::processing::taxonomy::ExperienceLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const WEIGHT_EPSILON: f64 = 1e-6;

fn default_cache_capacity() -> usize {
    128
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub reference: ReferenceConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Required-keyword match percentage below which Mode A reports `autoReject`.
    pub auto_reject_threshold: f64,
    pub enable_caching: bool,
    /// Most reports the memo cache keeps before evicting the least recently used.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    pub mode_a: ModeAWeights,
    pub mode_b: ModeBWeights,
    pub format: FormatWeights,
    pub red_flags: RedFlagLimits,
    pub content: ContentTargets,
    pub levels: LevelConfig,
}

/// ATS simulation weights, out of 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeAWeights {
    pub required_keywords: f64,
    pub preferred_keywords: f64,
    pub format: f64,
    pub structure: f64,
}

/// Quality coach weights, out of 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeBWeights {
    pub role_keywords: f64,
    pub action_verbs: f64,
    pub quantification: f64,
    pub content_depth: f64,
    pub format: f64,
    pub polish: f64,
}

/// Format sub-check weights, summing to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatWeights {
    pub text_extraction: f64,
    pub sections: f64,
    pub bullets: f64,
    pub file_size: f64,
    pub special_characters: f64,
    pub pass_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedFlagLimits {
    pub gap_threshold_months: i64,
    pub gap_warning_months: i64,
    pub gap_critical_months: i64,
    pub months_per_gap_point: i64,
    pub gap_penalty_cap: u32,
    pub job_hop_months: i64,
    pub job_hop_penalty_cap: u32,
    pub repetition_threshold: usize,
    pub repetition_penalty_cap: u32,
    pub date_issue_penalty: u32,
    pub date_issue_penalty_cap: u32,
    pub balance_penalty: u32,
    pub min_experience_share: f64,
    pub max_experience_share: f64,
    pub max_skills_share: f64,
    pub vague_phrase_zero_at: usize,
    pub total_penalty_cap: u32,
    /// Subtract red-flag penalties from the summed category scores.
    pub apply_penalties: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTargets {
    pub min_bullets_per_role: usize,
    pub max_bullets_per_role: usize,
    /// Share of the content-depth category earned by vague-phrase avoidance.
    pub vague_phrase_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelThreshold {
    /// Average verb tier that earns full action-verb credit.
    pub expected_verb_tier: f64,
    /// Weighted quantification rate (percent) that earns full credit.
    pub target_quantification_rate: f64,
    pub min_words: usize,
    pub max_words: usize,
    pub max_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub entry: LevelThreshold,
    pub mid: LevelThreshold,
    pub senior: LevelThreshold,
    pub lead: LevelThreshold,
}

impl LevelConfig {
    pub fn for_level(&self, level: ExperienceLevel) -> &LevelThreshold {
        match level {
            ExperienceLevel::Entry => &self.entry,
            ExperienceLevel::Mid => &self.mid,
            ExperienceLevel::Senior => &self.senior,
            ExperienceLevel::Lead => &self.lead,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (ExperienceLevel, &LevelThreshold)> {
        ExperienceLevel::ALL.into_iter().map(move |l| (l, self.for_level(l)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// TOML synonym table replacing the built-in one.
    pub synonyms_path: Option<PathBuf>,
    /// TOML role taxonomy replacing the built-in one.
    pub taxonomy_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig {
                auto_reject_threshold: 60.0,
                enable_caching: true,
                cache_capacity: default_cache_capacity(),
                mode_a: ModeAWeights {
                    required_keywords: 50.0,
                    preferred_keywords: 20.0,
                    format: 20.0,
                    structure: 10.0,
                },
                mode_b: ModeBWeights {
                    role_keywords: 25.0,
                    action_verbs: 10.0,
                    quantification: 10.0,
                    content_depth: 10.0,
                    format: 25.0,
                    polish: 20.0,
                },
                format: FormatWeights {
                    text_extraction: 0.30,
                    sections: 0.30,
                    bullets: 0.20,
                    file_size: 0.10,
                    special_characters: 0.10,
                    pass_threshold: 0.8,
                },
                red_flags: RedFlagLimits {
                    gap_threshold_months: 3,
                    gap_warning_months: 9,
                    gap_critical_months: 18,
                    months_per_gap_point: 6,
                    gap_penalty_cap: 5,
                    job_hop_months: 12,
                    job_hop_penalty_cap: 3,
                    repetition_threshold: 3,
                    repetition_penalty_cap: 3,
                    date_issue_penalty: 1,
                    date_issue_penalty_cap: 2,
                    balance_penalty: 2,
                    min_experience_share: 40.0,
                    max_experience_share: 80.0,
                    max_skills_share: 30.0,
                    vague_phrase_zero_at: 5,
                    total_penalty_cap: 18,
                    apply_penalties: true,
                },
                content: ContentTargets {
                    min_bullets_per_role: 3,
                    max_bullets_per_role: 8,
                    vague_phrase_share: 0.6,
                },
                levels: LevelConfig {
                    entry: LevelThreshold {
                        expected_verb_tier: 2.0,
                        target_quantification_rate: 30.0,
                        min_words: 250,
                        max_words: 600,
                        max_pages: 1,
                    },
                    mid: LevelThreshold {
                        expected_verb_tier: 2.3,
                        target_quantification_rate: 40.0,
                        min_words: 400,
                        max_words: 800,
                        max_pages: 2,
                    },
                    senior: LevelThreshold {
                        expected_verb_tier: 2.6,
                        target_quantification_rate: 50.0,
                        min_words: 500,
                        max_words: 1000,
                        max_pages: 2,
                    },
                    lead: LevelThreshold {
                        expected_verb_tier: 2.8,
                        target_quantification_rate: 60.0,
                        min_words: 600,
                        max_words: 1200,
                        max_pages: 3,
                    },
                },
            },
            reference: ReferenceConfig::default(),
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Read and validate an explicit configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ScorerError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ScorerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("ats-scorer")
            .join("config.toml")
    }

    /// Reject weight tables that do not add up and ranges that are out of order.
    pub fn validate(&self) -> Result<()> {
        let s = &self.scoring;

        let a = &s.mode_a;
        check_total(
            "scoring.mode_a",
            &[a.required_keywords, a.preferred_keywords, a.format, a.structure],
            100.0,
        )?;

        let b = &s.mode_b;
        check_total(
            "scoring.mode_b",
            &[b.role_keywords, b.action_verbs, b.quantification, b.content_depth, b.format, b.polish],
            100.0,
        )?;

        let f = &s.format;
        check_total(
            "scoring.format",
            &[f.text_extraction, f.sections, f.bullets, f.file_size, f.special_characters],
            1.0,
        )?;
        check_range("scoring.format.pass_threshold", f.pass_threshold, 0.0, 1.0)?;

        let r = &s.red_flags;
        if !(0 < r.gap_threshold_months
            && r.gap_threshold_months < r.gap_warning_months
            && r.gap_warning_months < r.gap_critical_months)
        {
            return Err(ScorerError::Configuration(
                "scoring.red_flags gap thresholds must be positive and increasing".to_string(),
            ));
        }
        if r.months_per_gap_point <= 0 || r.job_hop_months <= 0 {
            return Err(ScorerError::Configuration(
                "scoring.red_flags month lengths must be positive".to_string(),
            ));
        }
        if r.repetition_threshold < 2 || r.vague_phrase_zero_at == 0 {
            return Err(ScorerError::Configuration(
                "scoring.red_flags repetition threshold must be at least 2 and vague_phrase_zero_at positive"
                    .to_string(),
            ));
        }
        check_range("scoring.red_flags.min_experience_share", r.min_experience_share, 0.0, 100.0)?;
        check_range("scoring.red_flags.max_experience_share", r.max_experience_share, r.min_experience_share, 100.0)?;
        check_range("scoring.red_flags.max_skills_share", r.max_skills_share, 0.0, 100.0)?;

        let c = &s.content;
        if c.min_bullets_per_role == 0 || c.min_bullets_per_role > c.max_bullets_per_role {
            return Err(ScorerError::Configuration(
                "scoring.content bullets-per-role range is empty".to_string(),
            ));
        }
        check_range("scoring.content.vague_phrase_share", c.vague_phrase_share, 0.0, 1.0)?;

        for (level, t) in s.levels.iter() {
            let name = format!("scoring.levels.{}", level);
            check_range(&format!("{}.expected_verb_tier", name), t.expected_verb_tier, 0.1, 4.0)?;
            check_range(
                &format!("{}.target_quantification_rate", name),
                t.target_quantification_rate,
                1.0,
                100.0,
            )?;
            if t.min_words > t.max_words || t.max_pages == 0 {
                return Err(ScorerError::Configuration(format!(
                    "{} word range is reversed or max_pages is zero",
                    name
                )));
            }
        }

        check_range("scoring.auto_reject_threshold", s.auto_reject_threshold, 0.0, 100.0)
    }
}

fn check_total(name: &str, weights: &[f64], expected: f64) -> Result<()> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(ScorerError::Configuration(format!("{} weights must be non-negative", name)));
    }
    let total: f64 = weights.iter().sum();
    if (total - expected).abs() > WEIGHT_EPSILON {
        return Err(ScorerError::Configuration(format!(
            "{} weights sum to {}, expected {}",
            name, total, expected
        )));
    }
    Ok(())
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ScorerError::Configuration(format!(
            "{} = {} is outside {}..={}",
            name, value, min, max
        )))
    }
}
