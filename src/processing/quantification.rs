//! Quantified-achievement detection

use crate::error::{Result, ScorerError};
use crate::processing::document::strip_bullet_marker;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Business-impact specificity of a quantified bullet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricQuality {
    Low,
    Medium,
    High,
}

impl MetricQuality {
    pub fn weight(&self) -> f64 {
        match self {
            MetricQuality::High => 1.0,
            MetricQuality::Medium => 0.7,
            MetricQuality::Low => 0.3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantificationStats {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Sum of matched weights over total bullets, as a percentage.
    pub weighted_rate: f64,
}

impl QuantificationStats {
    pub fn quantified(&self) -> usize {
        self.high + self.medium + self.low
    }
}

pub struct QuantificationClassifier {
    high: Vec<Regex>,
    medium: Vec<Regex>,
    bare_number: Regex,
}

impl QuantificationClassifier {
    pub fn new() -> Result<Self> {
        let compile = |patterns: &[&str]| -> Result<Vec<Regex>> {
            patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|e| {
                        ScorerError::Processing(format!("Invalid metric pattern '{}': {}", p, e))
                    })
                })
                .collect()
        };

        let high = compile(&[
            // percentages
            r"(?i)\b\d+(?:\.\d+)?\s?%|\b\d+(?:\.\d+)?\s?percent\b",
            // currency
            r"(?i)[$€£¥]\s?\d[\d,]*(?:\.\d+)?(?:\s?(?:k|m|mm|b|bn|million|billion|thousand))?\b",
            r"(?i)\b\d[\d,]*(?:\.\d+)?\s?(?:k|m|b)?\s?(?:usd|eur|gbp|dollars)\b",
            // multipliers
            r"(?i)\b\d+(?:\.\d+)?\s?x\b|\b(?:doubled|tripled|quadrupled)\b",
            // before and after
            r"(?i)\b(?:increased|reduced|improved|decreased|grew|cut|boosted|raised|lowered|shortened|accelerated)\b[^.;]*?\bfrom\s+\S*\d[^\s]*\s+to\s+\S*\d",
        ])?;

        let medium = compile(&[
            // team size
            r"(?i)\b(?:team|group|staff|squad|organization)\s+of\s+\d+",
            r"(?i)\b\d+\+?\s?(?:-\s?)?(?:person|people|member|members|engineers|developers|analysts|reports|direct reports|employees|contractors)\b",
            // duration
            r"(?i)\b\d+\+?\s?(?:-\s?)?(?:years?|months?|weeks?|days?|hours?|quarters?|sprints?)\b",
            // user and customer scale
            r"(?i)\b\d[\d,.]*\s?[kmb]?\+?\s?(?:users|customers|clients|subscribers|downloads|accounts|patients|students|merchants|stores|partners)\b",
            // traffic
            r"(?i)\b\d[\d,.]*\s?[kmb]?\+?\s?(?:requests|transactions|events|queries|messages|visits|visitors|page views|pageviews|rps|qps|tps)\b",
        ])?;

        Ok(Self {
            high,
            medium,
            // Standalone numbers only; digits inside EC2, OAuth2 or Q3 are part of a name
            bare_number: Regex::new(r"\b\d[\d,.]*\b")
                .map_err(|e| ScorerError::Processing(format!("Invalid metric pattern: {}", e)))?,
        })
    }

    /// Strongest metric class present in a bullet, or `None` when there is no number.
    pub fn classify_bullet(&self, text: &str) -> Option<MetricQuality> {
        let text = strip_bullet_marker(text);
        if self.high.iter().any(|r| r.is_match(text)) {
            Some(MetricQuality::High)
        } else if self.medium.iter().any(|r| r.is_match(text)) {
            Some(MetricQuality::Medium)
        } else if self.bare_number.is_match(text) {
            Some(MetricQuality::Low)
        } else {
            None
        }
    }

    pub fn stats<'a, I>(&self, bullets: I) -> QuantificationStats
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut stats = QuantificationStats::default();
        let mut weight_sum = 0.0;
        for bullet in bullets {
            stats.total += 1;
            let Some(quality) = self.classify_bullet(bullet) else {
                continue;
            };
            match quality {
                MetricQuality::High => stats.high += 1,
                MetricQuality::Medium => stats.medium += 1,
                MetricQuality::Low => stats.low += 1,
            }
            weight_sum += quality.weight();
        }
        if stats.total > 0 {
            stats.weighted_rate = weight_sum / stats.total as f64 * 100.0;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Option<MetricQuality> {
        QuantificationClassifier::new().unwrap().classify_bullet(text)
    }

    #[test]
    fn test_high_patterns() {
        assert_eq!(classify("Cut churn by 18%"), Some(MetricQuality::High));
        assert_eq!(classify("Saved $1.2M in annual spend"), Some(MetricQuality::High));
        assert_eq!(classify("Delivered a 3x throughput gain"), Some(MetricQuality::High));
        assert_eq!(
            classify("Reduced build time from 40 to 12 minutes"),
            Some(MetricQuality::High)
        );
    }

    #[test]
    fn test_medium_patterns() {
        assert_eq!(classify("Managed a team of 8"), Some(MetricQuality::Medium));
        assert_eq!(classify("Mentored 4 engineers"), Some(MetricQuality::Medium));
        assert_eq!(classify("Ran the program for 18 months"), Some(MetricQuality::Medium));
        assert_eq!(classify("Served 100K+ users daily"), Some(MetricQuality::Medium));
        assert_eq!(classify("Handled 5,000 requests per second"), Some(MetricQuality::Medium));
    }

    #[test]
    fn test_low_and_none() {
        assert_eq!(classify("Wrote 12 design docs"), Some(MetricQuality::Low));
        assert_eq!(classify("Improved onboarding"), None);
    }

    #[test]
    fn test_digits_inside_identifiers_are_not_metrics() {
        assert_eq!(classify("Migrated workloads to AWS EC2 and S3"), None);
        assert_eq!(classify("Owned the Q3 roadmap"), None);
        assert_eq!(classify("Implemented OAuth2 login with Python3 services on K8s"), None);

        let stats = QuantificationClassifier::new()
            .unwrap()
            .stats(["Migrated workloads to AWS EC2 and S3", "Implemented OAuth2 login"]);
        assert_eq!(stats.low, 0);
        assert_eq!(stats.weighted_rate, 0.0);
    }

    #[test]
    fn test_high_wins_over_bare_number() {
        assert_eq!(
            classify("Reduced costs by $200K (about 12 items optimized)"),
            Some(MetricQuality::High)
        );
    }

    #[test]
    fn test_weighted_rate() {
        let classifier = QuantificationClassifier::new().unwrap();
        let stats = classifier.stats(vec![
            "Grew revenue 25%",
            "Led a team of 5",
            "Filed 3 patents",
            "Owned the roadmap",
        ]);
        assert_eq!(stats.total, 4);
        assert_eq!((stats.high, stats.medium, stats.low), (1, 1, 1));
        assert_eq!(stats.quantified(), 3);
        assert!((stats.weighted_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_bullets_rate_is_zero() {
        let classifier = QuantificationClassifier::new().unwrap();
        let stats = classifier.stats(Vec::<&str>::new());
        assert_eq!(stats.weighted_rate, 0.0);
    }
}
