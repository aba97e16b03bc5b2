//! Action-verb tier classification for experience bullets

use crate::error::Result;
use crate::processing::document::strip_bullet_marker;
use crate::processing::text_processor::{normalize_term, PhraseIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Ordinal verb quality; the discriminant is the point value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbTier {
    Weak = 0,
    Support = 1,
    Execution = 2,
    Leadership = 3,
    Transformational = 4,
}

impl VerbTier {
    pub const ALL: [VerbTier; 5] = [
        VerbTier::Weak,
        VerbTier::Support,
        VerbTier::Execution,
        VerbTier::Leadership,
        VerbTier::Transformational,
    ];

    pub fn points(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            VerbTier::Weak => "Weak",
            VerbTier::Support => "Support",
            VerbTier::Execution => "Execution",
            VerbTier::Leadership => "Leadership",
            VerbTier::Transformational => "Transformational",
        }
    }
}

impl fmt::Display for VerbTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.points())
    }
}

/// Result of classifying one bullet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbClassification {
    pub tier: VerbTier,
    /// Dictionary form of the matched verb, or the weak phrase that matched.
    pub matched: String,
}

/// Aggregate tier statistics over a set of bullets. Unclassified bullets count toward
/// `total` only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerbStats {
    pub total: usize,
    pub classified: usize,
    /// Bullet count per tier, indexed by tier points.
    pub tier_counts: [usize; 5],
    pub coverage_pct: f64,
    pub average_tier: f64,
}

impl VerbStats {
    pub fn weak_count(&self) -> usize {
        self.tier_counts[VerbTier::Weak as usize]
    }

    pub fn unclassified(&self) -> usize {
        self.total - self.classified
    }
}

const TRANSFORMATIONAL: &[&str] = &[
    "pioneer", "revolutionize", "scale", "founded", "cofounded", "transform", "launch", "establish",
    "create", "invent", "reinvent", "overhaul", "redefine", "institute", "originate",
    "grew", "grow",
];

const LEADERSHIP: &[&str] = &[
    "led", "lead", "architect", "spearhead", "drove", "drive", "direct", "orchestrate",
    "champion", "head", "oversaw", "oversee", "mentor", "manage", "own", "steer",
    "negotiate", "influence", "define", "design", "strategize", "mobilize", "recruit",
    "hire", "chair", "govern",
];

const EXECUTION: &[&str] = &[
    "develop", "implement", "built", "build", "optimize", "engineer", "deliver", "deploy",
    "automate", "program", "code", "ship", "integrate", "migrate", "refactor", "analyze",
    "research", "test", "debug", "resolve", "improve", "increase", "reduce", "streamline",
    "configure", "produce", "write", "wrote", "publish", "execute", "accelerate", "achieve",
    "complete", "model", "prototype", "secure", "upgrade", "modernize", "consolidate",
    "cut", "save", "generate", "win", "won", "sold", "sell", "present", "train", "taught",
    "teach", "conduct", "evaluate", "audit", "forecast", "instrument", "containerize",
];

const SUPPORT: &[&str] = &[
    "maintain", "coordinate", "support", "assist", "help", "monitor", "document", "update",
    "organize", "prepare", "track", "schedule", "review", "compile", "handle", "process",
    "respond", "answer", "file", "record", "attend", "shadow", "observe", "collaborate",
    "communicate", "participate", "contribute", "gather", "use", "utilize", "serve",
];

const WEAK_PHRASES: &[&str] = &[
    "responsible for", "worked on", "helped with", "helped to", "assisted in",
    "assisted with", "participated in", "involved in", "tasked with", "duties included",
    "in charge of", "was part of", "worked with", "handled various", "dealt with",
];

/// Dictionary verbs that are just as often nouns ("code review", "test plan").
/// They only count as the opening word and never ahead of another such word.
const NOUN_LIKE: &[&str] = &[
    "code", "test", "model", "file", "record", "process", "design", "support", "review",
    "document", "program", "schedule", "research", "update", "audit", "forecast", "head",
    "chair", "instrument", "track", "monitor", "present", "prototype", "use",
];

/// Classifies bullets by the tier of their opening verb. Weak phrases win over any verb.
pub struct ActionVerbClassifier {
    verbs: HashMap<String, VerbTier>,
    weak_phrases: Vec<String>,
    weak_index: PhraseIndex,
}

impl ActionVerbClassifier {
    /// Built-in verb dictionaries and weak-phrase list.
    pub fn new() -> Result<Self> {
        let tiers = [
            (VerbTier::Transformational, TRANSFORMATIONAL),
            (VerbTier::Leadership, LEADERSHIP),
            (VerbTier::Execution, EXECUTION),
            (VerbTier::Support, SUPPORT),
        ];
        let verbs = tiers
            .iter()
            .flat_map(|(tier, words)| words.iter().map(move |w| (w.to_string(), *tier)));
        Self::with_vocabulary(verbs, WEAK_PHRASES.iter().map(|p| p.to_string()))
    }

    /// Custom vocabulary. A verb listed under two tiers keeps the first tier seen.
    pub fn with_vocabulary<V, W>(verbs: V, weak_phrases: W) -> Result<Self>
    where
        V: IntoIterator<Item = (String, VerbTier)>,
        W: IntoIterator<Item = String>,
    {
        let mut map = HashMap::new();
        for (verb, tier) in verbs {
            map.entry(normalize_term(&verb)).or_insert(tier);
        }
        let weak_phrases: Vec<String> = weak_phrases.into_iter().map(|p| normalize_term(&p)).collect();
        let weak_index = PhraseIndex::new(
            weak_phrases
                .iter()
                .enumerate()
                .map(|(id, phrase)| (phrase.as_str(), id)),
        )?;

        Ok(Self {
            verbs: map,
            weak_phrases,
            weak_index,
        })
    }

    /// Tier of a bullet, or `None` when no verb is detected.
    pub fn classify_bullet(&self, text: &str) -> Option<VerbClassification> {
        let normalized = normalize_term(strip_bullet_marker(text));
        if normalized.is_empty() {
            return None;
        }

        // 1. Weak phrasing anywhere overrides the verb
        if let Some(&id) = self.weak_index.occurrences(&normalized).first() {
            return Some(VerbClassification {
                tier: VerbTier::Weak,
                matched: self.weak_phrases[id].clone(),
            });
        }

        // 2. Leading word, then the first three words
        let words: Vec<&str> = normalized.split(' ').take(3).collect();
        for (position, word) in words.iter().enumerate() {
            let Some(base) = self.lookup_form(word) else {
                continue;
            };
            if is_noun_like(base) {
                let compound = words
                    .get(position + 1)
                    .and_then(|next| self.lookup_form(next))
                    .is_some_and(is_noun_like);
                if position > 0 || compound {
                    continue;
                }
            }
            return Some(VerbClassification {
                tier: self.verbs[base],
                matched: base.to_string(),
            });
        }
        None
    }

    /// Dictionary form of the bullet's opening verb, used for repetition checks.
    pub fn leading_verb(&self, text: &str) -> Option<String> {
        match self.classify_bullet(text) {
            Some(c) if c.tier != VerbTier::Weak => Some(c.matched),
            _ => None,
        }
    }

    /// Weak-phrase occurrences across a block of text.
    pub fn count_weak_phrases(&self, text: &str) -> usize {
        self.weak_index.occurrences(&normalize_term(text)).len()
    }

    pub fn stats<'a, I>(&self, bullets: I) -> VerbStats
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut stats = VerbStats::default();
        let mut points = 0usize;
        for bullet in bullets {
            stats.total += 1;
            if let Some(c) = self.classify_bullet(bullet) {
                stats.classified += 1;
                stats.tier_counts[c.tier as usize] += 1;
                points += c.tier.points() as usize;
            }
        }
        if stats.total > 0 {
            stats.coverage_pct = stats.classified as f64 / stats.total as f64 * 100.0;
        }
        if stats.classified > 0 {
            stats.average_tier = points as f64 / stats.classified as f64;
        }
        stats
    }

    /// Dictionary key for a word after past-tense and third-person suffix stripping.
    fn lookup_form<'a>(&'a self, word: &'a str) -> Option<&'a str> {
        if let Some((key, _)) = self.verbs.get_key_value(word) {
            return Some(key.as_str());
        }
        suffix_variants(word)
            .into_iter()
            .find_map(|candidate| self.verbs.get_key_value(&candidate).map(|(k, _)| k.as_str()))
    }
}

fn is_noun_like(base: &str) -> bool {
    NOUN_LIKE.contains(&base)
}

/// Base-form guesses: "optimized" → "optimize", "deployed" → "deploy", "shipped" → "ship",
/// "unified" → "unify", "builds" → "build".
fn suffix_variants(word: &str) -> Vec<String> {
    let mut variants = Vec::new();
    if let Some(stem) = word.strip_suffix("ied") {
        variants.push(format!("{}y", stem));
    }
    if let Some(stem) = word.strip_suffix("ed") {
        variants.push(stem.to_string());
        let chars: Vec<char> = stem.chars().collect();
        if chars.len() >= 2 && chars[chars.len() - 1] == chars[chars.len() - 2] {
            variants.push(chars[..chars.len() - 1].iter().collect());
        }
    }
    if let Some(stem) = word.strip_suffix('d') {
        variants.push(stem.to_string());
    }
    if let Some(stem) = word.strip_suffix("es") {
        variants.push(stem.to_string());
    }
    if let Some(stem) = word.strip_suffix('s') {
        variants.push(stem.to_string());
    }
    variants
}
