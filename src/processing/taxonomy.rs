//! Role taxonomy: typical keywords and expectations per role and experience level

use crate::error::{Result, ScorerError};
use crate::processing::keyword_extractor::KeywordSet;
use crate::processing::synonyms::SynonymTable;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Lead,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 4] = [
        ExperienceLevel::Entry,
        ExperienceLevel::Mid,
        ExperienceLevel::Senior,
        ExperienceLevel::Lead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "entry",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Lead => "lead",
        }
    }
}

impl FromStr for ExperienceLevel {
    type Err = ScorerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "entry" | "junior" | "jr" | "graduate" | "intern" => Ok(ExperienceLevel::Entry),
            "mid" | "middle" | "intermediate" => Ok(ExperienceLevel::Mid),
            "senior" | "sr" => Ok(ExperienceLevel::Senior),
            "lead" | "staff" | "principal" | "executive" | "manager" => Ok(ExperienceLevel::Lead),
            other => Err(ScorerError::UnknownLevel(other.to_string())),
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a resume for one role at one level is typically expected to show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelProfile {
    pub level: ExperienceLevel,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub preferred: Vec<String>,
    #[serde(default)]
    pub action_verbs: Vec<String>,
    #[serde(default)]
    pub expected_metrics: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleProfile {
    pub id: String,
    pub name: String,
    #[serde(rename = "level", default)]
    pub levels: Vec<LevelProfile>,
}

/// Result of a (role, level) lookup.
#[derive(Debug, Clone)]
pub struct TaxonomyEntry {
    pub role_id: String,
    pub role_name: String,
    pub level: ExperienceLevel,
    pub profile: LevelProfile,
}

impl TaxonomyEntry {
    pub fn keyword_set(&self, synonyms: &SynonymTable) -> KeywordSet {
        KeywordSet::new(
            self.profile.required.iter().cloned(),
            self.profile.preferred.iter().cloned(),
            synonyms,
        )
    }
}

#[derive(Debug, Clone)]
pub struct RoleTaxonomy {
    roles: BTreeMap<String, RoleProfile>,
}

#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    #[serde(rename = "role", default)]
    roles: Vec<RoleProfile>,
}

/// Normalize a role identifier: trimmed, lowercase, spaces as underscores.
pub fn normalize_role_id(role: &str) -> Result<String> {
    let id = role.trim().to_lowercase().replace([' ', '-'], "_");
    if id.is_empty() {
        return Err(ScorerError::InvalidInput("role must not be empty".to_string()));
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ScorerError::InvalidInput(format!(
            "role '{}' contains characters other than letters, digits, '_' or '-'",
            role
        )));
    }
    Ok(id)
}

impl RoleTaxonomy {
    pub fn from_roles(roles: Vec<RoleProfile>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for mut role in roles {
            role.id = normalize_role_id(&role.id)
                .map_err(|e| ScorerError::ReferenceData(e.to_string()))?;
            if role.levels.is_empty() {
                return Err(ScorerError::ReferenceData(format!(
                    "role '{}' defines no levels",
                    role.id
                )));
            }
            if map.contains_key(&role.id) {
                return Err(ScorerError::ReferenceData(format!("duplicate role '{}'", role.id)));
            }
            map.insert(role.id.clone(), role);
        }
        Ok(Self { roles: map })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TaxonomyFile = toml::from_str(content)
            .map_err(|e| ScorerError::ReferenceData(format!("Failed to parse role taxonomy: {}", e)))?;
        Self::from_roles(file.roles)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading role taxonomy {}", path.display()))
            .map_err(|e| ScorerError::ReferenceData(format!("{:#}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Look up (role, level). A role without a profile for the requested level falls
    /// back to its `mid` profile, then to its first one.
    pub fn lookup(&self, role: &str, level: ExperienceLevel) -> Result<TaxonomyEntry> {
        let id = normalize_role_id(role)?;
        let profile = self
            .roles
            .get(&id)
            .ok_or_else(|| ScorerError::UnknownRole(id.clone()))?;

        let level_profile = profile
            .levels
            .iter()
            .find(|l| l.level == level)
            .or_else(|| profile.levels.iter().find(|l| l.level == ExperienceLevel::Mid))
            .or_else(|| profile.levels.first())
            .ok_or_else(|| ScorerError::ReferenceData(format!("role '{}' has no levels", id)))?;

        Ok(TaxonomyEntry {
            role_id: id,
            role_name: profile.name.clone(),
            level,
            profile: level_profile.clone(),
        })
    }

    pub fn contains(&self, role: &str) -> bool {
        normalize_role_id(role)
            .map(|id| self.roles.contains_key(&id))
            .unwrap_or(false)
    }

    pub fn roles(&self) -> impl Iterator<Item = &RoleProfile> {
        self.roles.values()
    }

    pub fn builtin() -> Result<Self> {
        let roles = BUILTIN_ROLES.iter().map(RoleSeed::expand).collect();
        Self::from_roles(roles)
    }
}

/// Compact description of a built-in role; expanded into one profile per level.
struct RoleSeed {
    id: &'static str,
    name: &'static str,
    core: &'static [&'static str],
    preferred: &'static [&'static str],
    senior: &'static [&'static str],
    lead: &'static [&'static str],
    verbs: &'static [&'static str],
}

impl RoleSeed {
    fn expand(&self) -> RoleProfile {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let split = self.core.len().min(4);

        let levels = ExperienceLevel::ALL
            .iter()
            .map(|&level| {
                let (required, mut preferred) = match level {
                    ExperienceLevel::Entry => (owned(&self.core[..split]), owned(&self.core[split..])),
                    ExperienceLevel::Mid => (owned(self.core), Vec::new()),
                    ExperienceLevel::Senior => {
                        let mut req = owned(self.core);
                        req.extend(owned(self.senior));
                        (req, Vec::new())
                    }
                    ExperienceLevel::Lead => {
                        let mut req = owned(self.core);
                        req.extend(owned(self.senior));
                        req.extend(owned(self.lead));
                        (req, Vec::new())
                    }
                };
                preferred.extend(owned(self.preferred));
                if level < ExperienceLevel::Senior {
                    preferred.extend(owned(self.senior));
                }
                let expected_metrics = match level {
                    ExperienceLevel::Entry => 2,
                    ExperienceLevel::Mid => 3,
                    ExperienceLevel::Senior => 5,
                    ExperienceLevel::Lead => 6,
                };
                LevelProfile {
                    level,
                    required,
                    preferred,
                    action_verbs: owned(self.verbs),
                    expected_metrics,
                }
            })
            .collect();

        RoleProfile {
            id: self.id.to_string(),
            name: self.name.to_string(),
            levels,
        }
    }
}

const BUILTIN_ROLES: &[RoleSeed] = &[
    RoleSeed {
        id: "general",
        name: "General Professional",
        core: &["Communication", "Collaboration", "Problem Solving", "Project Management"],
        preferred: &["Leadership", "Time Management", "Excel", "Stakeholder Management"],
        senior: &["Mentoring"],
        lead: &["Budgeting"],
        verbs: &["led", "managed", "delivered", "improved", "coordinated"],
    },
    RoleSeed {
        id: "software_engineer",
        name: "Software Engineer",
        core: &["Python", "JavaScript", "SQL", "Git", "REST APIs", "Unit Testing"],
        preferred: &["Docker", "AWS", "CI/CD", "Agile", "TypeScript", "Kubernetes"],
        senior: &["System Design", "Distributed Systems", "Mentoring"],
        lead: &["Leadership", "Stakeholder Management"],
        verbs: &["built", "developed", "implemented", "architected", "optimized", "shipped"],
    },
    RoleSeed {
        id: "frontend_engineer",
        name: "Frontend Engineer",
        core: &["JavaScript", "TypeScript", "React", "HTML", "CSS", "Unit Testing"],
        preferred: &["Next.js", "Redux", "Accessibility", "Figma", "GraphQL", "Jest"],
        senior: &["Performance Optimization", "System Design", "Mentoring"],
        lead: &["Leadership", "Stakeholder Management"],
        verbs: &["built", "designed", "implemented", "optimized", "launched"],
    },
    RoleSeed {
        id: "data_scientist",
        name: "Data Scientist",
        core: &["Python", "SQL", "Machine Learning", "Statistics", "Pandas", "Data Visualization"],
        preferred: &["scikit-learn", "PyTorch", "TensorFlow", "A/B Testing", "Apache Spark", "Deep Learning"],
        senior: &["Experimentation Design", "Stakeholder Management", "Mentoring"],
        lead: &["Leadership", "Roadmap Planning"],
        verbs: &["modeled", "analyzed", "developed", "deployed", "discovered", "forecasted"],
    },
    RoleSeed {
        id: "data_analyst",
        name: "Data Analyst",
        core: &["SQL", "Excel", "Data Analysis", "Data Visualization", "Tableau", "Statistics"],
        preferred: &["Python", "Power BI", "Looker", "A/B Testing", "ETL", "KPIs"],
        senior: &["Stakeholder Management", "Business Intelligence"],
        lead: &["Leadership", "Mentoring"],
        verbs: &["analyzed", "reported", "identified", "automated", "visualized"],
    },
    RoleSeed {
        id: "devops_engineer",
        name: "DevOps Engineer",
        core: &["Linux", "Docker", "Kubernetes", "CI/CD", "AWS", "Terraform"],
        preferred: &["Bash", "Python", "Prometheus", "Grafana", "Ansible", "Go"],
        senior: &["Site Reliability", "Observability", "Distributed Systems"],
        lead: &["Leadership", "Mentoring"],
        verbs: &["automated", "migrated", "deployed", "scaled", "reduced", "hardened"],
    },
    RoleSeed {
        id: "product_manager",
        name: "Product Manager",
        core: &["Product Management", "Roadmap Planning", "Stakeholder Management", "User Research", "KPIs"],
        preferred: &["Agile", "SQL", "A/B Testing", "Jira", "Go-to-Market", "Product Analytics"],
        senior: &["Leadership", "Budgeting"],
        lead: &["Mentoring", "Decision Making"],
        verbs: &["launched", "led", "defined", "prioritized", "drove", "grew"],
    },
];
