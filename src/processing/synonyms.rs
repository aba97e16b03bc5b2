//! Synonym resolution for keywords, skills and role titles

use crate::error::{Result, ScorerError};
use crate::processing::text_processor::normalize_term;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermCategory {
    Technology,
    SoftSkill,
    Industry,
    Certification,
    Role,
}

/// One canonical term and every spelling that means the same thing.
#[derive(Debug, Clone)]
pub struct SynonymGroup {
    pub canonical: String,
    pub category: TermCategory,
    /// Surface spellings as written in the table, canonical first.
    pub spellings: Vec<String>,
    /// Normalized forms, canonical included.
    pub forms: BTreeSet<String>,
}

/// Immutable canonical → synonyms table with symmetric lookup.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    groups: Vec<SynonymGroup>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Deserialize)]
struct SynonymFile {
    #[serde(rename = "entry", default)]
    entries: Vec<SynonymFileEntry>,
}

#[derive(Debug, Deserialize)]
struct SynonymFileEntry {
    canonical: String,
    category: TermCategory,
    #[serde(default)]
    synonyms: Vec<String>,
}

impl SynonymTable {
    /// Build and validate a table. A normalized form may belong to one group only.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (TermCategory, String, Vec<String>)>,
    {
        let mut groups: Vec<SynonymGroup> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (category, canonical, synonyms) in entries {
            let canonical = canonical.trim().to_string();
            if normalize_term(&canonical).is_empty() {
                return Err(ScorerError::ReferenceData(
                    "synonym entry with empty canonical term".to_string(),
                ));
            }

            let group_id = groups.len();
            let mut spellings = vec![canonical.clone()];
            let mut forms = BTreeSet::new();
            for spelling in std::iter::once(canonical.as_str()).chain(synonyms.iter().map(|s| s.as_str())) {
                let form = normalize_term(spelling);
                if form.is_empty() {
                    continue;
                }
                if let Some(&existing) = index.get(&form) {
                    if existing != group_id {
                        return Err(ScorerError::ReferenceData(format!(
                            "'{}' maps to both '{}' and '{}'",
                            spelling, groups[existing].canonical, canonical
                        )));
                    }
                    continue;
                }
                index.insert(form.clone(), group_id);
                forms.insert(form);
                if spelling != canonical {
                    spellings.push(spelling.to_string());
                }
            }

            groups.push(SynonymGroup {
                canonical,
                category,
                spellings,
                forms,
            });
        }

        Ok(Self { groups, index })
    }

    /// Built-in reference table.
    pub fn builtin() -> Result<Self> {
        Self::from_entries(BUILTIN_SYNONYMS.iter().map(|(category, canonical, synonyms)| {
            (
                *category,
                canonical.to_string(),
                synonyms.iter().map(|s| s.to_string()).collect(),
            )
        }))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: SynonymFile = toml::from_str(content)
            .map_err(|e| ScorerError::ReferenceData(format!("Failed to parse synonym table: {}", e)))?;
        Self::from_entries(
            file.entries
                .into_iter()
                .map(|e| (e.category, e.canonical, e.synonyms)),
        )
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading synonym table {}", path.display()))
            .map_err(|e| ScorerError::ReferenceData(format!("{:#}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Every equivalent normalized form of `keyword`, the keyword itself included.
    /// Unknown keywords resolve to themselves.
    pub fn resolve(&self, keyword: &str) -> BTreeSet<String> {
        let form = normalize_term(keyword);
        match self.index.get(&form) {
            Some(&id) => self.groups[id].forms.clone(),
            None => {
                let mut set = BTreeSet::new();
                if !form.is_empty() {
                    set.insert(form);
                }
                set
            }
        }
    }

    pub fn group(&self, keyword: &str) -> Option<&SynonymGroup> {
        self.index
            .get(&normalize_term(keyword))
            .map(|&id| &self.groups[id])
    }

    /// Display form: the table's canonical spelling, or the keyword as given.
    pub fn canonical(&self, keyword: &str) -> String {
        self.group(keyword)
            .map(|g| g.canonical.clone())
            .unwrap_or_else(|| keyword.trim().to_string())
    }

    /// Deduplication key: two keywords share a key iff they are synonyms.
    pub fn key(&self, keyword: &str) -> String {
        match self.group(keyword) {
            Some(g) => normalize_term(&g.canonical),
            None => normalize_term(keyword),
        }
    }

    pub fn groups(&self) -> &[SynonymGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

use TermCategory::{Certification as Cert, Industry as Ind, Role, SoftSkill as Soft, Technology as Tech};

const BUILTIN_SYNONYMS: &[(TermCategory, &str, &[&str])] = &[
    // Languages
    (Tech, "JavaScript", &["js", "ecmascript", "es6"]),
    (Tech, "TypeScript", &[]),
    (Tech, "Python", &["python3"]),
    (Tech, "Java", &["j2ee", "java ee"]),
    (Tech, "C++", &["cpp"]),
    (Tech, "C#", &["csharp", "c sharp"]),
    (Tech, "Go", &["golang"]),
    (Tech, "Rust", &["rustlang"]),
    (Tech, "Ruby", &[]),
    (Tech, "PHP", &[]),
    (Tech, "Swift", &[]),
    (Tech, "Kotlin", &[]),
    (Tech, "Scala", &[]),
    (Tech, "R", &["r language", "rstats"]),
    (Tech, "SQL", &["structured query language", "t-sql", "pl/sql"]),
    (Tech, "Bash", &["shell scripting", "shell"]),
    (Tech, "HTML", &["html5"]),
    (Tech, "CSS", &["css3"]),
    (Tech, "Objective-C", &["objc"]),
    (Tech, "MATLAB", &[]),
    // Frameworks and libraries
    (Tech, "React", &["reactjs", "react js"]),
    (Tech, "Angular", &["angularjs", "angular js"]),
    (Tech, "Vue", &["vuejs", "vue js"]),
    (Tech, "Svelte", &["sveltekit"]),
    (Tech, "Next.js", &["nextjs", "next js"]),
    (Tech, "Node.js", &["node", "node js"]),
    (Tech, "Express", &["expressjs", "express js"]),
    (Tech, "Django", &[]),
    (Tech, "Flask", &[]),
    (Tech, "FastAPI", &["fast api"]),
    (Tech, "Spring Boot", &["spring", "spring framework"]),
    (Tech, "Ruby on Rails", &["rails", "ror"]),
    (Tech, ".NET", &["dotnet", "asp.net", "net core"]),
    (Tech, "jQuery", &[]),
    (Tech, "Redux", &[]),
    (Tech, "Tailwind CSS", &["tailwind", "tailwindcss"]),
    (Tech, "GraphQL", &["graph ql"]),
    (Tech, "REST APIs", &["rest", "restful", "rest api", "restful apis", "restful services"]),
    (Tech, "gRPC", &[]),
    (Tech, "Microservices", &["microservice architecture", "micro services", "service oriented architecture", "soa"]),
    // Data and ML
    (Tech, "Machine Learning", &["ml"]),
    (Tech, "Deep Learning", &["neural networks"]),
    (Tech, "Artificial Intelligence", &["ai"]),
    (Tech, "Natural Language Processing", &["nlp"]),
    (Tech, "Computer Vision", &["cv models", "image recognition"]),
    (Tech, "TensorFlow", &["keras"]),
    (Tech, "PyTorch", &["torch"]),
    (Tech, "scikit-learn", &["sklearn", "scikit learn"]),
    (Tech, "Pandas", &[]),
    (Tech, "NumPy", &[]),
    (Tech, "Apache Spark", &["spark", "pyspark"]),
    (Tech, "Hadoop", &["hdfs", "mapreduce"]),
    (Tech, "Apache Kafka", &["kafka"]),
    (Tech, "Apache Airflow", &["airflow"]),
    (Tech, "dbt", &["data build tool"]),
    (Tech, "Snowflake", &[]),
    (Tech, "Databricks", &[]),
    (Tech, "Tableau", &[]),
    (Tech, "Power BI", &["powerbi"]),
    (Tech, "Looker", &[]),
    (Tech, "Excel", &["microsoft excel", "ms excel", "spreadsheets"]),
    (Tech, "ETL", &["extract transform load", "elt", "data pipelines", "data pipeline"]),
    (Tech, "Data Analysis", &["analytics", "data analytics"]),
    (Tech, "Data Visualization", &["data viz", "dataviz"]),
    (Tech, "Statistics", &["statistical analysis", "statistical modeling"]),
    (Tech, "A/B Testing", &["ab testing", "split testing", "experimentation"]),
    (Tech, "Large Language Models", &["llm", "llms"]),
    // Databases
    (Tech, "PostgreSQL", &["postgres", "psql"]),
    (Tech, "MySQL", &[]),
    (Tech, "MongoDB", &["mongo"]),
    (Tech, "Redis", &[]),
    (Tech, "Elasticsearch", &["elastic search", "elk"]),
    (Tech, "Cassandra", &[]),
    (Tech, "DynamoDB", &["dynamo"]),
    (Tech, "SQLite", &[]),
    (Tech, "Oracle Database", &["oracle db", "oracle"]),
    (Tech, "SQL Server", &["mssql", "microsoft sql server"]),
    (Tech, "NoSQL", &["non relational databases"]),
    // Cloud and infrastructure
    (Tech, "AWS", &["amazon web services"]),
    (Tech, "Azure", &["microsoft azure"]),
    (Tech, "GCP", &["google cloud", "google cloud platform"]),
    (Tech, "Docker", &["containers", "containerization"]),
    (Tech, "Kubernetes", &["k8s", "kube"]),
    (Tech, "Terraform", &["infrastructure as code", "iac"]),
    (Tech, "Ansible", &[]),
    (Tech, "Jenkins", &[]),
    (Tech, "GitHub Actions", &["gh actions"]),
    (Tech, "GitLab CI", &["gitlab"]),
    (Tech, "CI/CD", &["continuous integration", "continuous delivery", "continuous deployment", "cicd"]),
    (Tech, "Linux", &["unix", "ubuntu", "red hat", "rhel"]),
    (Tech, "Nginx", &[]),
    (Tech, "Serverless", &["aws lambda", "lambda functions", "cloud functions"]),
    (Tech, "Prometheus", &[]),
    (Tech, "Grafana", &[]),
    (Tech, "Datadog", &[]),
    (Tech, "Observability", &["monitoring", "logging and monitoring"]),
    (Tech, "Site Reliability", &["sre", "site reliability engineering"]),
    (Tech, "DevOps", &["dev ops"]),
    (Tech, "Cloud Computing", &["cloud infrastructure", "cloud platforms"]),
    (Tech, "Distributed Systems", &["distributed computing"]),
    (Tech, "Networking", &["tcp ip", "network protocols"]),
    (Tech, "Cybersecurity", &["information security", "infosec", "security engineering"]),
    // Tooling and practices
    (Tech, "Git", &["version control", "source control"]),
    (Tech, "GitHub", &[]),
    (Tech, "Jira", &["atlassian jira"]),
    (Tech, "Confluence", &[]),
    (Tech, "Figma", &[]),
    (Tech, "Agile", &["agile methodology", "agile methodologies"]),
    (Tech, "Scrum", &["scrum master"]),
    (Tech, "Kanban", &[]),
    (Tech, "Unit Testing", &["unit tests", "automated testing", "test automation"]),
    (Tech, "Test-Driven Development", &["tdd"]),
    (Tech, "Jest", &[]),
    (Tech, "Pytest", &[]),
    (Tech, "Selenium", &[]),
    (Tech, "Cypress", &[]),
    (Tech, "System Design", &["software architecture", "systems design"]),
    (Tech, "Object-Oriented Programming", &["oop", "object oriented design", "ood"]),
    (Tech, "Data Structures", &["algorithms", "data structures and algorithms"]),
    (Tech, "API Design", &["api development"]),
    (Tech, "Mobile Development", &["ios", "android", "mobile apps"]),
    (Tech, "Frontend Development", &["front end", "frontend", "front-end development"]),
    (Tech, "Backend Development", &["back end", "backend", "server side"]),
    (Tech, "Full Stack Development", &["full stack", "fullstack"]),
    (Tech, "SEO", &["search engine optimization"]),
    (Tech, "Salesforce", &["sfdc"]),
    (Tech, "SAP", &[]),
    (Tech, "Product Analytics", &["amplitude", "mixpanel"]),
    (Tech, "Accessibility", &["a11y", "wcag"]),
    (Tech, "Performance Optimization", &["performance tuning"]),
    // Industry and domain
    (Ind, "Product Management", &["product strategy"]),
    (Ind, "Project Management", &["program management"]),
    (Ind, "Roadmap Planning", &["product roadmap", "roadmapping"]),
    (Ind, "Stakeholder Management", &["stakeholder engagement", "cross functional collaboration", "cross-functional teams"]),
    (Ind, "User Research", &["ux research", "customer research", "customer interviews"]),
    (Ind, "User Experience", &["ux", "ux design"]),
    (Ind, "User Interface Design", &["ui", "ui design"]),
    (Ind, "Go-to-Market", &["gtm", "go to market strategy"]),
    (Ind, "KPIs", &["key performance indicators", "okrs", "metrics"]),
    (Ind, "Budgeting", &["budget management", "p&l", "financial planning"]),
    (Ind, "Financial Services", &["fintech", "banking"]),
    (Ind, "Healthcare", &["health care", "hipaa"]),
    (Ind, "E-commerce", &["ecommerce", "online retail"]),
    (Ind, "SaaS", &["software as a service"]),
    (Ind, "B2B", &["business to business"]),
    (Ind, "Compliance", &["regulatory compliance", "gdpr", "sox"]),
    (Ind, "Business Intelligence", &["bi", "reporting"]),
    (Ind, "Customer Success", &["customer support", "client success"]),
    // Soft skills
    (Soft, "Leadership", &["team leadership", "people management"]),
    (Soft, "Communication", &["communication skills", "written communication", "verbal communication"]),
    (Soft, "Collaboration", &["teamwork", "team player"]),
    (Soft, "Problem Solving", &["problem-solving", "troubleshooting", "analytical thinking"]),
    (Soft, "Mentoring", &["mentorship", "coaching"]),
    (Soft, "Critical Thinking", &[]),
    (Soft, "Time Management", &["prioritization"]),
    (Soft, "Adaptability", &["flexibility"]),
    (Soft, "Attention to Detail", &["detail oriented", "detail-oriented"]),
    (Soft, "Ownership", &["accountability"]),
    (Soft, "Presentation Skills", &["public speaking", "presentations"]),
    (Soft, "Negotiation", &[]),
    (Soft, "Decision Making", &["decision-making"]),
    // Certifications
    (Cert, "AWS Certified Solutions Architect", &["aws solutions architect", "aws csa"]),
    (Cert, "AWS Certified Developer", &[]),
    (Cert, "Certified Kubernetes Administrator", &["cka"]),
    (Cert, "PMP", &["project management professional"]),
    (Cert, "Certified ScrumMaster", &["csm"]),
    (Cert, "CISSP", &[]),
    (Cert, "CompTIA Security+", &["security plus", "comptia security"]),
    (Cert, "Google Cloud Professional", &["gcp certified", "google cloud certified"]),
    (Cert, "Azure Solutions Architect", &["az-305", "azure certified"]),
    (Cert, "CPA", &["certified public accountant"]),
    (Cert, "CFA", &["chartered financial analyst"]),
    // Role titles
    (Role, "Software Engineer", &["software developer", "swe", "developer", "programmer"]),
    (Role, "Senior Software Engineer", &["senior developer", "senior swe"]),
    (Role, "Data Scientist", &["data science"]),
    (Role, "Data Engineer", &["data engineering"]),
    (Role, "Data Analyst", &["business analyst"]),
    (Role, "Machine Learning Engineer", &["ml engineer", "mle"]),
    (Role, "DevOps Engineer", &["platform engineer", "infrastructure engineer"]),
    (Role, "Product Manager", &["pm", "product owner"]),
    (Role, "Engineering Manager", &["development manager"]),
    (Role, "Technical Lead", &["tech lead", "team lead", "lead engineer"]),
    (Role, "Solutions Architect", &["software architect", "solution architect"]),
    (Role, "QA Engineer", &["quality assurance", "qa", "test engineer", "sdet"]),
    (Role, "Designer", &["product designer", "ux designer", "ui designer"]),
];
