//! CLI interface for the ATS scorer

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ats-scorer")]
#[command(about = "Rule-based ATS resume scorer")]
#[command(long_about = "Score a parsed resume against a job description (ATS simulation) or against a role profile (quality coach)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score a resume
    Score {
        /// Path to the parsed resume (JSON)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to job description file (TXT, MD); omit for quality coach mode
        #[arg(short, long)]
        job: Option<PathBuf>,

        /// Role identifier from the taxonomy
        #[arg(long, default_value = "general")]
        role: String,

        /// Experience level: entry, mid, senior, lead
        #[arg(long, default_value = "mid")]
        level: String,

        /// Reference month for date checks (YYYY-MM); defaults to the current month
        #[arg(long)]
        as_of: Option<String>,

        /// Output detailed analysis
        #[arg(short, long)]
        detailed: bool,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Show the keywords extracted from a job description
    Keywords {
        /// Path to job description file (TXT, MD)
        #[arg(short, long)]
        job: PathBuf,
    },

    /// List roles and levels in the taxonomy
    Taxonomy,

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<crate::config::OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(crate::config::OutputFormat::Console),
        "json" => Ok(crate::config::OutputFormat::Json),
        "markdown" | "md" => Ok(crate::config::OutputFormat::Markdown),
        _ => Err(format!("Invalid output format: {}. Supported: console, json, markdown", format)),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}
