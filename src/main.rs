//! ATS scorer: rule-based resume scoring against a job description or role profile

use ats_scorer::cli::{self, Cli, Commands, ConfigAction};
use ats_scorer::config::{Config, OutputFormat};
use ats_scorer::error::{Result, ScorerError};
use ats_scorer::input::InputManager;
use ats_scorer::output::formatter::{save_report_to_file, suggest_filename, ReportGenerator};
use ats_scorer::processing::analyzer::{ScoreRequest, ScoringEngine};
use ats_scorer::processing::document::YearMonth;
use ats_scorer::processing::taxonomy::ExperienceLevel;
use clap::Parser;
use log::{error, info};
use std::path::Path;
use std::process;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Load configuration
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    // Execute command
    if let Err(e) = run_command(cli.command, config, cli.config.as_deref()).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Score {
            resume,
            job,
            role,
            level,
            as_of,
            detailed,
            output,
            save,
        } => {
            info!("Starting resume scoring");

            // Validate input files
            cli::validate_file_extension(&resume, &["json"])
                .map_err(|e| ScorerError::InvalidInput(format!("Resume file: {}", e)))?;
            if let Some(job) = &job {
                cli::validate_file_extension(job, &["txt", "md", "markdown"])
                    .map_err(|e| ScorerError::InvalidInput(format!("Job description file: {}", e)))?;
            }

            // Parse output format
            let output_format = match &output {
                Some(format) => cli::parse_output_format(format).map_err(ScorerError::InvalidInput)?,
                None => config.output.format,
            };

            // Wall-clock time is only read here; scoring itself takes the month explicitly
            let as_of = match as_of {
                Some(month) => month.parse::<YearMonth>()?,
                None => YearMonth::from_date(chrono::Local::now().date_naive()),
            };

            let mut input_manager = InputManager::new();
            let resume_doc = input_manager.load_resume(&resume).await?;
            let job_text = match &job {
                Some(path) => Some(input_manager.extract_text(path).await?),
                None => None,
            };

            if output_format == OutputFormat::Console {
                println!("🚀 ATS resume scoring");
                println!("📄 Resume: {}", resume.display());
                match &job {
                    Some(path) => println!("💼 Job Description: {}", path.display()),
                    None => println!("🧭 No job description: scoring against the {} profile", role),
                }
            }

            let engine = ScoringEngine::new(&config)?;
            let mut request = ScoreRequest::new(resume_doc, &role, &level, as_of);
            if let Some(text) = job_text {
                request = request.with_job_description(text);
            }
            let report = engine.score(&request)?;

            let generator = ReportGenerator::with_options(
                config.output.color_output,
                detailed || config.output.detailed,
                true,
                true,
            );
            let rendered = generator.generate_report(&report, &output_format)?;
            println!("{}", rendered);

            if let Some(mut path) = save {
                if path.is_dir() {
                    path = path.join(suggest_filename(&output_format, &resume.to_string_lossy(), true));
                }
                // Files never carry terminal colour codes
                let plain = ReportGenerator::with_options(false, detailed || config.output.detailed, true, true)
                    .generate_report(&report, &output_format)?;
                save_report_to_file(&plain, &path)?;
                println!("💾 Report saved to {}", path.display());
            }
        }

        Commands::Keywords { job } => {
            cli::validate_file_extension(&job, &["txt", "md", "markdown"])
                .map_err(|e| ScorerError::InvalidInput(format!("Job description file: {}", e)))?;

            let mut input_manager = InputManager::new();
            let text = input_manager.extract_text(&job).await?;
            let engine = ScoringEngine::new(&config)?;
            let extracted = engine.extractor().extract(&text);

            if !extracted.is_usable() {
                println!("⚠️  No keywords found; scoring would fall back to quality coach mode");
                return Ok(());
            }

            println!("🔍 Keywords extracted from {}\n", job.display());
            println!("Required ({}):", extracted.keywords.required.len());
            for keyword in &extracted.keywords.required {
                println!("  • {}", keyword);
            }
            println!("\nPreferred ({}):", extracted.keywords.preferred.len());
            for keyword in &extracted.keywords.preferred {
                println!("  • {}", keyword);
            }
            println!("\nDetails:");
            for detail in &extracted.details {
                println!(
                    "  {:<28} {:?}, {} occurrence(s), rule {:?}",
                    detail.keyword, detail.kind, detail.occurrences, detail.rule
                );
            }
        }

        Commands::Taxonomy => {
            let engine = ScoringEngine::new(&config)?;
            println!("🧭 Roles\n");
            for role in engine.taxonomy().roles() {
                println!("  {:<20} {}", role.id, role.name);
            }
            let levels: Vec<&str> = ExperienceLevel::ALL.iter().map(|l| l.as_str()).collect();
            println!("\nLevels: {}", levels.join(", "));
        }

        Commands::Config { action } => {
            let path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(Config::config_path);
            match action {
                Some(ConfigAction::Show) | None => {
                    println!("⚙️  Current Configuration\n");
                    let content = toml::to_string_pretty(&config)
                        .map_err(|e| ScorerError::Configuration(format!("Failed to serialize config: {}", e)))?;
                    println!("{}", content);
                }

                Some(ConfigAction::Reset) => {
                    println!("🔄 Resetting configuration to defaults...");
                    Config::default().save_to(&path)?;
                    println!("✅ Configuration reset successfully!");
                }

                Some(ConfigAction::Path) => {
                    println!("{}", path.display());
                }
            }
        }
    }

    Ok(())
}
