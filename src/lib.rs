pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod processing;

pub use config::Config;
pub use error::{Result, ScorerError};
pub use processing::analyzer::{ScoreRequest, ScoringEngine};
pub use processing::cache::CachedScorer;
