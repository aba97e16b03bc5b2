//! Input manager for job description text and parsed resumes

use crate::error::{Result, ScorerError};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{MarkdownExtractor, PlainTextExtractor, ResumeLoader, TextExtractor};
use crate::processing::document::ResumeDocument;
use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;

pub struct InputManager {
    cache: HashMap<String, String>,
    enable_cache: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            enable_cache: true,
        }
    }

    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    /// Read a job description from a `.txt` or `.md` file.
    pub async fn extract_text(&mut self, path: &Path) -> Result<String> {
        let path_str = path.to_string_lossy().to_string();

        // Check cache first
        if self.enable_cache {
            if let Some(cached_text) = self.cache.get(&path_str) {
                debug!("Using cached text for: {}", path.display());
                return Ok(cached_text.clone());
            }
        }

        Self::ensure_exists(path)?;

        // Route to appropriate extractor
        let text = match self.detect_file_type(path)? {
            FileType::Text => {
                info!("Reading plain text file: {}", path.display());
                PlainTextExtractor.extract(path).await?
            }
            FileType::Markdown => {
                info!("Processing markdown file: {}", path.display());
                MarkdownExtractor.extract(path).await?
            }
            FileType::Json | FileType::Unknown => {
                return Err(ScorerError::UnsupportedFormat(format!(
                    "Job descriptions must be .txt or .md: {}",
                    path.display()
                )));
            }
        };

        // Cache the result
        if self.enable_cache {
            self.cache.insert(path_str, text.clone());
        }

        Ok(text)
    }

    /// Load a parsed resume from a `.json` file.
    pub async fn load_resume(&self, path: &Path) -> Result<ResumeDocument> {
        Self::ensure_exists(path)?;
        match self.detect_file_type(path)? {
            FileType::Json => {
                info!("Loading parsed resume: {}", path.display());
                ResumeLoader.load(path).await
            }
            _ => Err(ScorerError::UnsupportedFormat(format!(
                "Resumes are read as parsed JSON documents: {}",
                path.display()
            ))),
        }
    }

    fn ensure_exists(path: &Path) -> Result<()> {
        if path.exists() {
            Ok(())
        } else {
            Err(ScorerError::InvalidInput(format!("File does not exist: {}", path.display())))
        }
    }

    fn detect_file_type(&self, path: &Path) -> Result<FileType> {
        FileType::from_path(path).ok_or_else(|| {
            ScorerError::InvalidInput(format!("File has no extension: {}", path.display()))
        })
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
