//! Text extraction for job descriptions and loading of parsed resumes

use crate::error::{Result, ScorerError};
use crate::processing::document::ResumeDocument;
use pulldown_cmark::{Event, Parser, Tag};
use std::path::Path;
use tokio::fs;

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let content = fs::read_to_string(path).await.map_err(ScorerError::Io)?;
        Ok(content)
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let markdown_content = fs::read_to_string(path).await.map_err(ScorerError::Io)?;
        Ok(Self::flatten(&markdown_content))
    }
}

impl MarkdownExtractor {
    /// Plain text with one line per block. List items keep a "- " marker and headings
    /// stay on their own line so section detection still sees them.
    pub fn flatten(markdown: &str) -> String {
        let mut text = String::new();
        for event in Parser::new(markdown) {
            match event {
                Event::Start(Tag::Item) => {
                    end_line(&mut text);
                    text.push_str("- ");
                }
                Event::End(Tag::Paragraph | Tag::Heading(..) | Tag::Item | Tag::CodeBlock(_)) => {
                    end_line(&mut text);
                }
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                Event::SoftBreak => text.push(' '),
                Event::HardBreak => text.push('\n'),
                _ => {}
            }
        }

        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && *line != "-")
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn end_line(text: &mut String) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
}

/// Reads the JSON `ResumeDocument` produced by the external parser.
pub struct ResumeLoader;

impl ResumeLoader {
    pub async fn load(&self, path: &Path) -> Result<ResumeDocument> {
        let content = fs::read_to_string(path).await.map_err(ScorerError::Io)?;
        Self::parse(&content)
            .map_err(|e| ScorerError::InvalidInput(format!("Resume '{}': {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> Result<ResumeDocument> {
        serde_json::from_str(content)
            .map_err(|e| ScorerError::InvalidInput(format!("not a valid resume document: {}", e)))
    }
}
