//! Text processing and scoring module

pub mod document;
pub mod text_processor;
pub mod synonyms;
pub mod taxonomy;
pub mod keyword_extractor;
pub mod action_verbs;
pub mod quantification;
pub mod ats_matcher;
pub mod format_checker;
pub mod red_flags;
pub mod polish;
pub mod analyzer;
pub mod cache;
