//! Codenarrator - documentation generator and refactoring advisor.
//!
//! Codenarrator reads Python, Java and JavaScript source text, extracts a
//! language-agnostic model of its declarations, renders that model as
//! markdown and runs a battery of rule-based checks that produce
//! line-attributed refactoring suggestions.
//!
//! # Architecture
//!
//! - `extract`: per-language extractors producing the entity model
//! - `render`: markdown rendering of the entity model
//! - `diagnose`: analyzer batteries producing diagnostics
//! - `cache`: bounded, expiring store for uploaded and generated files
//! - `service`: request handling that ties the pieces to a cache
//! - `config`, `report`, `cli`: the command-line application
//!
//! Analysis is a pure function of its input: the same text always
//! produces the same model, document and suggestions.

pub mod cache;
pub mod cli;
pub mod config;
pub mod diagnose;
pub mod error;
pub mod extract;
pub mod language;
pub mod model;
pub mod render;
pub mod report;
pub mod service;

pub use cache::{CacheStats, CachedFile, FileCache, FileKind, FileSummary};
pub use config::Config;
pub use diagnose::{Category, Diagnostic};
pub use error::{Error, Result, SyntaxError};
pub use extract::{for_language, Extractor};
pub use language::Language;
pub use model::{Extraction, SourceModule};
pub use render::render_markdown;
pub use service::{DocumentOutcome, Narrator, SuggestOutcome};

/// Extract the entity model of `text`.
pub fn extract(language: Language, text: &str) -> Result<Extraction> {
    let extraction = extract::for_language(language).extract(text)?;
    match extraction.module() {
        Some(module) => tracing::debug!(
            %language,
            types = module.types.len(),
            functions = module.functions.len(),
            "extracted module"
        ),
        None => tracing::debug!(%language, "source did not parse"),
    }
    Ok(extraction)
}

/// Extract `text` and render it as a markdown document.
pub fn generate_docs(language: Language, text: &str) -> Result<String> {
    let extraction = extract(language, text)?;
    Ok(render_markdown(&extraction))
}

/// Run the diagnostics battery of `language` over `text`.
pub fn analyze(language: Language, text: &str) -> Vec<Diagnostic> {
    diagnose::analyze(language, text)
}

/// Diagnostics as `"{emoji} Line {n}: {message}"` strings.
pub fn suggest(language: Language, text: &str) -> Vec<String> {
    diagnose::suggestions(language, text)
}
