//! Rule-based diagnostics for source files.
//!
//! Each language runs a fixed battery of analyzers over the raw text:
//! code smells, naming conventions, security/performance, spelling and
//! best practices. Python replaces best practices with a pass over its
//! syntax tree. Every diagnostic points at the 1-based physical line of
//! the token that triggered it.

mod common;
mod java;
mod javascript;
mod python;
mod runner;
mod spelling;
mod types;

pub use runner::Source;
pub use types::{Category, Diagnostic};

use crate::language::Language;

/// Run the analyzer battery of `language` over `text`.
pub fn analyze(language: Language, text: &str) -> Vec<Diagnostic> {
    let source = Source::new(text);
    let diagnostics = match language {
        Language::Python => python::analyze(&source),
        Language::Java => java::analyze(&source),
        Language::JavaScript => javascript::analyze(&source),
    };
    tracing::debug!(
        language = %language,
        lines = source.lines.len(),
        count = diagnostics.len(),
        "diagnostics collected"
    );
    diagnostics
}

/// Diagnostics rendered as `"{emoji} Line {n}: {message}"` strings.
pub fn suggestions(language: Language, text: &str) -> Vec<String> {
    analyze(language, text)
        .iter()
        .map(|d| d.to_string())
        .collect()
}
