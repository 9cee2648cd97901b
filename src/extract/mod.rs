//! Per-language extraction of the entity model from raw source text.
//!
//! Python is walked as a tree-sitter syntax tree. Java and JavaScript are
//! scanned with regex headers and the balanced-brace primitives in
//! [`scan`].

pub mod java;
pub mod javascript;
pub mod python;
pub mod scan;

use crate::error::Result;
use crate::language::Language;
use crate::model::Extraction;

pub use java::JavaExtractor;
pub use javascript::JavaScriptExtractor;
pub use python::{PythonExtractor, PythonTree};

/// Turns source text into an [`Extraction`].
///
/// Implementations are stateless; one instance may serve any number of
/// concurrent calls.
pub trait Extractor: Send + Sync {
    /// Language this extractor handles.
    fn language(&self) -> Language;

    /// Extract the entity model from `source`.
    ///
    /// Malformed input never produces an error: Java and JavaScript yield
    /// partial models and Python yields [`Extraction::SyntaxError`]. An
    /// error means the extractor itself could not run (e.g. the grammar
    /// failed to load).
    fn extract(&self, source: &str) -> Result<Extraction>;
}

/// Get the extractor for `language`.
pub fn for_language(language: Language) -> Box<dyn Extractor> {
    match language {
        Language::Python => Box::new(PythonExtractor),
        Language::Java => Box::new(JavaExtractor),
        Language::JavaScript => Box::new(JavaScriptExtractor),
    }
}
