//! Request handling on top of the analysis core.
//!
//! A [`Narrator`] resolves the language from the filename, stores the
//! uploaded text in its cache, runs the extractor and renderer (or the
//! diagnostics) and stores any generated document next to it.

use serde::Serialize;
use std::path::Path;
use std::time::Instant;

use crate::cache::{FileCache, FileKind};
use crate::diagnose::Diagnostic;
use crate::error::{Error, Result};
use crate::language::Language;
use crate::model::Extraction;

/// Result of a documentation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentOutcome {
    pub filename: String,
    pub language: Language,
    pub uploaded_id: String,
    pub generated_id: String,
    /// Name the generated document was stored under (`<stem>_docs.md`).
    pub generated_filename: String,
    pub markdown: String,
    #[serde(skip)]
    pub extraction: Extraction,
}

/// Result of a suggestion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestOutcome {
    pub filename: String,
    pub language: Language,
    pub uploaded_id: String,
    pub suggestions: Vec<String>,
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Serves documentation and suggestion requests against a borrowed cache.
pub struct Narrator<'c> {
    cache: &'c FileCache,
}

impl<'c> Narrator<'c> {
    pub fn new(cache: &'c FileCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &FileCache {
        self.cache
    }

    /// Generate markdown documentation for `content`.
    pub fn document(&self, filename: &str, content: &str) -> Result<DocumentOutcome> {
        let language = resolve(filename)?;
        let started = Instant::now();
        tracing::info!(%filename, %language, "generating documentation");

        let uploaded_id = self.cache.store(filename, content, FileKind::Uploaded);
        let extraction = crate::extract(language, content)?;
        let markdown = crate::render_markdown(&extraction);

        let generated_filename = docs_filename(filename);
        let generated_id = self
            .cache
            .store(&generated_filename, &markdown, FileKind::Generated);

        tracing::info!(
            %filename,
            elapsed_ms = started.elapsed().as_millis() as u64,
            bytes = markdown.len(),
            "documentation generated"
        );

        Ok(DocumentOutcome {
            filename: filename.to_string(),
            language,
            uploaded_id,
            generated_id,
            generated_filename,
            markdown,
            extraction,
        })
    }

    /// Produce refactoring suggestions for `content`.
    pub fn suggest(&self, filename: &str, content: &str) -> Result<SuggestOutcome> {
        let language = resolve(filename)?;
        let started = Instant::now();
        tracing::info!(%filename, %language, "analyzing for suggestions");

        let uploaded_id = self.cache.store(filename, content, FileKind::Uploaded);
        let diagnostics = crate::analyze(language, content);
        let suggestions: Vec<String> = diagnostics.iter().map(|d| d.to_string()).collect();

        tracing::info!(
            %filename,
            elapsed_ms = started.elapsed().as_millis() as u64,
            count = suggestions.len(),
            "suggestions generated"
        );

        Ok(SuggestOutcome {
            filename: filename.to_string(),
            language,
            uploaded_id,
            suggestions,
            diagnostics,
        })
    }
}

fn resolve(filename: &str) -> Result<Language> {
    Language::from_filename(filename).ok_or_else(|| {
        tracing::warn!(%filename, "rejected unsupported file");
        Error::UnsupportedFile(filename.to_string())
    })
}

/// `<stem>_docs.md` for `filename`.
pub fn docs_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    format!("{}_docs.md", stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docs_filename() {
        assert_eq!(docs_filename("app.py"), "app_docs.md");
        assert_eq!(docs_filename("src/Main.java"), "Main_docs.md");
        assert_eq!(docs_filename("bundle.min.js"), "bundle.min_docs.md");
    }

    #[test]
    fn test_document_stores_both_files() {
        let cache = FileCache::default();
        let narrator = Narrator::new(&cache);
        let outcome = narrator
            .document("greet.py", "def greet(name):\n    return name\n")
            .unwrap();

        assert_eq!(outcome.language, Language::Python);
        assert!(outcome.markdown.contains("greet"));
        assert_eq!(cache.len(), 2);

        let uploaded = cache.get(&outcome.uploaded_id).unwrap();
        assert_eq!(uploaded.kind, FileKind::Uploaded);
        let generated = cache.get(&outcome.generated_id).unwrap();
        assert_eq!(generated.filename, "greet_docs.md");
        assert_eq!(generated.kind, FileKind::Generated);
        assert_eq!(generated.content, outcome.markdown);
    }

    #[test]
    fn test_suggest_stores_upload_only() {
        let cache = FileCache::default();
        let narrator = Narrator::new(&cache);
        let outcome = narrator
            .suggest("app.js", "var total = 10;\nconsole.log(total);\n")
            .unwrap();

        assert_eq!(outcome.language, Language::JavaScript);
        assert!(!outcome.suggestions.is_empty());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_unsupported_file_is_not_cached() {
        let cache = FileCache::default();
        let narrator = Narrator::new(&cache);

        let err = narrator.document("notes.txt", "hello").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFile(ref name) if name == "notes.txt"));
        assert!(narrator.suggest("lib.rs", "fn main() {}").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_syntax_error_still_documents() {
        let cache = FileCache::default();
        let narrator = Narrator::new(&cache);
        let outcome = narrator.document("broken.py", "def f(:\n").unwrap();
        assert!(outcome.extraction.is_syntax_error());
        assert!(outcome.markdown.starts_with("# Syntax Error"));
    }
}
