//! Error types for the analysis core and its callers.

use thiserror::Error;

/// A Python source text that could not be parsed into a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// 1-based line of the first offending token.
    pub line: usize,
    /// 1-based column of the first offending token.
    pub column: usize,
    /// Short description of the fault (e.g. "invalid syntax", "missing )").
    pub detail: String,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (line {}, column {})", self.detail, self.line, self.column)
    }
}

/// Errors that can occur while analyzing or serving source files.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to load grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),
    #[error("invalid tree-sitter query: {0}")]
    Query(#[from] tree_sitter::QueryError),
    #[error("parser produced no syntax tree")]
    ParseAborted,
    #[error("syntax error: {0}")]
    Syntax(SyntaxError),
    #[error("unsupported file type: {0}")]
    UnsupportedFile(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
