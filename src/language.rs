//! Supported source languages and their file-extension mapping.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// A language the analysis core understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Python,
    Java,
    JavaScript,
}

impl Language {
    /// All supported languages.
    pub const ALL: [Language; 3] = [Language::Python, Language::Java, Language::JavaScript];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::Java => "Java",
            Language::JavaScript => "JavaScript",
        }
    }

    /// File extensions (without dot) handled by this language.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py"],
            Language::Java => &["java"],
            Language::JavaScript => &["js", "jsx"],
        }
    }

    /// Resolve a language from a file extension (with or without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
    }

    /// Resolve a language from a filename or path.
    pub fn from_filename(filename: &str) -> Option<Self> {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Human-readable list of supported file types.
    pub fn supported_types() -> Vec<String> {
        Self::ALL
            .iter()
            .map(|lang| {
                let exts: Vec<String> = lang.extensions().iter().map(|e| format!(".{}", e)).collect();
                format!("{} ({})", exts.join("/"), lang.as_str())
            })
            .collect()
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension(".java"), Some(Language::Java));
        assert_eq!(Language::from_extension("JSX"), Some(Language::JavaScript));
        assert_eq!(Language::from_extension("ts"), None);
    }

    #[test]
    fn test_from_filename() {
        assert_eq!(Language::from_filename("app.JS"), Some(Language::JavaScript));
        assert_eq!(Language::from_filename("src/Main.java"), Some(Language::Java));
        assert_eq!(Language::from_filename("README"), None);
    }

    #[test]
    fn test_supported_types() {
        let types = Language::supported_types();
        assert_eq!(types[0], ".py (Python)");
        assert_eq!(types[2], ".js/.jsx (JavaScript)");
    }
}
