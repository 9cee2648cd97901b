//! Core types for diagnostic results.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Closed vocabulary of diagnostic categories, each with a fixed emoji.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Forbidden or unsafe construct.
    Forbidden,
    /// Pattern that should be refactored.
    Refactor,
    /// Line length or magic number.
    Length,
    /// Import or declaration hygiene.
    Hygiene,
    /// Bare exception or missing error handling.
    Risk,
    /// Defect-prone pattern such as a mutable default.
    Defect,
    Scope,
    /// Lower/camel case naming.
    CamelCase,
    /// Pascal case or structural naming.
    Structure,
    Constant,
    Security,
    Performance,
    /// Spelling or stylistic nit.
    Style,
    Documentation,
    /// Resource leak.
    Leak,
}

impl Category {
    pub const ALL: [Category; 15] = [
        Category::Forbidden,
        Category::Refactor,
        Category::Length,
        Category::Hygiene,
        Category::Risk,
        Category::Defect,
        Category::Scope,
        Category::CamelCase,
        Category::Structure,
        Category::Constant,
        Category::Security,
        Category::Performance,
        Category::Style,
        Category::Documentation,
        Category::Leak,
    ];

    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Forbidden => "🚫",
            Category::Refactor => "🔧",
            Category::Length => "📏",
            Category::Hygiene => "📦",
            Category::Risk => "⚠️",
            Category::Defect => "🐛",
            Category::Scope => "🌐",
            Category::CamelCase => "🐍",
            Category::Structure => "🏗️",
            Category::Constant => "🔢",
            Category::Security => "🔒",
            Category::Performance => "⚡",
            Category::Style => "📝",
            Category::Documentation => "📚",
            Category::Leak => "💾",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Forbidden => "forbidden",
            Category::Refactor => "refactor",
            Category::Length => "length",
            Category::Hygiene => "hygiene",
            Category::Risk => "risk",
            Category::Defect => "defect",
            Category::Scope => "scope",
            Category::CamelCase => "camel_case",
            Category::Structure => "structure",
            Category::Constant => "constant",
            Category::Security => "security",
            Category::Performance => "performance",
            Category::Style => "style",
            Category::Documentation => "documentation",
            Category::Leak => "leak",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single line-addressed suggestion.
///
/// Renders as `"{emoji} Line {n}: {message}"`, with `unknown` in place of
/// the line number when the finding has no single physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: Category,
    /// 1-based line in the analyzed text.
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(category: Category, line: usize, message: impl Into<String>) -> Self {
        Self {
            category,
            line: Some(line),
            message: message.into(),
        }
    }

    pub fn unattributed(category: Category, message: impl Into<String>) -> Self {
        Self {
            category,
            line: None,
            message: message.into(),
        }
    }

    pub fn emoji(&self) -> &'static str {
        self.category.emoji()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} Line {}: {}", self.emoji(), line, self.message),
            None => write!(f, "{} Line unknown: {}", self.emoji(), self.message),
        }
    }
}

impl Serialize for Diagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Diagnostic", 5)?;
        state.serialize_field("category", &self.category)?;
        state.serialize_field("emoji", self.emoji())?;
        state.serialize_field("line", &self.line)?;
        state.serialize_field("message", &self.message)?;
        state.serialize_field("text", &self.to_string())?;
        state.end()
    }
}
