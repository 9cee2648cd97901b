//! Markdown rendering of extracted modules.
//!
//! Output is a pure function of the entity model: the same model always
//! renders to the same bytes. Sections are emitted in a fixed order and
//! empty sections are omitted.

mod java;
mod javascript;
mod python;

use crate::error::SyntaxError;
use crate::language::Language;
use crate::model::{Extraction, SourceModule};

/// Render an extraction result as a markdown document.
pub fn render_markdown(extraction: &Extraction) -> String {
    match extraction {
        Extraction::Module(module) => render_module(module),
        Extraction::SyntaxError(err) => render_syntax_error(err),
    }
}

/// Render a module with the formatting rules of its language.
pub fn render_module(module: &SourceModule) -> String {
    let lines = match module.language {
        Language::Python => python::render(module),
        Language::Java => java::render(module),
        Language::JavaScript => javascript::render(module),
    };
    lines.join("\n")
}

/// Document produced for Python text that does not parse.
pub fn render_syntax_error(err: &SyntaxError) -> String {
    format!("# Syntax Error\n\nFailed to parse Python code: {}\n", err)
}

/// `` `a`, `b` `` with an optional prefix inside each code span.
fn code_list(items: &[String], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("`{}{}`", prefix, item))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `"word "` when present, `""` otherwise.
fn spaced(word: Option<&str>) -> String {
    word.map(|w| format!("{} ", w)).unwrap_or_default()
}

/// `"a b "` when non-empty, `""` otherwise.
fn spaced_words(words: &[String]) -> String {
    if words.is_empty() {
        String::new()
    } else {
        format!("{} ", words.join(" "))
    }
}

/// Append a `## {title}` section listing `items` as code spans.
fn push_code_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    lines.push(format!("## {}", title));
    lines.extend(items.iter().map(|item| format!("- `{}`", item)));
    lines.push(String::new());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_document() {
        let err = SyntaxError {
            line: 1,
            column: 7,
            detail: "invalid syntax".to_string(),
        };
        let doc = render_markdown(&Extraction::SyntaxError(err));
        assert_eq!(
            doc,
            "# Syntax Error\n\nFailed to parse Python code: invalid syntax (line 1, column 7)\n"
        );
    }

    #[test]
    fn test_helpers() {
        let items = vec!["a".to_string(), "b".to_string()];
        assert_eq!(code_list(&items, "@"), "`@a`, `@b`");
        assert_eq!(spaced(Some("public")), "public ");
        assert_eq!(spaced(None), "");
        assert_eq!(spaced_words(&items), "a b ");
        assert_eq!(spaced_words(&[]), "");
    }
}
