//! Line-level rules shared by several languages.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INTEGER_TOKEN: Regex = Regex::new(r"\b\d{2,}\b").unwrap();
    static ref CATCH_OPEN: Regex = Regex::new(r"^(?:\}\s*)?catch\b[^{]*\{").unwrap();
}

/// Length of `line` in characters when it exceeds `limit`.
pub fn overlong(line: &str, limit: usize) -> Option<usize> {
    let len = line.chars().count();
    (len > limit).then_some(len)
}

/// Whether `line` holds an integer literal of two or more digits whose
/// value is neither 0 nor 1.
///
/// Lines opening with one of `comment_prefixes` are ignored, as are the
/// digit runs of decimal fractions.
pub fn has_magic_number(line: &str, comment_prefixes: &[&str]) -> bool {
    let trimmed = line.trim();
    if comment_prefixes.iter().any(|p| trimmed.starts_with(p)) {
        return false;
    }
    let bytes = line.as_bytes();
    INTEGER_TOKEN.find_iter(line).any(|m| {
        let after_dot = m.start() > 0 && bytes[m.start() - 1] == b'.';
        let before_dot = bytes.get(m.end()) == Some(&b'.')
            && bytes.get(m.end() + 1).is_some_and(u8::is_ascii_digit);
        if after_dot || before_dot {
            return false;
        }
        let digits = m.as_str().trim_start_matches('0');
        !(digits.is_empty() || digits == "1")
    })
}

/// Whether `line` contains `==` that is not part of `===`, `!==`, `<=`
/// or `>=`.
pub fn has_loose_equality(line: &str) -> bool {
    let bytes = line.as_bytes();
    line.match_indices("==").any(|(i, _)| {
        let before = i.checked_sub(1).map(|j| bytes[j]);
        let after = bytes.get(i + 2).copied();
        !matches!(before, Some(b'=' | b'!' | b'<' | b'>')) && after != Some(b'=')
    })
}

/// Whether `line` contains `!=` that is not part of `!==`.
pub fn has_loose_inequality(line: &str) -> bool {
    let bytes = line.as_bytes();
    line.match_indices("!=")
        .any(|(i, _)| bytes.get(i + 2) != Some(&b'='))
}

/// Whether the catch block opened on 1-based `line` has an empty body.
///
/// The body is empty when the text after the opening `{` is a closing
/// brace, or when the next non-blank line within three lines starts with
/// one.
pub fn opens_empty_catch(lines: &[&str], line: usize) -> bool {
    let Some(current) = line.checked_sub(1).and_then(|i| lines.get(i)) else {
        return false;
    };
    let trimmed = current.trim();
    let Some(open) = CATCH_OPEN.find(trimmed) else {
        return false;
    };

    let rest = trimmed[open.end()..].trim();
    if !rest.is_empty() {
        return rest.starts_with('}');
    }
    lines
        .iter()
        .skip(line)
        .take(3)
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .is_some_and(|l| l.starts_with('}'))
}

/// Indentation width of `line`, counting a tab as four columns.
pub fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Whether `name` is written in `UPPER_CASE`.
pub fn is_upper_snake(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
