//! Text scanning primitives shared by the brace-language extractors.
//!
//! Java and JavaScript declarations are located with regexes, then their
//! extent is found by counting balanced delimiters forward from a start
//! offset. String literals and comments are skipped while counting, so a
//! `}` inside `"..."` never closes a body.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

lazy_static! {
    static ref DOC_COMMENT: Regex = Regex::new(r"(?s)/\*\*(.*?)\*/").unwrap();
    static ref DOC_LINE_PREFIX: Regex = Regex::new(r"(?m)^\s*\*\s?").unwrap();
}

/// Maps byte offsets to 0-based line numbers.
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    /// 0-based line containing `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&s| s <= offset).saturating_sub(1)
    }
}

/// Iterator over the bytes of `text` that are code, i.e. not inside a
/// string/char/template literal or a comment.
pub struct CodeBytes<'a> {
    bytes: &'a [u8],
    pos: usize,
}

/// Scan code bytes starting at `start`, assuming `start` is in code.
pub fn code_bytes(text: &str, start: usize) -> CodeBytes<'_> {
    CodeBytes {
        bytes: text.as_bytes(),
        pos: start,
    }
}

impl CodeBytes<'_> {
    fn skip_line_comment(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] == b'*' && self.bytes.get(self.pos + 1) == Some(&b'/') {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }

    fn skip_literal(&mut self, quote: u8) {
        self.pos += 1;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                c if c == quote => {
                    self.pos += 1;
                    return;
                }
                // Only template literals may span lines.
                b'\n' if quote != b'`' => return,
                _ => self.pos += 1,
            }
        }
    }
}

impl Iterator for CodeBytes<'_> {
    type Item = (usize, u8);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            match b {
                b'/' if self.bytes.get(self.pos + 1) == Some(&b'/') => self.skip_line_comment(),
                b'/' if self.bytes.get(self.pos + 1) == Some(&b'*') => self.skip_block_comment(),
                b'"' | b'\'' | b'`' => self.skip_literal(b),
                _ => {
                    self.pos += 1;
                    return Some((self.pos - 1, b));
                }
            }
        }
        None
    }
}

/// Find the offset of the delimiter closing the one at `open`.
///
/// Returns `None` when the text ends before balance returns to zero.
pub fn find_matching(text: &str, open: usize, open_ch: u8, close_ch: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in code_bytes(text, open) {
        if b == open_ch {
            depth += 1;
        } else if b == close_ch {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Find the `}` matching the `{` at `open`.
pub fn find_block_end(text: &str, open: usize) -> Option<usize> {
    find_matching(text, open, b'{', b'}')
}

/// Brace nesting depth at every byte offset of a text, plus whether the
/// byte is code or part of a literal/comment.
///
/// Braces themselves report the depth of the context that contains them.
pub struct BraceDepths {
    depths: Vec<usize>,
    code: Vec<bool>,
}

impl BraceDepths {
    pub fn new(text: &str) -> Self {
        let mut depths = vec![0; text.len() + 1];
        let mut code = vec![false; text.len() + 1];
        let mut depth = 0usize;
        let mut filled = 0usize;
        for (i, b) in code_bytes(text, 0) {
            depths[filled..i].fill(depth);
            if b == b'}' {
                depth = depth.saturating_sub(1);
            }
            depths[i] = depth;
            code[i] = true;
            if b == b'{' {
                depth += 1;
            }
            filled = i + 1;
        }
        depths[filled..].fill(depth);
        Self { depths, code }
    }

    pub fn at(&self, offset: usize) -> usize {
        self.depths.get(offset).copied().unwrap_or(0)
    }

    pub fn is_top_level(&self, offset: usize) -> bool {
        self.at(offset) == 0
    }

    /// Whether `offset` is outside every string literal and comment.
    pub fn is_code(&self, offset: usize) -> bool {
        self.code.get(offset).copied().unwrap_or(false)
    }

    /// Code at the top brace level.
    pub fn is_top_level_code(&self, offset: usize) -> bool {
        self.is_code(offset) && self.is_top_level(offset)
    }
}

/// Copy of `text` with literals and comments replaced by spaces.
///
/// Line breaks and byte offsets are preserved.
pub fn code_only(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out: Vec<u8> = bytes
        .iter()
        .map(|&b| if b == b'\n' { b'\n' } else { b' ' })
        .collect();
    for (i, b) in code_bytes(text, 0) {
        out[i] = b;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// All matches of `re` in `text` accepted by `keep`.
///
/// An accepted match resumes the search at its end; a rejected one
/// resumes one character past its start, so a rejected candidate never
/// hides an overlapping accepted one.
pub fn captures_where<'t>(
    re: &Regex,
    text: &'t str,
    keep: impl Fn(&Captures<'t>) -> bool,
) -> Vec<Captures<'t>> {
    let mut found = Vec::new();
    let mut pos = 0;
    while pos <= text.len() {
        let Some(caps) = re.captures_at(text, pos) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };
        let accepted = keep(&caps) && !whole.as_str().is_empty();
        pos = if accepted {
            whole.end()
        } else {
            whole.start() + text[whole.start()..].chars().next().map_or(1, char::len_utf8)
        };
        if accepted {
            found.push(caps);
        }
    }
    found
}

/// Split `s` on `sep` where no delimiter from `pairs` is open.
///
/// Quoted strings are treated as opaque.
pub fn split_top_level<'a>(s: &'a str, sep: u8, pairs: &[(u8, u8)]) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut quote: Option<u8> = None;
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
        } else if matches!(b, b'"' | b'\'' | b'`') {
            quote = Some(b);
        } else if pairs.iter().any(|&(open, _)| open == b) {
            depth += 1;
        } else if pairs.iter().any(|&(_, close)| close == b) {
            depth = depth.saturating_sub(1);
        } else if b == sep && depth == 0 {
            parts.push(&s[start..i]);
            start = i + 1;
        }
        i += 1;
    }
    parts.push(&s[start..]);
    parts
}

/// Offset of the first `target` byte outside any delimiter from `pairs`.
pub fn find_top_level(s: &str, target: u8, pairs: &[(u8, u8)]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in s.bytes().enumerate() {
        if pairs.iter().any(|&(open, _)| open == b) {
            depth += 1;
        } else if pairs.iter().any(|&(_, close)| close == b) {
            depth = depth.saturating_sub(1);
        } else if b == target && depth == 0 {
            return Some(i);
        }
    }
    None
}

/// `/** ... */` comments indexed by the 0-based line they start on.
#[derive(Debug, Default)]
pub struct DocComments {
    by_line: BTreeMap<usize, String>,
}

impl DocComments {
    /// Harvest every doc comment in `text`.
    pub fn harvest(text: &str) -> Self {
        let lines = LineIndex::new(text);
        let by_line = DOC_COMMENT
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let body = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                let cleaned = DOC_LINE_PREFIX.replace_all(body, "");
                Some((lines.line_of(whole.start()), cleaned.trim().to_string()))
            })
            .collect();
        Self { by_line }
    }

    /// Nearest doc comment starting within `window` lines above `line`.
    pub fn lookup(&self, line: usize, window: usize) -> Option<&str> {
        (line.saturating_sub(window)..line)
            .rev()
            .find_map(|l| self.by_line.get(&l))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_line.is_empty()
    }
}

/// Replace every doc comment with whitespace, keeping line breaks and
/// byte offsets intact.
pub fn blank_doc_comments(text: &str) -> String {
    DOC_COMMENT
        .replace_all(text, |caps: &Captures| {
            caps[0]
                .chars()
                .map(|ch| {
                    if ch == '\n' {
                        "\n".to_string()
                    } else {
                        " ".repeat(ch.len_utf8())
                    }
                })
                .collect::<String>()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index() {
        let idx = LineIndex::new("a\nbb\n\nc");
        assert_eq!(idx.line_of(0), 0);
        assert_eq!(idx.line_of(2), 1);
        assert_eq!(idx.line_of(5), 2);
        assert_eq!(idx.line_of(6), 3);
    }

    #[test]
    fn test_find_block_end_nested() {
        let text = "class A { void f() { if (x) { y(); } } }";
        let open = text.find('{').unwrap();
        assert_eq!(find_block_end(text, open), Some(text.len() - 1));
    }

    #[test]
    fn test_find_block_end_skips_strings_and_comments() {
        let text = r#"{ s = "}"; c = '}'; // }
 /* } */ }"#;
        assert_eq!(find_block_end(text, 0), Some(text.len() - 1));
    }

    #[test]
    fn test_find_block_end_unbalanced() {
        assert_eq!(find_block_end("{ { }", 0), None);
    }

    #[test]
    fn test_brace_depths() {
        let text = "a { b { c } d } e";
        let depths = BraceDepths::new(text);
        assert_eq!(depths.at(text.find('a').unwrap()), 0);
        assert_eq!(depths.at(text.find('b').unwrap()), 1);
        assert_eq!(depths.at(text.find('c').unwrap()), 2);
        assert_eq!(depths.at(text.find('d').unwrap()), 1);
        assert!(depths.is_top_level(text.find('e').unwrap()));
    }

    #[test]
    fn test_code_mask_and_code_only() {
        let text = "a = \"{x}\"; // b\nc";
        let depths = BraceDepths::new(text);
        assert!(depths.is_code(0));
        assert!(!depths.is_code(text.find('x').unwrap()));
        assert!(!depths.is_code(text.find('b').unwrap()));
        assert!(depths.is_top_level_code(text.find('c').unwrap()));

        let blanked = code_only(text);
        assert_eq!(blanked.len(), text.len());
        assert!(!blanked.contains('x'));
        assert!(blanked.ends_with("\nc"));
    }

    #[test]
    fn test_captures_where_resumes_after_rejection() {
        let re = Regex::new(r"(\w+)\s+(\w+);").unwrap();
        let text = "{ int a; } int b;";
        let depths = BraceDepths::new(text);
        let found = captures_where(&re, text, |c| depths.is_top_level(c.get(0).unwrap().start()));
        let names: Vec<&str> = found.iter().map(|c| c.get(2).unwrap().as_str()).collect();
        assert_eq!(names, vec!["b"]);
    }

    #[test]
    fn test_split_top_level_generics() {
        let parts = split_top_level("Map<String, Integer> m, int n", b',', &[(b'<', b'>')]);
        assert_eq!(parts, vec!["Map<String, Integer> m", " int n"]);
    }

    #[test]
    fn test_split_top_level_destructuring() {
        let parts = split_top_level(
            "{a, b}, [c, d], e = 'x,y'",
            b',',
            &[(b'{', b'}'), (b'[', b']'), (b'(', b')')],
        );
        assert_eq!(parts, vec!["{a, b}", " [c, d]", " e = 'x,y'"]);
    }

    #[test]
    fn test_doc_lookup_prefers_nearest() {
        let text = "/** first */\n\n/** second\n * more */\nclass A {}";
        let docs = DocComments::harvest(text);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs.lookup(4, 10), Some("second\nmore"));
        assert_eq!(docs.lookup(1, 10), Some("first"));
        assert_eq!(docs.lookup(0, 10), None);
    }

    #[test]
    fn test_doc_lookup_window() {
        let text = "/** far */\n\n\n\n\n\n\nfunction f() {}";
        let docs = DocComments::harvest(text);
        assert_eq!(docs.lookup(7, 5), None);
        assert_eq!(docs.lookup(7, 10), Some("far"));
    }

    #[test]
    fn test_blank_doc_comments_keeps_lines() {
        let text = "/** a\n * b */\nfunction f() {}";
        let blanked = blank_doc_comments(text);
        assert_eq!(blanked.len(), text.len());
        assert_eq!(blanked.lines().count(), text.lines().count());
        assert!(!blanked.contains("/**"));
        assert!(blanked.ends_with("function f() {}"));
    }
}
