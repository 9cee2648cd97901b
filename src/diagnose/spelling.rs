//! Misspelling detection in comments, string literals and identifiers.
//!
//! The dictionaries are static tables. Comment and string words must
//! match a key exactly; identifiers are flagged when any key appears
//! anywhere inside them, compared case-insensitively.

use lazy_static::lazy_static;
use phf::phf_ordered_map;
use regex::Regex;
use std::collections::HashSet;

use super::runner::Source;
use super::{Category, Diagnostic};

/// Misspellings shared by every language.
static CORE: phf::OrderedMap<&'static str, &'static str> = phf_ordered_map! {
    "lenght" => "length",
    "widht" => "width",
    "heigh" => "height",
    "recieve" => "receive",
    "occured" => "occurred",
    "seperator" => "separator",
    "definately" => "definitely",
    "succesful" => "successful",
    "proccess" => "process",
    "adress" => "address",
    "sucess" => "success",
    "manger" => "manager",
    "comparsion" => "comparison",
    "compatability" => "compatibility",
    "accesible" => "accessible",
    "colum" => "column",
    "usualy" => "usually",
    "ocasionally" => "occasionally",
};

static JAVA_EXTRAS: phf::OrderedMap<&'static str, &'static str> = phf_ordered_map! {
    "excpetion" => "exception",
    "connexion" => "connection",
    "initalize" => "initialize",
    "implmentation" => "implementation",
};

static JAVASCRIPT_EXTRAS: phf::OrderedMap<&'static str, &'static str> = phf_ordered_map! {
    "fucntion" => "function",
    "retrun" => "return",
    "calback" => "callback",
    "asyncronous" => "asynchronous",
    "promiss" => "promise",
    "reponse" => "response",
    "requets" => "request",
};

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\b[a-zA-Z]+\b").unwrap();
    static ref PYTHON_COMMENT: Regex = Regex::new(r"#\s*(.+)").unwrap();
    static ref EITHER_QUOTED: Regex = Regex::new(r#"["']([^"']+)["']"#).unwrap();
    static ref DOUBLE_QUOTED: Regex = Regex::new(r#""([^"]+)""#).unwrap();
    static ref BACKTICK_QUOTED: Regex = Regex::new(r"`([^`]+)`").unwrap();
    static ref IDENTIFIER: Regex = Regex::new(r"\b([a-zA-Z_]\w*)\b").unwrap();
    static ref JS_IDENTIFIER: Regex = Regex::new(r"(?:^|[^\w$])([a-zA-Z_$][\w$]*)").unwrap();
}

/// How a finding is phrased.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phrasing {
    /// `'word' might be misspelled, did you mean 'fix'?`
    Question,
    /// `'word' → 'fix'`
    Arrow,
}

/// Per-language spelling rules.
pub struct SpellChecker {
    extras: Option<&'static phf::OrderedMap<&'static str, &'static str>>,
    phrasing: Phrasing,
    comment: fn(&str) -> Option<&str>,
    strings: &'static Regex,
    templates: bool,
    identifiers: &'static Regex,
}

impl SpellChecker {
    pub fn python() -> Self {
        Self {
            extras: None,
            phrasing: Phrasing::Question,
            comment: hash_comment,
            strings: &EITHER_QUOTED,
            templates: false,
            identifiers: &IDENTIFIER,
        }
    }

    pub fn java() -> Self {
        Self {
            extras: Some(&JAVA_EXTRAS),
            phrasing: Phrasing::Arrow,
            comment: slash_comment,
            strings: &DOUBLE_QUOTED,
            templates: false,
            identifiers: &IDENTIFIER,
        }
    }

    pub fn javascript() -> Self {
        Self {
            extras: Some(&JAVASCRIPT_EXTRAS),
            phrasing: Phrasing::Arrow,
            comment: slash_comment,
            strings: &EITHER_QUOTED,
            templates: true,
            identifiers: &JS_IDENTIFIER,
        }
    }

    /// Dictionary entries in table order.
    fn entries(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        let extras = self.extras.into_iter().flat_map(|m| m.entries());
        CORE.entries().chain(extras).map(|(k, v)| (*k, *v))
    }

    fn correction(&self, word: &str) -> Option<&'static str> {
        CORE.get(word)
            .or_else(|| self.extras.and_then(|m| m.get(word)))
            .copied()
    }

    /// Run all three checks over every line of `source`.
    pub fn check(&self, source: &Source) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (n, line) in source.numbered() {
            if let Some(comment) = (self.comment)(line) {
                self.words(n, "comment", comment, &mut diagnostics);
            }
            for caps in self.strings.captures_iter(line) {
                self.words(n, "string", &caps[1], &mut diagnostics);
            }
            if self.templates {
                for caps in BACKTICK_QUOTED.captures_iter(line) {
                    self.words(n, "template", &caps[1], &mut diagnostics);
                }
            }
            self.identifiers(n, line, &mut diagnostics);
        }
        diagnostics
    }

    fn words(&self, n: usize, place: &str, text: &str, out: &mut Vec<Diagnostic>) {
        let lower = text.to_lowercase();
        for word in WORD.find_iter(&lower).map(|m| m.as_str()) {
            let Some(fix) = self.correction(word) else {
                continue;
            };
            let message = match self.phrasing {
                Phrasing::Question => format!(
                    "Spelling in {}: '{}' might be misspelled, did you mean '{}'?",
                    place, word, fix
                ),
                Phrasing::Arrow => format!("Spelling in {}: '{}' → '{}'", place, word, fix),
            };
            out.push(Diagnostic::new(Category::Style, n, message));
        }
    }

    fn identifiers(&self, n: usize, line: &str, out: &mut Vec<Diagnostic>) {
        let mut seen = HashSet::new();
        for caps in self.identifiers.captures_iter(line) {
            let identifier = caps.get(1).map_or("", |m| m.as_str());
            if !seen.insert(identifier) {
                continue;
            }
            let lower = identifier.to_lowercase();
            for (key, fix) in self.entries().filter(|(k, _)| lower.contains(k)) {
                let message = match self.phrasing {
                    Phrasing::Question => format!(
                        "Variable/function name '{}' contains potential misspelling: '{}' → '{}'",
                        identifier, key, fix
                    ),
                    Phrasing::Arrow => {
                        format!("Identifier '{}' contains '{}' → '{}'", identifier, key, fix)
                    }
                };
                out.push(Diagnostic::new(Category::Style, n, message));
            }
        }
    }
}

/// Text after the first `#` on the line.
fn hash_comment(line: &str) -> Option<&str> {
    PYTHON_COMMENT
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Comment text on a C-style line: after `//`, inside `/* */`, or the
/// rest of a `*`-led block comment continuation line.
fn slash_comment(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('*') && !trimmed.starts_with("*/") {
        return Some(&trimmed[1..]);
    }

    let line_at = line.find("//");
    let block_at = line.find("/*");
    match (line_at, block_at) {
        (Some(l), Some(b)) if b < l => Some(block_body(&line[b + 2..])),
        (Some(l), _) => Some(&line[l + 2..]),
        (None, Some(b)) => Some(block_body(&line[b + 2..])),
        (None, None) => None,
    }
}

fn block_body(rest: &str) -> &str {
    rest.find("*/").map_or(rest, |end| &rest[..end])
}
