//! JavaScript analyzer battery.

use lazy_static::lazy_static;
use regex::Regex;

use super::common::{
    has_loose_equality, has_loose_inequality, has_magic_number, indent_width, is_upper_snake,
    opens_empty_catch, overlong,
};
use super::runner::{run, Battery, Source};
use super::spelling::SpellChecker;
use super::{Category, Diagnostic};
use crate::extract::scan::{code_only, BraceDepths};

const MAX_LINE: usize = 100;
const MAX_CALLBACK_INDENT: usize = 12;
const CHAIN_MIN_LENGTH: usize = 60;
/// Lines after a `function` line searched for a `var` declaration.
const VAR_WINDOW: usize = 10;
/// Lines above a `function` line searched for its JSDoc block.
const JSDOC_LOOKBACK: usize = 2;

/// Line endings after which a statement clearly continues.
const CONTINUATIONS: &[char] = &[
    ';', '{', '}', ')', ',', '[', '(', '=', '>', '+', '-', '*', '/', '&', '|', '?', ':', '.',
];

lazy_static! {
    static ref VAR_DECL: Regex = Regex::new(r"\bvar\s+\w+").unwrap();
    static ref BINDING_START: Regex = Regex::new(r"^(?:var|let|const)\s").unwrap();
    static ref EVAL_CALL: Regex = Regex::new(r"\beval\s*\(").unwrap();
    static ref INLINE_LITERAL: Regex = Regex::new(
        r"(?:^|[=(,:\[]|\breturn)\s*[\[{][^\[\]{}]*,[^\[\]{}]*[^,\s\[\]{}][\]}]"
    )
    .unwrap();
    static ref BLOCK_FUNCTION: Regex = Regex::new(r"^\s+function\s+\w+").unwrap();
    static ref PASCAL_BINDING: Regex = Regex::new(r"\b(?:var|let|const)\s+([A-Z]\w*)").unwrap();
    static ref PASCAL_FUNCTION: Regex = Regex::new(r"\bfunction\s+([A-Z]\w*)").unwrap();
    static ref LOWER_NEW: Regex = Regex::new(r"\bnew\s+([a-z]\w*)").unwrap();
    static ref LOWER_CONST: Regex = Regex::new(r#"\bconst\s+([a-z]\w*)\s*=\s*["'\d]"#).unwrap();
    static ref THIS_ASSIGN: Regex = Regex::new(r"this\.([a-zA-Z]\w*)\s*=[^=]").unwrap();
    static ref INNER_HTML: Regex = Regex::new(r"\.innerHTML\s*\+?=[^=]").unwrap();
    static ref DOCUMENT_WRITE: Regex = Regex::new(r"\bdocument\.write(?:ln)?\s*\(").unwrap();
    static ref STRING_TIMEOUT: Regex = Regex::new(r#"\bsetTimeout\s*\(\s*["'`]"#).unwrap();
    static ref LOOP_KEYWORD: Regex = Regex::new(r"\b(?:for|while)\s*\(").unwrap();
    static ref LENGTH_LOOP: Regex =
        Regex::new(r"\bfor\s*\(\s*(?:var|let)\s+\w+\s*=\s*0.*\.length").unwrap();
    static ref STRING_APPEND: Regex = Regex::new(r#"\+=.*["'`]"#).unwrap();
    static ref SYNC_OPEN: Regex = Regex::new(r"\.open\s*\([^)]*,\s*false\s*\)").unwrap();
    static ref FALSE_WORD: Regex = Regex::new(r"\bfalse\b").unwrap();
    static ref ADD_LISTENER: Regex = Regex::new(r"\baddEventListener\s*\(").unwrap();
    static ref MISSING_SEMICOLON: Regex =
        Regex::new(r"\b(?:var|let|const|return|throw)\s+.*[^;{}(),]$").unwrap();
    static ref LOOSE_NULL: Regex = Regex::new(r"(?:^|[^=!])==\s*null\b").unwrap();
    static ref FUNCTION_WORD: Regex = Regex::new(r"\bfunction\b").unwrap();
    static ref FOR_IN: Regex = Regex::new(r"\bfor\s*\(\s*(?:const|let|var)?\s*\w+\s+in\s").unwrap();
    static ref VAR_WORD: Regex = Regex::new(r"\bvar\s").unwrap();
    static ref THEN_CALL: Regex = Regex::new(r"\.then\s*\(").unwrap();
    static ref DEPRECATED: [(Regex, &'static str); 3] = [
        (Regex::new(r"(?:^|[^.\w$])escape\s*\(").unwrap(), "escape"),
        (Regex::new(r"(?:^|[^.\w$])unescape\s*\(").unwrap(), "unescape"),
        (Regex::new(r"\bwith\s*\(").unwrap(), "with"),
    ];
}

static BATTERY: &Battery = &[
    ("code_smells", code_smells),
    ("naming", naming),
    ("security_performance", security_performance),
    ("spelling", spelling),
    ("best_practices", best_practices),
];

pub fn analyze(source: &Source) -> Vec<Diagnostic> {
    run(source, BATTERY)
}

/// Byte offset of the first non-blank character of 1-based `line`.
fn content_offset(source: &Source, line: usize, raw: &str) -> usize {
    source.start_of(line) + (raw.len() - raw.trim_start().len())
}

fn code_smells(source: &Source) -> Vec<Diagnostic> {
    let depths = BraceDepths::new(source.text);
    let mut out = Vec::new();
    for (n, line) in source.numbered() {
        let content = line.trim();
        let code = code_only(content);

        if has_loose_equality(&code) {
            out.push(Diagnostic::new(
                Category::Refactor,
                n,
                "Use strict equality (===) instead of loose equality (==)",
            ));
        }
        if has_loose_inequality(&code) {
            out.push(Diagnostic::new(
                Category::Refactor,
                n,
                "Use strict inequality (!==) instead of loose inequality (!=)",
            ));
        }
        if content.contains("console.log") {
            out.push(Diagnostic::new(
                Category::Forbidden,
                n,
                "Remove console.log statements in production code",
            ));
        }
        if VAR_DECL.is_match(&code) {
            out.push(Diagnostic::new(
                Category::Refactor,
                n,
                "Use 'let' or 'const' instead of 'var'",
            ));
        }
        if BINDING_START.is_match(content) && depths.is_top_level(content_offset(source, n, line))
        {
            out.push(Diagnostic::new(
                Category::Scope,
                n,
                "Avoid global variables - use modules or IIFE",
            ));
        }
        if let Some(len) = overlong(line, MAX_LINE) {
            out.push(Diagnostic::new(
                Category::Length,
                n,
                format!("Line too long ({} chars) - consider breaking it down", len),
            ));
        }
        if opens_empty_catch(&source.lines, n) {
            out.push(Diagnostic::new(
                Category::Forbidden,
                n,
                "Empty catch block - handle errors properly",
            ));
        }
        if EVAL_CALL.is_match(&code) {
            out.push(Diagnostic::new(
                Category::Security,
                n,
                "Avoid eval() - it's a security risk and performance issue",
            ));
        }
        if INLINE_LITERAL.is_match(content) {
            out.push(Diagnostic::new(
                Category::Style,
                n,
                "Consider adding trailing commas for better diffs",
            ));
        }
        if BLOCK_FUNCTION.is_match(line) && !depths.is_top_level(content_offset(source, n, line)) {
            out.push(Diagnostic::new(
                Category::Refactor,
                n,
                "Avoid function declarations inside blocks - use function expressions",
            ));
        }
    }
    out
}

fn naming(source: &Source) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for (n, line) in source.numbered() {
        let content = line.trim();

        for caps in PASCAL_BINDING.captures_iter(content) {
            if is_upper_snake(&caps[1]) {
                continue;
            }
            out.push(Diagnostic::new(
                Category::CamelCase,
                n,
                format!("Variable '{}' should use camelCase naming", &caps[1]),
            ));
        }
        for caps in PASCAL_FUNCTION.captures_iter(content) {
            out.push(Diagnostic::new(
                Category::Refactor,
                n,
                format!("Function '{}' should use camelCase naming", &caps[1]),
            ));
        }
        for caps in LOWER_NEW.captures_iter(content) {
            out.push(Diagnostic::new(
                Category::Structure,
                n,
                format!("Constructor '{}' should use PascalCase naming", &caps[1]),
            ));
        }
        for caps in LOWER_CONST.captures_iter(content) {
            out.push(Diagnostic::new(
                Category::Constant,
                n,
                format!("Constant '{}' should use UPPER_CASE naming", &caps[1]),
            ));
        }
        if let Some(caps) = THIS_ASSIGN.captures(content) {
            if content.to_lowercase().contains("private") {
                out.push(Diagnostic::new(
                    Category::Security,
                    n,
                    format!("Private property '{}' should start with underscore", &caps[1]),
                ));
            }
        }
    }
    out
}

fn security_performance(source: &Source) -> Vec<Diagnostic> {
    let has_loop = LOOP_KEYWORD.is_match(&code_only(source.text));
    let removes_listeners = source.text.contains("removeEventListener");
    let mut out = Vec::new();
    for (n, line) in source.numbered() {
        let content = line.trim();

        if INNER_HTML.is_match(content) {
            out.push(Diagnostic::new(
                Category::Security,
                n,
                "Using innerHTML can lead to XSS - consider textContent or sanitization",
            ));
        }
        if DOCUMENT_WRITE.is_match(content) {
            out.push(Diagnostic::new(
                Category::Security,
                n,
                "Avoid document.write - it can overwrite the entire document",
            ));
        }
        if STRING_TIMEOUT.is_match(content) {
            out.push(Diagnostic::new(
                Category::Security,
                n,
                "Avoid string-based setTimeout - use functions instead",
            ));
        }
        if has_loop && content.contains("document.getElementById") {
            out.push(Diagnostic::new(
                Category::Performance,
                n,
                "Cache DOM elements outside loops to improve performance",
            ));
        }
        if LENGTH_LOOP.is_match(content) {
            out.push(Diagnostic::new(
                Category::Performance,
                n,
                "Cache array length in variable to avoid repeated access",
            ));
        }
        if STRING_APPEND.is_match(content) {
            out.push(Diagnostic::new(
                Category::Performance,
                n,
                "Use template literals or array.join() for string concatenation",
            ));
        }
        let sync_request = SYNC_OPEN.is_match(content)
            || (content.contains("XMLHttpRequest") && FALSE_WORD.is_match(content));
        if sync_request {
            out.push(Diagnostic::new(
                Category::Performance,
                n,
                "Avoid synchronous AJAX - use async requests",
            ));
        }
        if ADD_LISTENER.is_match(content) && !removes_listeners {
            out.push(Diagnostic::new(
                Category::Leak,
                n,
                "Remember to remove event listeners to prevent memory leaks",
            ));
        }
    }
    out
}

fn spelling(source: &Source) -> Vec<Diagnostic> {
    SpellChecker::javascript().check(source)
}

fn best_practices(source: &Source) -> Vec<Diagnostic> {
    let has_array = source.text.contains('[');
    let mut out = Vec::new();
    for (n, line) in source.numbered() {
        let content = line.trim();
        let code = code_only(content);
        let code = code.trim_end();
        let is_comment = content.starts_with("//") || content.starts_with('*');

        if !is_comment
            && !content.ends_with(CONTINUATIONS)
            && MISSING_SEMICOLON.is_match(content)
        {
            out.push(Diagnostic::new(
                Category::Style,
                n,
                "Consider adding semicolon at end of statement",
            ));
        }
        if LOOSE_NULL.is_match(code) {
            out.push(Diagnostic::new(
                Category::Refactor,
                n,
                "Use '=== null' instead of '== null'",
            ));
        }
        if content.matches('.').count() > 2 && content.chars().count() > CHAIN_MIN_LENGTH {
            out.push(Diagnostic::new(
                Category::Style,
                n,
                "Consider breaking method chains across multiple lines",
            ));
        }
        if FUNCTION_WORD.is_match(code) {
            if !has_jsdoc(source, n) {
                out.push(Diagnostic::new(
                    Category::Documentation,
                    n,
                    "Consider adding JSDoc documentation for function",
                ));
            }
            if let Some(var_line) = var_below(source, n) {
                out.push(Diagnostic::new(
                    Category::Refactor,
                    var_line,
                    "Use 'let' or 'const' instead of 'var' in function scope",
                ));
            }
            if indent_width(line) > MAX_CALLBACK_INDENT {
                out.push(Diagnostic::new(
                    Category::Refactor,
                    n,
                    "Deep nesting detected - consider using Promises or async/await",
                ));
            }
        }
        if has_array && FOR_IN.is_match(code) {
            out.push(Diagnostic::new(
                Category::Refactor,
                n,
                "Use for...of or forEach for arrays instead of for...in",
            ));
        }
        if has_magic_number(content, &["//", "/*", "*"]) {
            out.push(Diagnostic::new(
                Category::Length,
                n,
                "Consider using named constants instead of magic numbers",
            ));
        }
        if THEN_CALL.is_match(code) && !source.text[source.start_of(n)..].contains(".catch(") {
            out.push(Diagnostic::new(
                Category::Risk,
                n,
                "Promise chain missing error handling (.catch)",
            ));
        }
        for (pattern, name) in DEPRECATED.iter() {
            if pattern.is_match(code) {
                out.push(Diagnostic::new(
                    Category::Risk,
                    n,
                    format!("'{}' is deprecated - use modern alternatives", name),
                ));
            }
        }
    }
    out
}

/// Whether a JSDoc block ends within the lines just above 1-based `line`.
fn has_jsdoc(source: &Source, line: usize) -> bool {
    let above = &source.lines[line.saturating_sub(1 + JSDOC_LOOKBACK)..line.saturating_sub(1)];
    above.iter().any(|l| {
        let l = l.trim();
        l.contains("/**") || (l.ends_with("*/") && !l.starts_with("/*"))
    })
}

/// First line among the ones following 1-based `line` that declares a `var`.
fn var_below(source: &Source, line: usize) -> Option<usize> {
    source
        .numbered()
        .skip(line)
        .take(VAR_WINDOW)
        .find(|(_, l)| VAR_WORD.is_match(&code_only(l)))
        .map(|(n, _)| n)
}
