//! Java analyzer battery.

use lazy_static::lazy_static;
use regex::Regex;

use super::common::{has_magic_number, is_upper_snake, opens_empty_catch, overlong};
use super::runner::{run, Battery, Source};
use super::spelling::SpellChecker;
use super::{Category, Diagnostic};
use crate::extract::scan::code_only;

const MAX_LINE: usize = 120;
/// Lines, ending at the current one, searched for a `String` declaration.
const CONCAT_WINDOW: usize = 5;

const MODIFIERS: &[&str] = &[
    "public",
    "private",
    "protected",
    "static",
    "final",
    "abstract",
    "synchronized",
    "native",
    "default",
];

const NOT_DECLARATIONS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "new", "throw", "else", "do", "try",
];

lazy_static! {
    static ref STRING_EQ: Regex = Regex::new(r#""[^"]*"\s*==\s*\w+|\w+\s*==\s*"[^"]*""#).unwrap();
    static ref MULTI_DECL: Regex =
        Regex::new(r"\b(?:int|String|boolean|double|float|long)\s+\w+\s*,\s*\w+\s*[=;,]").unwrap();
    static ref RAW_COLLECTION: Regex =
        Regex::new(r"\b(?:List|Map|Set|ArrayList|HashMap|HashSet)\s+\w+\s*=").unwrap();
    static ref TYPE_ARGS: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref IF_KEYWORD: Regex = Regex::new(r"\bif\b").unwrap();
    static ref LOWER_CLASS: Regex = Regex::new(r"\bclass\s+([a-z]\w*)").unwrap();
    static ref PASCAL_METHOD: Regex =
        Regex::new(r"\b(?:public|private|protected)\b([^=(]*?)\s+([A-Z]\w*)\s*\(").unwrap();
    static ref PASCAL_VARIABLE: Regex =
        Regex::new(r"\b(?:int|String|boolean|double|float|long)\s+([A-Z]\w*)").unwrap();
    static ref LOWER_CONSTANT: Regex =
        Regex::new(r"\b(?:final\s+static|static\s+final)\s+[\w<>\[\],]+\s+([a-z]\w*)").unwrap();
    static ref MIXED_PACKAGE: Regex = Regex::new(r"^package\s+([^;]*[A-Z][^;]*)").unwrap();
    static ref RUNTIME_EXEC: Regex = Regex::new(r"Runtime\.getRuntime\(\)\s*\.exec\b").unwrap();
    static ref FOR_NAME: Regex = Regex::new(r"\bClass\.forName\b").unwrap();
    static ref NEW_RANDOM: Regex = Regex::new(r"\bnew\s+Random\s*\(").unwrap();
    static ref STRING_WORD: Regex = Regex::new(r"\bString\b").unwrap();
    static ref FOR_LOOP: Regex = Regex::new(r"\bfor\s*\(").unwrap();
    static ref NEW_STRING: Regex = Regex::new(r"\bnew\s+String\s*\(").unwrap();
    static ref NEW_WRAPPER: Regex =
        Regex::new(r"\bnew\s+(?:Integer|Double|Boolean|Float|Long)\s*\(").unwrap();
    static ref OVERRIDABLE: Regex =
        Regex::new(r"\bpublic\s+[\w<>\[\]]+\s+(?:toString|equals|hashCode|compareTo)\s*\(").unwrap();
    static ref DECLARATION: Regex =
        Regex::new(r"^(?:[\w<>\[\],.?]+\s+)*?([a-zA-Z_]\w*)\s*\(([^)]*)\)\s*(?:throws\s[^{;]*)?\{?\s*$").unwrap();
    static ref TYPED_PARAM: Regex = Regex::new(r"[\w>\]]\s+\w+").unwrap();
    static ref CLASS_WORD: Regex = Regex::new(r"\bclass\b").unwrap();
    static ref STATIC_WORD: Regex = Regex::new(r"\bstatic\b").unwrap();
    static ref VECTOR: Regex = Regex::new(r"\bVector\b").unwrap();
    static ref HASHTABLE: Regex = Regex::new(r"\bHashtable\b").unwrap();
    static ref I_PREFIXED_INTERFACE: Regex =
        Regex::new(r"^(?:(?:public|private|protected|abstract|static)\s+)*interface\s+I[A-Z]\w*").unwrap();
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

fn code_smells(source: &Source) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for (n, line) in source.numbered() {
        let content = line.trim();

        if opens_empty_catch(&source.lines, n) {
            out.push(Diagnostic::new(
                Category::Forbidden,
                n,
                "Empty catch block - handle exceptions properly",
            ));
        }
        if content.contains("System.out.println") {
            out.push(Diagnostic::new(
                Category::Forbidden,
                n,
                "Avoid System.out.println in production - use logging framework",
            ));
        }
        if STRING_EQ.is_match(content) {
            out.push(Diagnostic::new(
                Category::Refactor,
                n,
                "Use .equals() instead of == for String comparison",
            ));
        }
        if has_magic_number(content, &["//", "/*", "*"]) {
            out.push(Diagnostic::new(
                Category::Length,
                n,
                "Consider using named constants instead of magic numbers",
            ));
        }
        if let Some(len) = overlong(line, MAX_LINE) {
            out.push(Diagnostic::new(
                Category::Length,
                n,
                format!("Line too long ({} chars) - consider breaking it down", len),
            ));
        }
        if MULTI_DECL.is_match(content) {
            out.push(Diagnostic::new(
                Category::Hygiene,
                n,
                "Declare variables separately for better readability",
            ));
        }
        if RAW_COLLECTION.is_match(content) && !TYPE_ARGS.is_match(content) {
            out.push(Diagnostic::new(
                Category::Risk,
                n,
                "Use generics instead of raw types",
            ));
        }
        if IF_KEYWORD.find_iter(&code_only(content)).count() > 1 {
            out.push(Diagnostic::new(
                Category::Refactor,
                n,
                "Avoid nested if statements - consider using guard clauses",
            ));
        }
    }
    out
}

fn naming(source: &Source) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for (n, line) in source.numbered() {
        let content = line.trim();

        if let Some(caps) = LOWER_CLASS.captures(content) {
            out.push(Diagnostic::new(
                Category::Structure,
                n,
                format!("Class '{}' should use PascalCase naming", &caps[1]),
            ));
        }
        // A declaration with nothing but modifiers before the name is a
        // constructor.
        if let Some(caps) = PASCAL_METHOD.captures(content) {
            let has_return_type = caps[1]
                .split_whitespace()
                .any(|word| !MODIFIERS.contains(&word));
            if has_return_type {
                out.push(Diagnostic::new(
                    Category::Refactor,
                    n,
                    format!("Method '{}' should use camelCase naming", &caps[2]),
                ));
            }
        }
        for caps in PASCAL_VARIABLE.captures_iter(content) {
            if is_upper_snake(&caps[1]) {
                continue;
            }
            out.push(Diagnostic::new(
                Category::CamelCase,
                n,
                format!("Variable '{}' should use camelCase naming", &caps[1]),
            ));
        }
        for caps in LOWER_CONSTANT.captures_iter(content) {
            out.push(Diagnostic::new(
                Category::Constant,
                n,
                format!("Constant '{}' should use UPPER_CASE naming", &caps[1]),
            ));
        }
        if let Some(caps) = MIXED_PACKAGE.captures(content) {
            out.push(Diagnostic::new(
                Category::Hygiene,
                n,
                format!("Package '{}' should be lowercase", caps[1].trim()),
            ));
        }
    }
    out
}

fn security_performance(source: &Source) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for (n, line) in source.numbered() {
        let content = line.trim();

        if RUNTIME_EXEC.is_match(content) {
            out.push(Diagnostic::new(
                Category::Security,
                n,
                "Avoid Runtime.exec() - potential security risk",
            ));
        }
        if FOR_NAME.is_match(content) {
            out.push(Diagnostic::new(
                Category::Security,
                n,
                "Be cautious with Class.forName() - validate input",
            ));
        }
        if NEW_RANDOM.is_match(content) {
            out.push(Diagnostic::new(
                Category::Security,
                n,
                "Use SecureRandom instead of Random for security-sensitive operations",
            ));
        }

        if content.contains("+=") {
            let window = &source.lines[n.saturating_sub(CONCAT_WINDOW)..n];
            if window.iter().any(|l| STRING_WORD.is_match(l)) {
                out.push(Diagnostic::new(
                    Category::Performance,
                    n,
                    "Use StringBuilder instead of String concatenation in loops",
                ));
            }
        }
        if content.contains(".size()") && FOR_LOOP.is_match(content) {
            out.push(Diagnostic::new(
                Category::Performance,
                n,
                "Cache collection.size() in variable to avoid repeated calls",
            ));
        }
        if NEW_STRING.is_match(content) {
            out.push(Diagnostic::new(
                Category::Performance,
                n,
                "Avoid unnecessary String constructor - use string literals",
            ));
        }
        if NEW_WRAPPER.is_match(content) {
            out.push(Diagnostic::new(
                Category::Performance,
                n,
                "Use valueOf() instead of constructor for wrapper classes",
            ));
        }
    }
    out
}

fn spelling(source: &Source) -> Vec<Diagnostic> {
    SpellChecker::java().check(source)
}

fn best_practices(source: &Source) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for (n, line) in source.numbered() {
        let content = line.trim();

        if OVERRIDABLE.is_match(content) && !annotated_with(source, n, "@Override") {
            out.push(Diagnostic::new(
                Category::Documentation,
                n,
                "Consider adding @Override annotation",
            ));
        }
        if let Some(params) = declared_parameters(content) {
            if TYPED_PARAM.is_match(&params) && !params.contains("final") {
                out.push(Diagnostic::new(
                    Category::Refactor,
                    n,
                    "Consider making parameters final",
                ));
            }
        }
        if CLASS_WORD.is_match(content) && STATIC_WORD.is_match(content) {
            out.push(Diagnostic::new(
                Category::Structure,
                n,
                "Utility classes should have private constructor",
            ));
        }
        if content.starts_with("public")
            && content.contains('(')
            && content.contains(')')
            && !has_javadoc(source, n)
        {
            out.push(Diagnostic::new(
                Category::Documentation,
                n,
                "Public method missing Javadoc documentation",
            ));
        }
        if VECTOR.is_match(content) {
            out.push(Diagnostic::new(
                Category::Performance,
                n,
                "Use ArrayList instead of Vector (Vector is synchronized and slower)",
            ));
        }
        if HASHTABLE.is_match(content) {
            out.push(Diagnostic::new(
                Category::Performance,
                n,
                "Use HashMap instead of Hashtable (unless synchronization needed)",
            ));
        }
        if I_PREFIXED_INTERFACE.is_match(content) {
            out.push(Diagnostic::new(
                Category::Structure,
                n,
                "Avoid 'I' prefix for interfaces in Java",
            ));
        }
    }
    out
}

/// Preceding lines of the declaration on 1-based `line`, nearest first,
/// stopping at the first blank line.
fn preceding<'a>(lines: &'a [&'a str], line: usize) -> impl Iterator<Item = &'a str> + 'a {
    lines[..line.saturating_sub(1).min(lines.len())]
        .iter()
        .rev()
        .map(|l| l.trim())
        .take_while(|l| !l.is_empty())
}

fn annotated_with(source: &Source, line: usize, annotation: &str) -> bool {
    preceding(&source.lines, line)
        .take_while(|l| l.starts_with('@'))
        .any(|l| l.starts_with(annotation))
}

/// Whether a Javadoc block ends right above the declaration, skipping
/// annotations.
fn has_javadoc(source: &Source, line: usize) -> bool {
    preceding(&source.lines, line)
        .find(|l| !l.starts_with('@'))
        .is_some_and(|l| l.starts_with("/**") || l.ends_with("*/"))
}

/// Parameter list of a method or constructor declaration line.
fn declared_parameters(content: &str) -> Option<String> {
    let code = code_only(content);
    let caps = DECLARATION.captures(code.trim_end())?;
    let first_word = code.split_whitespace().next().unwrap_or_default();
    let first_word = first_word.split('(').next().unwrap_or_default();
    if NOT_DECLARATIONS.contains(&first_word) || NOT_DECLARATIONS.contains(&&caps[1]) {
        return None;
    }
    // A bare call such as `run(x)` has no return type or modifier.
    if code.trim_start().starts_with(&caps[1]) && !content.contains('{') {
        return None;
    }
    Some(caps[2].to_string())
}
