//! Python analyzer battery.

use lazy_static::lazy_static;
use regex::Regex;
use tree_sitter::Node;

use super::common::{has_magic_number, overlong};
use super::runner::{run, Battery, Source};
use super::spelling::SpellChecker;
use super::{Category, Diagnostic};
use crate::error::Error;
use crate::extract::PythonTree;

const MAX_LINE: usize = 100;
const MAX_POSITIONAL: usize = 5;
const MAX_NESTING: usize = 3;

/// Control blocks that count toward nesting depth.
const NESTING_KINDS: &[&str] = &[
    "if_statement",
    "for_statement",
    "while_statement",
    "with_statement",
    "try_statement",
];

/// Nodes passed through when looking for nested control blocks.
const NESTING_TRANSPARENT: &[&str] = &[
    "block",
    "else_clause",
    "except_clause",
    "except_group_clause",
    "finally_clause",
];

lazy_static! {
    static ref EQ_NONE: Regex = Regex::new(r"==\s*None\b|\bNone\s*==").unwrap();
    static ref NE_NONE: Regex = Regex::new(r"!=\s*None\b|\bNone\s*!=").unwrap();
    static ref PRINT_CALL: Regex = Regex::new(r"\bprint\s*\(").unwrap();
    static ref MULTI_IMPORT: Regex =
        Regex::new(r"^\s*import\s+[\w.]+(?:\s+as\s+\w+)?\s*,").unwrap();
    static ref BARE_EXCEPT: Regex = Regex::new(r"\bexcept\s*:").unwrap();
    static ref LIST_DEFAULT: Regex = Regex::new(r"def\s+\w+\([^)]*=\s*\[\]").unwrap();
    static ref DICT_DEFAULT: Regex = Regex::new(r"def\s+\w+\([^)]*=\s*\{\}").unwrap();
    static ref GLOBAL_STMT: Regex = Regex::new(r"^\s*global\s+\w+").unwrap();
    static ref PASCAL_DEF: Regex = Regex::new(r"\bdef\s+([A-Z]\w*)").unwrap();
    static ref LOWER_CLASS: Regex = Regex::new(r"\bclass\s+([a-z]\w*)").unwrap();
    static ref STRING_CONSTANT: Regex =
        Regex::new(r#"^([a-z]\w*)\s*=\s*['"]\w+['"]\s*$"#).unwrap();
    static ref EVAL_CALL: Regex = Regex::new(r"\beval\s*\(").unwrap();
    static ref EXEC_CALL: Regex = Regex::new(r"\bexec\s*\(").unwrap();
    static ref INPUT_CALL: Regex = Regex::new(r"\binput\s*\(").unwrap();
    static ref INT_CALL: Regex = Regex::new(r"\bint\s*\(").unwrap();
    static ref STRING_APPEND: Regex = Regex::new(r#"\+=\s*(?:[rRbBuUfF]{0,2}["']|str\s*\()"#).unwrap();
    static ref RANGE_LEN: Regex = Regex::new(r"\bfor\s+\w+\s+in\s+range\(len\(").unwrap();
    static ref KEYS_MEMBERSHIP: Regex = Regex::new(r"\bin\s+[\w.\[\]()]*\.keys\(\)").unwrap();
}

static BATTERY: &Battery = &[
    ("code_smells", code_smells),
    ("naming", naming),
    ("security_performance", security_performance),
    ("spelling", spelling),
];

/// Run the line battery, then the syntax-tree pass.
///
/// Text that does not parse keeps its line diagnostics and gains one
/// diagnostic at the position of the first error.
pub fn analyze(source: &Source) -> Vec<Diagnostic> {
    let mut diagnostics = run(source, BATTERY);
    match PythonTree::parse(source.text) {
        Ok(tree) => diagnostics.extend(tree_issues(&tree)),
        Err(Error::Syntax(err)) => {
            tracing::debug!(%err, "python text did not parse");
            diagnostics.push(Diagnostic::new(
                Category::Risk,
                err.line,
                "Syntax error detected - code cannot be parsed",
            ));
        }
        Err(err) => {
            tracing::warn!(%err, "python tree pass skipped");
            diagnostics.push(Diagnostic::unattributed(
                Category::Risk,
                "Syntax error detected - code cannot be parsed",
            ));
        }
    }
    diagnostics
}

fn code_smells(source: &Source) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for (n, line) in source.numbered() {
        if EQ_NONE.is_match(line) {
            out.push(Diagnostic::new(
                Category::Refactor,
                n,
                "Use 'is None' instead of '== None' for None comparisons",
            ));
        }
        if NE_NONE.is_match(line) {
            out.push(Diagnostic::new(
                Category::Refactor,
                n,
                "Use 'is not None' instead of '!= None' for None comparisons",
            ));
        }
        if PRINT_CALL.is_match(line) {
            out.push(Diagnostic::new(
                Category::Forbidden,
                n,
                "Avoid using print statements in production code - use logging instead",
            ));
        }
        if let Some(len) = overlong(line, MAX_LINE) {
            out.push(Diagnostic::new(
                Category::Length,
                n,
                format!("Line is too long ({} chars) - consider breaking it down", len),
            ));
        }
        if has_magic_number(line, &["#"]) {
            out.push(Diagnostic::new(
                Category::Length,
                n,
                "Consider using named constants instead of magic numbers",
            ));
        }
        if MULTI_IMPORT.is_match(line) {
            out.push(Diagnostic::new(
                Category::Hygiene,
                n,
                "Use separate import statements for better readability",
            ));
        }
        if BARE_EXCEPT.is_match(line) {
            out.push(Diagnostic::new(
                Category::Risk,
                n,
                "Avoid bare 'except:' clauses - specify exception types",
            ));
        }
        if LIST_DEFAULT.is_match(line) {
            out.push(Diagnostic::new(
                Category::Defect,
                n,
                "Avoid mutable default arguments (list) - use None instead",
            ));
        }
        if DICT_DEFAULT.is_match(line) {
            out.push(Diagnostic::new(
                Category::Defect,
                n,
                "Avoid mutable default arguments (dict) - use None instead",
            ));
        }
        if GLOBAL_STMT.is_match(line) {
            out.push(Diagnostic::new(
                Category::Scope,
                n,
                "Avoid using global variables - consider class attributes or function parameters",
            ));
        }
    }
    out
}

fn naming(source: &Source) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for (n, line) in source.numbered() {
        for caps in PASCAL_DEF.captures_iter(line) {
            out.push(Diagnostic::new(
                Category::CamelCase,
                n,
                format!("Function '{}' should use snake_case naming convention", &caps[1]),
            ));
        }
        for caps in LOWER_CLASS.captures_iter(line) {
            out.push(Diagnostic::new(
                Category::Structure,
                n,
                format!("Class '{}' should use PascalCase naming convention", &caps[1]),
            ));
        }
        if let Some(caps) = STRING_CONSTANT.captures(line.trim_end_matches('\r')) {
            out.push(Diagnostic::new(
                Category::Constant,
                n,
                format!("Constant '{}' should use UPPER_CASE naming convention", &caps[1]),
            ));
        }
    }
    out
}

fn security_performance(source: &Source) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for (n, line) in source.numbered() {
        if EVAL_CALL.is_match(line) {
            out.push(Diagnostic::new(
                Category::Security,
                n,
                "Avoid using eval() - it's a security risk",
            ));
        }
        if EXEC_CALL.is_match(line) {
            out.push(Diagnostic::new(
                Category::Security,
                n,
                "Avoid using exec() - it's a security risk",
            ));
        }
        if INPUT_CALL.is_match(line) && INT_CALL.is_match(line) {
            out.push(Diagnostic::new(
                Category::Security,
                n,
                "Validate user input before converting to int",
            ));
        }
        if STRING_APPEND.is_match(line) {
            out.push(Diagnostic::new(
                Category::Performance,
                n,
                "For string concatenation in loops, consider using join() or f-strings",
            ));
        }
        if RANGE_LEN.is_match(line) {
            out.push(Diagnostic::new(
                Category::Performance,
                n,
                "Consider using enumerate() instead of range(len())",
            ));
        }
        if KEYS_MEMBERSHIP.is_match(line) {
            out.push(Diagnostic::new(
                Category::Performance,
                n,
                "Use 'key in dict' instead of 'key in dict.keys()'",
            ));
        }
    }
    out
}

fn spelling(source: &Source) -> Vec<Diagnostic> {
    SpellChecker::python().check(source)
}

/// Docstring, parameter-count and nesting checks over the syntax tree,
/// in document order.
fn tree_issues(tree: &PythonTree) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let mut stack = vec![tree.root()];
    while let Some(node) = stack.pop() {
        let line = node.start_position().row + 1;
        match node.kind() {
            "function_definition" => {
                let function = tree.function(node);
                if function.base.doc.is_none() {
                    out.push(Diagnostic::new(
                        Category::Documentation,
                        line,
                        format!("Function '{}' is missing a docstring", function.name()),
                    ));
                }
                let positional = function
                    .params
                    .iter()
                    .filter(|p| !p.name.starts_with('*'))
                    .count();
                if positional > MAX_POSITIONAL {
                    out.push(Diagnostic::new(
                        Category::Refactor,
                        line,
                        format!(
                            "Function '{}' has too many parameters ({}) - consider refactoring",
                            function.name(),
                            positional
                        ),
                    ));
                }
            }
            "class_definition" => {
                let documented = node
                    .child_by_field_name("body")
                    .and_then(|body| tree.docstring(body))
                    .is_some();
                if !documented {
                    let name = node
                        .child_by_field_name("name")
                        .map(|n| tree.text(n))
                        .unwrap_or_default();
                    out.push(Diagnostic::new(
                        Category::Documentation,
                        line,
                        format!("Class '{}' is missing a docstring", name),
                    ));
                }
            }
            kind if kind == "elif_clause" || NESTING_KINDS.contains(&kind) => {
                let depth = nesting_depth(node);
                if depth > MAX_NESTING {
                    out.push(Diagnostic::new(
                        Category::Refactor,
                        line,
                        format!(
                            "Code block has deep nesting (depth: {}) - consider extracting to separate functions",
                            depth
                        ),
                    ));
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    out
}

/// Deepest chain of control blocks nested inside `node`, not counting
/// `node` itself.
///
/// Each `elif` arm sits one level below the arm before it, so a long
/// `elif` chain nests as deeply as the equivalent `else: if` ladder.
fn nesting_depth(node: Node) -> usize {
    match node.kind() {
        "if_statement" => arm_depth(node, 0),
        "elif_clause" => node
            .parent()
            .and_then(|parent| {
                elif_arms(parent)
                    .iter()
                    .position(|arm| arm.id() == node.id())
                    .map(|i| arm_depth(parent, i + 1))
            })
            .unwrap_or_else(|| block_depth(node)),
        _ => block_depth(node),
    }
}

fn block_depth(node: Node) -> usize {
    let mut deepest = 0;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        let kind = child.kind();
        if NESTING_KINDS.contains(&kind) {
            deepest = deepest.max(1 + nesting_depth(child));
        } else if NESTING_TRANSPARENT.contains(&kind) {
            deepest = deepest.max(block_depth(child));
        }
    }
    deepest
}

fn elif_arms(if_node: Node) -> Vec<Node> {
    let mut cursor = if_node.walk();
    let arms = if_node
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "elif_clause")
        .collect();
    arms
}

/// Depth below arm `index` of an `if` statement, where arm 0 is the `if`
/// body and arm `i` is the `i`th `elif`. The `else` body belongs to the
/// last arm.
fn arm_depth(if_node: Node, index: usize) -> usize {
    let arms = elif_arms(if_node);
    let body = match index {
        0 => if_node.child_by_field_name("consequence"),
        i => arms.get(i - 1).and_then(|arm| arm.child_by_field_name("consequence")),
    };
    let mut deepest = body.map(block_depth).unwrap_or(0);
    if index < arms.len() {
        deepest = deepest.max(1 + arm_depth(if_node, index + 1));
    } else {
        let mut cursor = if_node.walk();
        let otherwise = if_node
            .named_children(&mut cursor)
            .find(|n| n.kind() == "else_clause");
        if let Some(otherwise) = otherwise {
            deepest = deepest.max(block_depth(otherwise));
        }
    }
    deepest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(text: &str) -> Vec<String> {
        analyze(&Source::new(text))
            .iter()
            .map(|d| d.to_string())
            .collect()
    }

    fn has(text: &str, expected: &str) -> bool {
        messages(text).iter().any(|m| m == expected)
    }

    #[test]
    fn test_mutable_default_list() {
        assert!(has(
            "def f(a, b=[]):\n    pass\n",
            "🐛 Line 1: Avoid mutable default arguments (list) - use None instead"
        ));
        assert!(has(
            "def f(a, b={}):\n    pass\n",
            "🐛 Line 1: Avoid mutable default arguments (dict) - use None instead"
        ));
    }

    #[test]
    fn test_missing_class_docstring() {
        let out = messages("class Foo:\n    pass\n");
        assert!(out.contains(&"📚 Line 1: Class 'Foo' is missing a docstring".to_string()));
    }

    #[test]
    fn test_documented_definitions_pass() {
        let text = "class Foo:\n    \"\"\"Doc.\"\"\"\n\n    def run(self):\n        \"\"\"Run.\"\"\"\n";
        assert!(!messages(text).iter().any(|m| m.starts_with("📚")));
    }

    #[test]
    fn test_async_function_docstring() {
        assert!(has(
            "async def fetch():\n    return 1\n",
            "📚 Line 1: Function 'fetch' is missing a docstring"
        ));
    }

    #[test]
    fn test_syntax_error_keeps_line_diagnostics() {
        let out = messages("print(1)\ndef f(:\n");
        assert_eq!(
            out.first().map(String::as_str),
            Some("🚫 Line 1: Avoid using print statements in production code - use logging instead")
        );
        let last = out.last().unwrap();
        assert!(last.starts_with("⚠️ Line "));
        assert!(last.ends_with("Syntax error detected - code cannot be parsed"));
    }

    #[test]
    fn test_too_many_parameters() {
        let text = "def f(a, b, c, d, e, g, *rest):\n    \"\"\"Doc.\"\"\"\n";
        assert!(has(
            text,
            "🔧 Line 1: Function 'f' has too many parameters (6) - consider refactoring"
        ));
        let text = "def f(a, b, c, d, e, *rest, **kw):\n    \"\"\"Doc.\"\"\"\n";
        assert!(!messages(text).iter().any(|m| m.contains("too many parameters")));
    }

    #[test]
    fn test_nesting_depth_four_reports_once() {
        let text = "\
def f(x):
    \"\"\"Doc.\"\"\"
    if x:
        for i in x:
            while i:
                with open(i) as fh:
                    try:
                        pass
                    except ValueError:
                        pass
";
        let nesting: Vec<String> = messages(text)
            .into_iter()
            .filter(|m| m.contains("deep nesting"))
            .collect();
        assert_eq!(
            nesting,
            vec!["🔧 Line 3: Code block has deep nesting (depth: 4) - consider extracting to separate functions"]
        );
    }

    #[test]
    fn test_nesting_depth_three_is_fine() {
        let text = "\
if a:
    if b:
        if c:
            if d:
                pass
";
        assert!(!messages(text).iter().any(|m| m.contains("deep nesting")));
    }

    #[test]
    fn test_elif_chain_nests_one_level_per_arm() {
        let text = "\
def f(a):
    if a == 1:
        pass
    elif a == 2:
        pass
    elif a == 3:
        pass
    elif a == 4:
        pass
    elif a == 5:
        pass
";
        assert_eq!(
            messages(text),
            vec![
                "📚 Line 1: Function 'f' is missing a docstring",
                "🔧 Line 2: Code block has deep nesting (depth: 4) - consider extracting to separate functions",
            ]
        );
    }

    #[test]
    fn test_short_elif_chain_with_else_is_fine() {
        let text = "\
if a == 1:
    pass
elif a == 2:
    pass
elif a == 3:
    pass
else:
    pass
";
        assert!(!messages(text).iter().any(|m| m.contains("deep nesting")));
    }

    #[test]
    fn test_nesting_inside_late_elif_arm() {
        let text = "\
if a:
    pass
elif b:
    pass
elif c:
    for i in c:
        while i:
            pass
";
        let nesting: Vec<String> = messages(text)
            .into_iter()
            .filter(|m| m.contains("deep nesting"))
            .collect();
        assert_eq!(
            nesting,
            vec!["🔧 Line 1: Code block has deep nesting (depth: 4) - consider extracting to separate functions"]
        );
    }

    #[test]
    fn test_naming_conventions() {
        let out = messages("def DoThing():\n    '''Doc.'''\nclass widget:\n    '''Doc.'''\nname = 'value'\n");
        assert!(out.contains(&"🐍 Line 1: Function 'DoThing' should use snake_case naming convention".to_string()));
        assert!(out.contains(&"🏗️ Line 3: Class 'widget' should use PascalCase naming convention".to_string()));
        assert!(out.contains(&"🔢 Line 5: Constant 'name' should use UPPER_CASE naming convention".to_string()));
    }

    #[test]
    fn test_security_and_performance() {
        let text = "x = eval(s)\nn = int(input())\nfor i in range(len(xs)):\n    out += 'a'\nif k in d.keys():\n    pass\n";
        let out = messages(text);
        assert!(out.contains(&"🔒 Line 1: Avoid using eval() - it's a security risk".to_string()));
        assert!(out.contains(&"🔒 Line 2: Validate user input before converting to int".to_string()));
        assert!(out.contains(&"⚡ Line 3: Consider using enumerate() instead of range(len())".to_string()));
        assert!(out.contains(
            &"⚡ Line 4: For string concatenation in loops, consider using join() or f-strings".to_string()
        ));
        assert!(out.contains(&"⚡ Line 5: Use 'key in dict' instead of 'key in dict.keys()'".to_string()));
    }

    #[test]
    fn test_code_smells() {
        let text = "import os, sys\nif x == None:\n    pass\ntry:\n    pass\nexcept:\n    pass\n";
        let out = messages(text);
        assert!(out.contains(&"📦 Line 1: Use separate import statements for better readability".to_string()));
        assert!(out.contains(
            &"🔧 Line 2: Use 'is None' instead of '== None' for None comparisons".to_string()
        ));
        assert!(out.contains(&"⚠️ Line 6: Avoid bare 'except:' clauses - specify exception types".to_string()));
        assert!(!has(
            "from os import path, sep\n",
            "📦 Line 1: Use separate import statements for better readability"
        ));
    }

    #[test]
    fn test_global_statement_inside_function() {
        let text = "def f():\n    '''Doc.'''\n    global counter\n";
        assert!(has(
            text,
            "🌐 Line 3: Avoid using global variables - consider class attributes or function parameters"
        ));
    }

    #[test]
    fn test_line_numbers_count_blank_and_comment_lines() {
        let text = "# header\n\n\nprint('x')\n";
        assert!(has(
            text,
            "🚫 Line 4: Avoid using print statements in production code - use logging instead"
        ));
    }
}
