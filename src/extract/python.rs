//! Python extraction over a tree-sitter syntax tree.

use lazy_static::lazy_static;
use regex::Regex;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, Query, QueryCursor, Tree};

use super::Extractor;
use crate::error::{Error, Result, SyntaxError};
use crate::language::Language;
use crate::model::{
    EntityBase, Extraction, FieldEntity, GlobalEntity, MethodEntity, ParameterEntity, SourceModule,
    TypeEntity, TypeKind,
};

/// Every class definition, nested ones included.
const CLASS_QUERY: &str = "(class_definition name: (identifier) @name) @class";

lazy_static! {
    static ref LINE_BREAK_RUN: Regex = Regex::new(r"\s*\n\s*").unwrap();
}

/// A Python source text together with its syntax tree.
pub struct PythonTree {
    tree: Tree,
    source: String,
}

impl PythonTree {
    /// Parse `source`, failing with [`Error::Syntax`] when the tree
    /// contains error or missing nodes, or a construct that Python 3
    /// rejects but the grammar accepts.
    pub fn parse(source: &str) -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_python::LANGUAGE.into())?;
        let tree = parser.parse(source, None).ok_or(Error::ParseAborted)?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(Error::Syntax(syntax_error(root)));
        }
        if let Some(err) = rejected_construct(root) {
            return Err(Error::Syntax(err));
        }

        Ok(Self {
            tree,
            source: source.to_string(),
        })
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text covered by `node`.
    pub fn text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Node text with line breaks and their indentation folded to one space.
    fn value_text(&self, node: Node) -> String {
        LINE_BREAK_RUN.replace_all(self.text(node), " ").into_owned()
    }

    /// Cleaned docstring of a module or block, if its first statement is a
    /// plain string literal.
    pub fn docstring(&self, body: Node) -> Option<String> {
        let mut cursor = body.walk();
        let first = body
            .named_children(&mut cursor)
            .find(|n| n.kind() != "comment")?;
        if first.kind() != "expression_statement" || first.named_child_count() != 1 {
            return None;
        }

        let expr = first.named_child(0)?;
        let raw = match expr.kind() {
            "string" => string_value(self.text(expr))?,
            "concatenated_string" => {
                let mut cursor = expr.walk();
                let parts: Option<Vec<String>> = expr
                    .named_children(&mut cursor)
                    .filter(|n| n.kind() == "string")
                    .map(|n| string_value(self.text(n)))
                    .collect();
                parts?.concat()
            }
            _ => return None,
        };

        let cleaned = clean_docstring(&raw);
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }

    fn decorators(&self, node: Node) -> Vec<String> {
        let Some(parent) = node.parent().filter(|p| p.kind() == "decorated_definition") else {
            return Vec::new();
        };
        let mut cursor = parent.walk();
        let decorators = parent
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "decorator")
            .map(|n| self.text(n).trim_start_matches('@').trim().to_string())
            .collect();
        decorators
    }

    /// Build the entity for a `function_definition` node.
    pub fn function(&self, node: Node) -> MethodEntity {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        let doc = node.child_by_field_name("body").and_then(|b| self.docstring(b));
        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.parameters(p))
            .unwrap_or_default();

        MethodEntity {
            base: EntityBase {
                name,
                doc,
                decorators: self.decorators(node),
                ..EntityBase::default()
            },
            return_type: node
                .child_by_field_name("return_type")
                .map(|n| self.value_text(n)),
            is_async: node.child(0).map(|c| c.kind() == "async").unwrap_or(false),
            params,
            ..MethodEntity::default()
        }
    }

    /// Positional parameters (defaults right-aligned), then `*args`, then
    /// `**kwargs`. Keyword-only parameters are not listed.
    fn parameters(&self, node: Node) -> Vec<ParameterEntity> {
        let mut positional: Vec<(String, Option<String>)> = Vec::new();
        let mut defaults: Vec<String> = Vec::new();
        let mut var_args: Option<ParameterEntity> = None;
        let mut kw_args: Option<ParameterEntity> = None;
        let mut keyword_only = false;

        let mut cursor = node.walk();
        for param in node.named_children(&mut cursor) {
            let type_repr = param.child_by_field_name("type").map(|t| self.value_text(t));
            match param.kind() {
                "identifier" if !keyword_only => {
                    positional.push((self.text(param).to_string(), None));
                }
                "typed_parameter" => match param.named_child(0) {
                    Some(inner) if inner.kind() == "list_splat_pattern" => {
                        var_args = Some(self.splat(inner, "*", type_repr));
                        keyword_only = true;
                    }
                    Some(inner) if inner.kind() == "dictionary_splat_pattern" => {
                        kw_args = Some(self.splat(inner, "**", type_repr));
                    }
                    Some(inner) if !keyword_only => {
                        positional.push((self.text(inner).to_string(), type_repr));
                    }
                    _ => {}
                },
                "default_parameter" | "typed_default_parameter" if !keyword_only => {
                    let name = param
                        .child_by_field_name("name")
                        .map(|n| self.text(n).to_string())
                        .unwrap_or_default();
                    positional.push((name, type_repr));
                    if let Some(value) = param.child_by_field_name("value") {
                        defaults.push(self.value_text(value));
                    }
                }
                "list_splat_pattern" => {
                    var_args = Some(self.splat(param, "*", None));
                    keyword_only = true;
                }
                "dictionary_splat_pattern" => {
                    kw_args = Some(self.splat(param, "**", None));
                }
                "keyword_separator" => keyword_only = true,
                _ => {}
            }
        }

        let offset = positional.len().saturating_sub(defaults.len());
        let mut params: Vec<ParameterEntity> = positional
            .into_iter()
            .enumerate()
            .map(|(i, (name, type_repr))| ParameterEntity {
                name,
                type_repr,
                default: i.checked_sub(offset).and_then(|d| defaults.get(d).cloned()),
                ..ParameterEntity::default()
            })
            .collect();
        params.extend(var_args);
        params.extend(kw_args);
        params
    }

    fn splat(&self, node: Node, prefix: &str, type_repr: Option<String>) -> ParameterEntity {
        let bare = self.text(node).trim_start_matches('*');
        ParameterEntity {
            name: format!("{}{}", prefix, bare),
            type_repr,
            ..ParameterEntity::default()
        }
    }

    /// Simple-name bindings made by an assignment statement, in target
    /// order. `a = b = 1` binds both names to `1`.
    fn assignment_bindings(&self, statement: Node) -> Vec<(String, Option<String>, Option<String>)> {
        let Some(mut assignment) = statement
            .named_child(0)
            .filter(|n| n.kind() == "assignment")
        else {
            return Vec::new();
        };
        let annotation = assignment
            .child_by_field_name("type")
            .map(|t| self.value_text(t));

        let mut names = Vec::new();
        let value = loop {
            if let Some(left) = assignment.child_by_field_name("left") {
                if left.kind() == "identifier" {
                    names.push(self.text(left).to_string());
                }
            }
            match assignment.child_by_field_name("right") {
                Some(right) if right.kind() == "assignment" => assignment = right,
                Some(right) => break Some(self.value_text(right)),
                None => break None,
            }
        };

        names
            .into_iter()
            .map(|name| (name, annotation.clone(), value.clone()))
            .collect()
    }

    fn imports(&self) -> Vec<String> {
        let mut imports = Vec::new();
        self.collect_imports(self.root(), &mut imports);
        imports
    }

    fn collect_imports(&self, node: Node, imports: &mut Vec<String>) {
        match node.kind() {
            "import_statement" => {
                for name in self.field_nodes(node, "name") {
                    imports.push(format!("import {}", self.alias_text(name)));
                }
                return;
            }
            "import_from_statement" | "future_import_statement" => {
                let module = node
                    .child_by_field_name("module_name")
                    .map(|m| self.text(m).to_string())
                    .unwrap_or_else(|| "__future__".to_string());
                let mut cursor = node.walk();
                if node
                    .named_children(&mut cursor)
                    .any(|n| n.kind() == "wildcard_import")
                {
                    imports.push(format!("from {} import *", module));
                }
                for name in self.field_nodes(node, "name") {
                    imports.push(format!("from {} import {}", module, self.alias_text(name)));
                }
                return;
            }
            _ => {}
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            self.collect_imports(child, imports);
        }
    }

    fn field_nodes<'t>(&self, node: Node<'t>, field: &str) -> Vec<Node<'t>> {
        let mut cursor = node.walk();
        let nodes = node.children_by_field_name(field, &mut cursor).collect();
        nodes
    }

    /// `name` or `name as alias`.
    fn alias_text(&self, node: Node) -> String {
        if node.kind() != "aliased_import" {
            return self.text(node).to_string();
        }
        let name = node.child_by_field_name("name").map(|n| self.text(n)).unwrap_or("");
        match node.child_by_field_name("alias") {
            Some(alias) => format!("{} as {}", name, self.text(alias)),
            None => name.to_string(),
        }
    }

    fn globals(&self) -> Vec<GlobalEntity> {
        let root = self.root();
        let mut cursor = root.walk();
        let statements: Vec<Node> = root
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "expression_statement")
            .collect();

        statements
            .into_iter()
            .flat_map(|stmt| self.assignment_bindings(stmt))
            .map(|(name, annotation, value)| match annotation {
                Some(type_repr) => GlobalEntity {
                    name,
                    type_repr,
                    value,
                },
                None => GlobalEntity {
                    name,
                    type_repr: "Any".to_string(),
                    value: Some(value.unwrap_or_else(|| "None".to_string())),
                },
            })
            .collect()
    }

    fn classes(&self) -> Result<Vec<TypeEntity>> {
        let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
        let query = Query::new(&language, CLASS_QUERY)?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, self.root(), self.source.as_bytes());

        let mut classes = Vec::new();
        while let Some(m) = matches.next() {
            for capture in m.captures {
                if query.capture_names()[capture.index as usize] == "class" {
                    classes.push(self.class(capture.node));
                }
            }
        }
        Ok(classes)
    }

    fn class(&self, node: Node) -> TypeEntity {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        let body = node.child_by_field_name("body");

        let mut entity = TypeEntity::new(
            TypeKind::Class,
            EntityBase {
                name,
                doc: body.and_then(|b| self.docstring(b)),
                decorators: self.decorators(node),
                ..EntityBase::default()
            },
        );

        if let Some(bases) = node.child_by_field_name("superclasses") {
            let mut cursor = bases.walk();
            entity.extends = bases
                .named_children(&mut cursor)
                .filter(|n| {
                    !matches!(
                        n.kind(),
                        "keyword_argument" | "dictionary_splat" | "comment"
                    )
                })
                .map(|n| self.value_text(n))
                .collect();
        }

        let Some(body) = body else {
            return entity;
        };
        let mut cursor = body.walk();
        let items: Vec<Node> = body.named_children(&mut cursor).collect();
        for item in items {
            match item.kind() {
                "function_definition" => entity.methods.push(self.function(item)),
                "decorated_definition" => {
                    if let Some(def) = item
                        .child_by_field_name("definition")
                        .filter(|d| d.kind() == "function_definition")
                    {
                        entity.methods.push(self.function(def));
                    }
                }
                "expression_statement" => {
                    for (name, annotation, value) in self.assignment_bindings(item) {
                        entity.fields.push(FieldEntity {
                            name,
                            type_repr: annotation.unwrap_or_else(|| "Any".to_string()),
                            value,
                            ..FieldEntity::default()
                        });
                    }
                }
                _ => {}
            }
        }
        entity
    }

    /// Functions defined directly at module level.
    fn functions(&self) -> Vec<MethodEntity> {
        let root = self.root();
        let mut cursor = root.walk();
        let nodes: Vec<Node> = root
            .named_children(&mut cursor)
            .filter_map(|n| match n.kind() {
                "function_definition" => Some(n),
                "decorated_definition" => n
                    .child_by_field_name("definition")
                    .filter(|d| d.kind() == "function_definition"),
                _ => None,
            })
            .collect();
        nodes.into_iter().map(|n| self.function(n)).collect()
    }

    fn module(&self) -> Result<SourceModule> {
        let mut module = SourceModule::new(Language::Python);
        module.doc = self.docstring(self.root());
        module.imports = self.imports();
        module.globals = self.globals();
        module.types = self.classes()?;
        module.functions = self.functions();
        Ok(module)
    }
}

/// Locate the first error or missing node in pre-order.
fn syntax_error(root: Node) -> SyntaxError {
    let node = first_error(root).unwrap_or(root);
    let position = node.start_position();
    let detail = if node.is_missing() {
        format!("missing {}", node.kind())
    } else {
        "invalid syntax".to_string()
    };
    SyntaxError {
        line: position.row + 1,
        column: position.column + 1,
        detail,
    }
}

/// First node, in document order, that the grammar accepts but the
/// Python 3 compiler does not: `print`/`exec` statements, and a plain
/// positional parameter after one with a default.
fn rejected_construct(root: Node) -> Option<SyntaxError> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let rejected = match node.kind() {
            "print_statement" => Some((node, "missing parentheses in call to 'print'")),
            "exec_statement" => Some((node, "missing parentheses in call to 'exec'")),
            "parameters" | "lambda_parameters" => misplaced_default(node)
                .map(|param| (param, "non-default argument follows default argument")),
            _ => None,
        };
        if let Some((at, detail)) = rejected {
            let position = at.start_position();
            return Some(SyntaxError {
                line: position.row + 1,
                column: position.column + 1,
                detail: detail.to_string(),
            });
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

/// Positional parameter without a default that follows one with a default.
/// Parameters after `*` or `*args` are keyword-only and exempt.
fn misplaced_default(params: Node) -> Option<Node> {
    let mut seen_default = false;
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        match param.kind() {
            "default_parameter" | "typed_default_parameter" => seen_default = true,
            "identifier" if seen_default => return Some(param),
            "typed_parameter" => match param.named_child(0).map(|n| n.kind()) {
                Some("list_splat_pattern" | "dictionary_splat_pattern") => return None,
                _ if seen_default => return Some(param),
                _ => {}
            },
            "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => {
                return None
            }
            _ => {}
        }
    }
    None
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Value of a plain string literal; `None` for f-strings and bytes.
fn string_value(raw: &str) -> Option<String> {
    let quote_at = raw.find(['"', '\''])?;
    let prefix = raw[..quote_at].to_ascii_lowercase();
    if prefix.contains('f') || prefix.contains('b') {
        return None;
    }

    let literal = &raw[quote_at..];
    let delimiter = if literal.starts_with("\"\"\"") || literal.starts_with("'''") {
        &literal[..3]
    } else {
        &literal[..1]
    };
    let inner = literal
        .strip_prefix(delimiter)?
        .strip_suffix(delimiter)
        .unwrap_or("");

    if prefix.contains('r') {
        Some(inner.to_string())
    } else {
        Some(unescape(inner))
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\n') => {}
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Strip the common indentation of continuation lines and surrounding
/// blank lines.
fn clean_docstring(text: &str) -> String {
    let expanded = text.replace('\t', "        ");
    let lines: Vec<&str> = expanded.split('\n').collect();
    let margin = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = Vec::with_capacity(lines.len());
    cleaned.push(lines[0].trim_start());
    for line in lines.iter().skip(1) {
        cleaned.push(line.get(margin..).unwrap_or("").trim_end());
    }

    while cleaned.last().map(|l| l.trim().is_empty()).unwrap_or(false) {
        cleaned.pop();
    }
    let leading = cleaned.iter().take_while(|l| l.trim().is_empty()).count();
    cleaned[leading..].join("\n")
}

/// Python extractor.
pub struct PythonExtractor;

impl Extractor for PythonExtractor {
    fn language(&self) -> Language {
        Language::Python
    }

    fn extract(&self, source: &str) -> Result<Extraction> {
        let tree = match PythonTree::parse(source) {
            Ok(tree) => tree,
            Err(Error::Syntax(err)) => {
                tracing::debug!(line = err.line, "python source did not parse");
                return Ok(Extraction::SyntaxError(err));
            }
            Err(e) => return Err(e),
        };

        let module = tree.module()?;
        tracing::debug!(
            imports = module.imports.len(),
            classes = module.types.len(),
            functions = module.functions.len(),
            "extracted python module"
        );
        Ok(Extraction::Module(module))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> SourceModule {
        match PythonExtractor.extract(source).unwrap() {
            Extraction::Module(m) => m,
            Extraction::SyntaxError(e) => panic!("unexpected syntax error: {}", e),
        }
    }

    #[test]
    fn test_module_docstring_is_cleaned() {
        let module = extract("\"\"\"Top line.\n\n    Indented detail.\n    \"\"\"\nx = 1\n");
        assert_eq!(module.doc.as_deref(), Some("Top line.\n\nIndented detail."));
    }

    #[test]
    fn test_fstring_is_not_a_docstring() {
        let module = extract("f\"nope\"\n");
        assert_eq!(module.doc, None);
    }

    #[test]
    fn test_imports_canonical_forms() {
        let module = extract(
            "import os\nimport numpy as np, sys\nfrom typing import List, Dict as D\nfrom pkg import *\n\ndef f():\n    import json\n",
        );
        assert_eq!(
            module.imports,
            vec![
                "import os",
                "import numpy as np",
                "import sys",
                "from typing import List",
                "from typing import Dict as D",
                "from pkg import *",
                "import json",
            ]
        );
    }

    #[test]
    fn test_globals() {
        let module = extract("A = B = 1\nname: str = 'x'\ncount: int\nx, y = 1, 2\nz += 1\n");
        let rendered: Vec<(String, String, Option<String>)> = module
            .globals
            .iter()
            .map(|g| (g.name.clone(), g.type_repr.clone(), g.value.clone()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("A".to_string(), "Any".to_string(), Some("1".to_string())),
                ("B".to_string(), "Any".to_string(), Some("1".to_string())),
                ("name".to_string(), "str".to_string(), Some("'x'".to_string())),
                ("count".to_string(), "int".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_default_alignment() {
        let module = extract("def f(a, b=1, c=2):\n    pass\n");
        let f = module.find_function("f").unwrap();
        let defaults: Vec<Option<&str>> = f.params.iter().map(|p| p.default.as_deref()).collect();
        assert_eq!(defaults, vec![None, Some("1"), Some("2")]);
    }

    #[test]
    fn test_parameters_with_splats() {
        let module = extract(
            "async def f(a: int, *args: str, key=3, **kwargs) -> bool:\n    \"\"\"Doc.\"\"\"\n",
        );
        let f = module.find_function("f").unwrap();
        assert!(f.is_async);
        assert_eq!(f.return_type.as_deref(), Some("bool"));
        assert_eq!(f.base.doc.as_deref(), Some("Doc."));
        let names: Vec<&str> = f.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "*args", "**kwargs"]);
        assert_eq!(f.params[0].type_repr.as_deref(), Some("int"));
        assert_eq!(f.params[1].type_repr.as_deref(), Some("str"));
    }

    #[test]
    fn test_classes_include_nested_and_methods() {
        let source = r#"
@dataclass
class Outer(Base, metaclass=Meta):
    """Outer doc."""
    size = 3
    label: str = None

    @property
    def area(self):
        return 1

    class Inner:
        pass

def top():
    pass
"#;
        let module = extract(source);
        let names: Vec<&str> = module.types.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Outer", "Inner"]);

        let outer = &module.types[0];
        assert_eq!(outer.extends, vec!["Base"]);
        assert_eq!(outer.base.decorators, vec!["dataclass"]);
        assert_eq!(outer.base.doc.as_deref(), Some("Outer doc."));
        assert_eq!(outer.fields.len(), 2);
        assert_eq!(outer.fields[1].type_repr, "str");
        assert_eq!(outer.methods.len(), 1);
        assert_eq!(outer.methods[0].base.decorators, vec!["property"]);

        let functions: Vec<&str> = module.functions.iter().map(|f| f.name()).collect();
        assert_eq!(functions, vec!["top"]);
    }

    #[test]
    fn test_syntax_error_is_sentinel() {
        let extraction = PythonExtractor.extract("def f(:").unwrap();
        match extraction {
            Extraction::SyntaxError(err) => {
                assert_eq!(err.line, 1);
                assert!(!err.detail.is_empty());
            }
            Extraction::Module(_) => panic!("expected syntax error"),
        }
    }

    fn syntax_error_of(source: &str) -> SyntaxError {
        match PythonExtractor.extract(source).unwrap() {
            Extraction::SyntaxError(err) => err,
            Extraction::Module(_) => panic!("expected syntax error for {:?}", source),
        }
    }

    #[test]
    fn test_python2_statements_are_syntax_errors() {
        let err = syntax_error_of("print \"hello\"\n");
        assert_eq!((err.line, err.column), (1, 1));
        assert!(err.detail.contains("'print'"));

        let err = syntax_error_of("x = 1\nexec \"x\"\n");
        assert_eq!((err.line, err.column), (2, 1));
        assert!(err.detail.contains("'exec'"));
    }

    #[test]
    fn test_non_default_after_default_is_syntax_error() {
        let err = syntax_error_of("def f(a=1, b):\n    pass\n");
        assert_eq!((err.line, err.column), (1, 12));
        assert_eq!(err.detail, "non-default argument follows default argument");

        let err = syntax_error_of("g = lambda a=1, b: a\n");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_keyword_only_after_default_parses() {
        let module = extract("def f(a=1, *, b):\n    pass\n\ndef g(a=1, *rest, b, **kw):\n    pass\n");
        let names: Vec<&str> = module.functions.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["f", "g"]);

        let module = extract("print(\"hello\")\ndef h(a, b=1, c: int = 2):\n    pass\n");
        assert_eq!(module.functions.len(), 1);
    }
}
