//! JavaScript extraction.
//!
//! JSDoc blocks are harvested first and blanked out of the text used for
//! structural scanning. Offsets and line numbers of the blanked text match
//! the input exactly.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::scan::{self, BraceDepths, DocComments, LineIndex};
use super::Extractor;
use crate::error::Result;
use crate::language::Language;
use crate::model::{
    EntityBase, Extraction, GlobalEntity, MethodEntity, ParameterEntity, SourceModule, TypeEntity,
    TypeKind,
};

/// Lines searched above a declaration for its JSDoc.
pub const DOC_LOOKBACK: usize = 5;

/// Characters taken when a function's end cannot be found.
const EXTENT_FALLBACK: usize = 200;

const PARAM_PAIRS: &[(u8, u8)] = &[(b'{', b'}'), (b'[', b']'), (b'(', b')')];

const NOT_METHODS: &[&str] = &["constructor", "if", "for", "while", "switch", "catch", "function"];

/// How an import pattern renders its match.
#[derive(Clone, Copy)]
enum ImportForm {
    Verbatim,
    RequireDestructured,
    Require,
}

lazy_static! {
    static ref IMPORTS: Vec<(Regex, ImportForm)> = vec![
        (
            Regex::new(r#"import\s+\{([^}]+)\}\s+from\s+['"]([^'"]+)['"]"#).unwrap(),
            ImportForm::Verbatim
        ),
        (
            Regex::new(r#"import\s+([^,\s{*'"]+)\s+from\s+['"]([^'"]+)['"]"#).unwrap(),
            ImportForm::Verbatim
        ),
        (
            Regex::new(r#"import\s+\*\s+as\s+(\w+)\s+from\s+['"]([^'"]+)['"]"#).unwrap(),
            ImportForm::Verbatim
        ),
        (
            Regex::new(r#"import\s+['"]([^'"]+)['"]"#).unwrap(),
            ImportForm::Verbatim
        ),
        (
            Regex::new(r#"const\s+\{([^}]+)\}\s*=\s*require\(['"]([^'"]+)['"]\)"#).unwrap(),
            ImportForm::RequireDestructured
        ),
        (
            Regex::new(r#"const\s+(\w+)\s*=\s*require\(['"]([^'"]+)['"]\)"#).unwrap(),
            ImportForm::Require
        ),
    ];
    static ref EXPORTS: Vec<Regex> = vec![
        Regex::new(r"export\s+default\s+\w+").unwrap(),
        Regex::new(r"export\s+\{([^}]+)\}").unwrap(),
        Regex::new(r"export\s+(?:const|let|var|function|class)\s+(\w+)").unwrap(),
        Regex::new(r"module\.exports\s*=\s*([^;]+)").unwrap(),
    ];
    static ref VARIABLE: Regex = Regex::new(r"\b(const|let|var)\s+(\w+)\s*=\s*([^;,\n]+)").unwrap();
    static ref CLASS_HEADER: Regex =
        Regex::new(r"\bclass\s+(\w+)(?:\s+extends\s+(\w+))?\s*\{").unwrap();
    static ref METHOD: Regex =
        Regex::new(r"(?:(static)\s+)?(?:(async)\s+)?(\w+)\s*\([^)]*\)\s*\{").unwrap();
    static ref CONSTRUCTOR: Regex = Regex::new(r"constructor\s*\(([^)]*)\)\s*\{").unwrap();
    static ref FUNCTIONS: Vec<Regex> = vec![
        Regex::new(r"(?:async\s+)?\bfunction\s+(\w+)\s*\(([^)]*)\)\s*\{").unwrap(),
        Regex::new(r"\bconst\s+(\w+)\s*=\s*(?:async\s+)?\([^)]*\)\s*=>\s*[{(]").unwrap(),
        Regex::new(r"\b(?:let|var)\s+(\w+)\s*=\s*(?:async\s+)?function[^{]*\{").unwrap(),
    ];
    static ref LEADING_WORD: Regex = Regex::new(r"^(\w+)").unwrap();
}

/// JavaScript extractor.
pub struct JavaScriptExtractor;

impl Extractor for JavaScriptExtractor {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn extract(&self, source: &str) -> Result<Extraction> {
        let module = extract_module(source);
        tracing::debug!(
            imports = module.imports.len(),
            exports = module.exports.len(),
            classes = module.types.len(),
            functions = module.functions.len(),
            "extracted javascript module"
        );
        Ok(Extraction::Module(module))
    }
}

fn extract_module(source: &str) -> SourceModule {
    let docs = DocComments::harvest(source);
    let text = scan::blank_doc_comments(source);
    let depths = BraceDepths::new(&text);
    let lines = LineIndex::new(&text);
    let doc_for = |offset: usize| {
        docs.lookup(lines.line_of(offset), DOC_LOOKBACK)
            .map(str::to_string)
    };

    let mut module = SourceModule::new(Language::JavaScript);
    module.imports = imports(&text, &depths);
    module.exports = exports(&text, &depths);
    module.globals = variables(&text, &depths);

    let mut pos = 0;
    while let Some(caps) = CLASS_HEADER.captures_at(&text, pos) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        let open = whole.end() - 1;
        let close = if depths.is_code(whole.start()) {
            scan::find_block_end(&text, open)
        } else {
            None
        };
        match close {
            Some(close) => {
                let doc = doc_for(whole.start());
                module.types.push(class(&caps, &text[open + 1..close], doc));
                pos = close + 1;
            }
            None => pos = whole.end(),
        }
    }

    module.functions = functions(&text, &depths, doc_for);
    module
}

/// Matches of several patterns merged into source order, each tagged
/// with the index of the pattern that produced it.
fn ordered_matches<'t, 'r>(
    text: &'t str,
    depths: &BraceDepths,
    patterns: impl IntoIterator<Item = &'r Regex>,
) -> Vec<(usize, Captures<'t>)> {
    let mut found: Vec<(usize, usize, Captures<'t>)> = Vec::new();
    for (index, re) in patterns.into_iter().enumerate() {
        for caps in re.captures_iter(text) {
            if let Some(start) = caps.get(0).map(|m| m.start()) {
                if depths.is_code(start) {
                    found.push((start, index, caps));
                }
            }
        }
    }
    found.sort_by_key(|(start, index, _)| (*start, *index));
    found
        .into_iter()
        .map(|(_, index, caps)| (index, caps))
        .collect()
}

fn imports(text: &str, depths: &BraceDepths) -> Vec<String> {
    ordered_matches(text, depths, IMPORTS.iter().map(|(re, _)| re))
        .into_iter()
        .map(|(index, caps)| {
            let form = IMPORTS[index].1;
            let binding = caps.get(1).map_or("", |m| m.as_str().trim());
            let path = caps.get(2).map_or("", |m| m.as_str());
            match form {
                ImportForm::Verbatim => caps.get(0).map_or("", |m| m.as_str()).trim().to_string(),
                ImportForm::RequireDestructured => {
                    format!("const {{ {} }} = require('{}')", binding, path)
                }
                ImportForm::Require => format!("const {} = require('{}')", binding, path),
            }
        })
        .collect()
}

fn exports(text: &str, depths: &BraceDepths) -> Vec<String> {
    ordered_matches(text, depths, EXPORTS.iter())
        .into_iter()
        .filter_map(|(_, caps)| caps.get(0).map(|m| m.as_str().trim().to_string()))
        .collect()
}

/// `const`/`let`/`var` bindings at the top brace level.
fn variables(text: &str, depths: &BraceDepths) -> Vec<GlobalEntity> {
    VARIABLE
        .captures_iter(text)
        .filter(|c| c.get(0).is_some_and(|m| depths.is_top_level_code(m.start())))
        .map(|c| GlobalEntity {
            name: c[2].to_string(),
            type_repr: c[1].to_string(),
            value: Some(c[3].trim().to_string()),
        })
        .collect()
}

fn class(caps: &Captures, body: &str, doc: Option<String>) -> TypeEntity {
    let mut entity = TypeEntity::new(
        TypeKind::Class,
        EntityBase {
            name: caps[1].to_string(),
            doc,
            ..EntityBase::default()
        },
    );
    entity.extends = caps.get(2).map(|m| m.as_str().to_string()).into_iter().collect();

    let depths = BraceDepths::new(body);
    let members = scan::captures_where(&METHOD, body, |c| {
        c.get(0).is_some_and(|m| depths.is_top_level_code(m.start()))
    });
    for member in members {
        let Some(whole) = member.get(0) else {
            continue;
        };
        let name = &member[3];
        if NOT_METHODS.contains(&name) {
            continue;
        }
        entity.methods.push(MethodEntity {
            base: EntityBase::named(name),
            is_static: member.get(1).is_some(),
            is_async: member.get(2).is_some(),
            params: parameters_of(whole.as_str()),
            ..MethodEntity::default()
        });
    }

    let constructor = scan::captures_where(&CONSTRUCTOR, body, |c| {
        c.get(0).is_some_and(|m| depths.is_top_level_code(m.start()))
    })
    .into_iter()
    .next();
    if let Some(ctor) = constructor {
        entity.constructors.push(MethodEntity {
            base: EntityBase::named("constructor"),
            params: parameters(ctor.get(1).map_or("", |m| m.as_str())),
            ..MethodEntity::default()
        });
    }
    entity
}

fn functions(
    text: &str,
    depths: &BraceDepths,
    doc_for: impl Fn(usize) -> Option<String>,
) -> Vec<MethodEntity> {
    ordered_matches(text, depths, FUNCTIONS.iter())
        .into_iter()
        .filter_map(|(_, caps)| {
            let whole = caps.get(0)?;
            let header = whole.as_str();
            let is_arrow = header.contains("=>");
            let extent = function_extent(text, whole.start(), is_arrow);
            Some(MethodEntity {
                base: EntityBase {
                    name: caps[1].to_string(),
                    doc: doc_for(whole.start()),
                    ..EntityBase::default()
                },
                is_async: header.contains("async"),
                is_arrow,
                params: parameters_of(extent),
                ..MethodEntity::default()
            })
        })
        .collect()
}

/// Text of the function starting at `start`.
///
/// A `{` outside parentheses opens the body, which runs to its balanced
/// close. Arrow functions without a block body end at the first `;` or
/// line break outside parentheses.
fn function_extent(text: &str, start: usize, is_arrow: bool) -> &str {
    let mut parens = 0usize;
    for (i, b) in scan::code_bytes(text, start) {
        match b {
            b'(' => parens += 1,
            b')' => parens = parens.saturating_sub(1),
            b'{' if parens == 0 => match scan::find_block_end(text, i) {
                Some(end) => return &text[start..=end],
                None => break,
            },
            b';' | b'\n' if parens == 0 && is_arrow => return &text[start..i],
            _ => {}
        }
    }

    let mut end = (start + EXTENT_FALLBACK).min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[start..end]
}

/// Parameters of the first balanced `(...)` group in `code`.
fn parameters_of(code: &str) -> Vec<ParameterEntity> {
    let Some(open) = code.find('(') else {
        return Vec::new();
    };
    match scan::find_matching(code, open, b'(', b')') {
        Some(close) => parameters(&code[open + 1..close]),
        None => Vec::new(),
    }
}

/// Parse a parameter list, keeping destructuring patterns intact.
fn parameters(list: &str) -> Vec<ParameterEntity> {
    scan::split_top_level(list, b',', PARAM_PAIRS)
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|param| {
            let (binding, default) = match scan::find_top_level(param, b'=', PARAM_PAIRS) {
                Some(eq) => (param[..eq].trim(), Some(param[eq + 1..].trim().to_string())),
                None => (param, None),
            };
            let is_destructured = binding.starts_with('{') || binding.starts_with('[');
            let name = if is_destructured {
                binding.to_string()
            } else {
                LEADING_WORD
                    .captures(binding)
                    .map_or_else(|| binding.to_string(), |c| c[1].to_string())
            };
            ParameterEntity {
                name,
                default,
                is_destructured,
                ..ParameterEntity::default()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> SourceModule {
        match JavaScriptExtractor.extract(source).unwrap() {
            Extraction::Module(m) => m,
            Extraction::SyntaxError(_) => panic!("javascript never yields syntax errors"),
        }
    }

    #[test]
    fn test_imports_in_source_order() {
        let source = r#"const fs = require('fs');
import React from 'react';
import { useState, useEffect } from 'react';
import * as path from 'path';
import './styles.css';
const { join, resolve } = require("path");
"#;
        let module = extract(source);
        assert_eq!(
            module.imports,
            vec![
                "const fs = require('fs')",
                "import React from 'react'",
                "import { useState, useEffect } from 'react'",
                "import * as path from 'path'",
                "import './styles.css'",
                "const { join, resolve } = require('path')",
            ]
        );
    }

    #[test]
    fn test_exports() {
        let source = "export default App;\nexport { a, b };\nexport const answer = 42;\nmodule.exports = { run };\n";
        let module = extract(source);
        assert_eq!(
            module.exports,
            vec![
                "export default App",
                "export { a, b }",
                "export const answer",
                "module.exports = { run }",
            ]
        );
    }

    #[test]
    fn test_variables_are_top_level_only() {
        let source = "const LIMIT = 10;\nlet name = 'x', other = 2;\nfunction f() {\n  var inner = 1;\n}\n";
        let module = extract(source);
        let vars: Vec<(&str, &str, Option<&str>)> = module
            .globals
            .iter()
            .map(|g| (g.name.as_str(), g.type_repr.as_str(), g.value.as_deref()))
            .collect();
        assert_eq!(
            vars,
            vec![("LIMIT", "const", Some("10")), ("name", "let", Some("'x'"))]
        );
    }

    #[test]
    fn test_class_with_constructor_and_methods() {
        let source = r#"/**
 * A widget.
 */
class Widget extends Base {
  constructor(name, size = 1) {
    super(name);
    if (size) { this.size = size; }
  }

  static create({ name }) {
    return new Widget(name);
  }

  async load(url) {
    for (const x of [1, 2]) {
      if (x) { await fetch(url); }
    }
  }
}
"#;
        let module = extract(source);
        assert_eq!(module.types.len(), 1);
        let widget = &module.types[0];
        assert_eq!(widget.name(), "Widget");
        assert_eq!(widget.extends, vec!["Base"]);
        assert_eq!(widget.base.doc.as_deref(), Some("A widget."));

        let ctor = &widget.constructors[0];
        assert_eq!(ctor.params.len(), 2);
        assert_eq!(ctor.params[1].default.as_deref(), Some("1"));

        let methods: Vec<(&str, bool, bool)> = widget
            .methods
            .iter()
            .map(|m| (m.name(), m.is_static, m.is_async))
            .collect();
        assert_eq!(methods, vec![("create", true, false), ("load", false, true)]);
        assert!(widget.methods[0].params[0].is_destructured);
    }

    #[test]
    fn test_functions() {
        let source = r#"/** Adds numbers. */
function add(a, b = 2) {
  return a + b;
}

const greet = async (name) => {
  return `hi ${name}`;
};

const square = (x) => (
  x * x
);

var legacy = function(opts) {
  return opts;
};
"#;
        let module = extract(source);
        let names: Vec<&str> = module.functions.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["add", "greet", "square", "legacy"]);

        let add = &module.functions[0];
        assert_eq!(add.base.doc.as_deref(), Some("Adds numbers."));
        assert_eq!(add.params[1].default.as_deref(), Some("2"));

        let greet = &module.functions[1];
        assert!(greet.is_async);
        assert!(greet.is_arrow);
        assert_eq!(greet.params[0].name, "name");

        assert!(module.functions[2].is_arrow);
        assert_eq!(module.functions[3].params[0].name, "opts");
    }

    #[test]
    fn test_destructured_parameters() {
        let params = parameters("{ a, b = 1 } = {}, [x, y], ...rest, cb = () => {}");
        let rendered: Vec<(&str, Option<&str>, bool)> = params
            .iter()
            .map(|p| (p.name.as_str(), p.default.as_deref(), p.is_destructured))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("{ a, b = 1 }", Some("{}"), true),
                ("[x, y]", None, true),
                ("...rest", None, false),
                ("cb", Some("() => {}"), false),
            ]
        );
    }

    #[test]
    fn test_brace_less_arrow_extent() {
        let text = "const f = (a, b) => (\n  a + b\n);\nconst g = 1;";
        let extent = function_extent(text, 0, true);
        assert_eq!(extent, "const f = (a, b) => (\n  a + b\n)");
    }
}
