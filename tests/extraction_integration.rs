//! Integration tests for extraction and markdown rendering.
//!
//! These tests run the public entry points against the fixtures in
//! testdata/ and check the documented model and the rendered output.

use std::path::PathBuf;

use codenarrator::{extract, generate_docs, Extraction, Language, SourceModule};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(testdata_path().join(name)).expect("fixture should be readable")
}

fn module(language: Language, name: &str) -> SourceModule {
    match extract(language, &fixture(name)).expect("extraction should run") {
        Extraction::Module(m) => m,
        Extraction::SyntaxError(e) => panic!("{} did not parse: {}", name, e),
    }
}

/// Byte offset of every needle in `doc`, panicking on a missing one.
fn positions(doc: &str, needles: &[&str]) -> Vec<usize> {
    needles
        .iter()
        .map(|n| doc.find(n).unwrap_or_else(|| panic!("missing {:?} in:\n{}", n, doc)))
        .collect()
}

fn is_ascending(values: &[usize]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}

#[test]
fn test_python_fixture_model() {
    let m = module(Language::Python, "sample.py");

    assert_eq!(m.doc.as_deref(), Some("Inventory helpers for the warehouse service."));
    assert_eq!(
        m.imports,
        vec![
            "import os",
            "from collections import OrderedDict as OD",
            "from typing import *",
        ]
    );

    let globals: Vec<&str> = m.globals.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(globals, vec!["MAX_ITEMS", "registry"]);
    assert_eq!(m.globals[0].type_repr, "int");
    assert_eq!(m.globals[0].value.as_deref(), Some("500"));

    let classes: Vec<&str> = m.types.iter().map(|t| t.name()).collect();
    assert_eq!(classes, vec!["Item", "Shelf"]);

    let item = &m.types[0];
    assert_eq!(item.extends, vec!["Base"]);
    assert_eq!(item.base.decorators, vec!["dataclass"]);
    assert_eq!(item.base.doc.as_deref(), Some("A stocked item."));
    let fields: Vec<&str> = item.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, vec!["sku", "quantity"]);

    let restock = &item.methods[0];
    let params: Vec<&str> = restock.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(params, vec!["self", "amount", "*extra", "**meta"]);
    assert_eq!(restock.return_type.as_deref(), Some("int"));
    assert!(item.methods[1].is_async);

    let functions: Vec<&str> = m.functions.iter().map(|f| f.name()).collect();
    assert_eq!(functions, vec!["lookup", "report"]);
}

#[test]
fn test_python_default_alignment() {
    let m = module(Language::Python, "sample.py");
    let report = m.find_function("report").unwrap();
    let defaults: Vec<(&str, Option<&str>)> = report
        .params
        .iter()
        .map(|p| (p.name.as_str(), p.default.as_deref()))
        .collect();
    assert_eq!(defaults, vec![("a", None), ("b", Some("1")), ("c", Some("2"))]);
}

#[test]
fn test_java_fixture_model() {
    let m = module(Language::Java, "Sample.java");

    assert_eq!(m.package.as_deref(), Some("com.example.store"));
    assert_eq!(m.imports.len(), 2);

    let names: Vec<&str> = m.types.iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["Priced", "Product", "Status"]);

    let priced = m.find_type("Priced").unwrap();
    assert!(priced.is_interface());
    assert_eq!(priced.base.doc.as_deref(), Some("Something that can be priced."));
    assert_eq!(priced.methods[0].base.access.as_deref(), Some("public"));

    let product = m.find_type("Product").unwrap();
    assert_eq!(product.implements, vec!["Priced"]);
    let fields: Vec<&str> = product.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, vec!["LIMIT", "name", "tags"]);
    assert_eq!(product.constructors.len(), 1);
    assert!(product.constructors[0].params[1].is_final);
    assert_eq!(
        product.constructors[0].params[1].type_repr.as_deref(),
        Some("List<String>")
    );
    let methods: Vec<&str> = product.methods.iter().map(|m| m.name()).collect();
    assert_eq!(methods, vec!["price", "empty"]);
    assert_eq!(product.methods[0].base.doc.as_deref(), Some("Unit price."));

    let status = m.find_type("Status").unwrap();
    assert_eq!(status.constants(), &["ACTIVE", "RETIRED"]);
}

#[test]
fn test_javascript_fixture_model() {
    let m = module(Language::JavaScript, "sample.js");

    assert_eq!(
        m.imports,
        vec![
            "import React from 'react'",
            "import { useState, useEffect } from 'react'",
            "const path = require('path')",
        ]
    );
    assert_eq!(m.exports, vec!["export default App"]);

    let app = m.find_type("App").unwrap();
    assert_eq!(app.extends, vec!["Component"]);
    assert_eq!(app.base.doc.as_deref(), Some("Root application widget."));
    assert_eq!(app.constructors.len(), 1);
    assert_eq!(app.methods[0].name(), "create");
    assert!(app.methods[0].is_static);

    let functions: Vec<&str> = m.functions.iter().map(|f| f.name()).collect();
    assert_eq!(functions, vec!["add", "double"]);
    assert_eq!(m.functions[0].base.doc.as_deref(), Some("Sum two values."));
    assert_eq!(m.functions[0].params[1].default.as_deref(), Some("0"));
    assert!(m.functions[1].is_arrow);
}

#[test]
fn test_rendered_sections_follow_source_order() {
    let doc = generate_docs(Language::Python, &fixture("sample.py")).unwrap();
    let offsets = positions(
        &doc,
        &[
            "# Python Code Documentation",
            "## Module Description",
            "## Imports",
            "## Global Variables",
            "## Classes",
            "### Class: `Item`",
            "### Class: `Shelf`",
            "## Functions",
            "### Function: `lookup`",
            "### Function: `report`",
        ],
    );
    assert!(is_ascending(&offsets), "sections out of order:\n{}", doc);

    let doc = generate_docs(Language::Java, &fixture("Sample.java")).unwrap();
    let offsets = positions(
        &doc,
        &["## Package: `com.example.store`", "## Imports", "## Interfaces", "## Classes", "## Enums"],
    );
    assert!(is_ascending(&offsets), "sections out of order:\n{}", doc);
}

#[test]
fn test_class_without_docstring_has_no_description() {
    let doc = generate_docs(Language::Python, "class Foo:\n    pass\n").unwrap();
    assert!(doc.contains("### Class: `Foo`"));
    assert!(!doc.contains("**Description:**"));
}

#[test]
fn test_malformed_python_yields_syntax_error_document() {
    let extraction = extract(Language::Python, "def f(:\n").unwrap();
    assert!(extraction.is_syntax_error());

    let doc = generate_docs(Language::Python, "def f(:\n").unwrap();
    assert!(doc.starts_with("# Syntax Error"));
    assert!(doc.contains("Failed to parse Python code"));
}

#[test]
fn test_grammar_accepted_python2_forms_are_syntax_errors() {
    for text in [
        "print \"hello\"\n",
        "exec \"x\"\n",
        "def f(a=1, b):\n    pass\n",
        "x = 1 +\n",
    ] {
        let extraction = extract(Language::Python, text).unwrap();
        assert!(extraction.is_syntax_error(), "{:?} should not parse", text);
        let doc = generate_docs(Language::Python, text).unwrap();
        assert!(doc.starts_with("# Syntax Error"), "{:?} rendered:\n{}", text, doc);
    }
}

#[test]
fn test_generation_is_deterministic() {
    for (language, name) in [
        (Language::Python, "sample.py"),
        (Language::Java, "Sample.java"),
        (Language::JavaScript, "sample.js"),
    ] {
        let text = fixture(name);
        let first = generate_docs(language, &text).unwrap();
        let second = generate_docs(language, &text).unwrap();
        assert_eq!(first, second, "{} rendered differently", name);
    }
}

#[test]
fn test_concurrent_calls_agree() {
    let text = fixture("Sample.java");
    let expected = generate_docs(Language::Java, &text).unwrap();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| generate_docs(Language::Java, &text).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
