//! Language-agnostic entity model produced by the extractors.
//!
//! Every collection is kept in source order; nothing here is ever
//! reordered after extraction. Instances are built fresh per call and are
//! not mutated once returned.

use serde::Serialize;
use std::fmt;

use crate::error::SyntaxError;
use crate::language::Language;

/// Shape shared by every named entity (types, methods, functions).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityBase {
    pub name: String,
    /// Cleaned doc comment / docstring text.
    pub doc: Option<String>,
    /// Access modifier (`public`, `private`, `protected`).
    pub access: Option<String>,
    /// Other modifiers (`static`, `final`, `abstract`, ...), in declared order.
    pub modifiers: Vec<String>,
    /// Decorator expressions without the leading `@` (Python only).
    pub decorators: Vec<String>,
}

impl EntityBase {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A single parameter of a function, method or constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParameterEntity {
    pub name: String,
    pub type_repr: Option<String>,
    pub default: Option<String>,
    pub is_final: bool,
    /// `{...}` / `[...]` binding pattern (JavaScript only).
    pub is_destructured: bool,
}

/// A function, method or constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MethodEntity {
    pub base: EntityBase,
    /// Absent for interface declarations without a body and for untyped languages.
    pub return_type: Option<String>,
    pub is_async: bool,
    pub is_static: bool,
    /// Arrow function (JavaScript only).
    pub is_arrow: bool,
    pub params: Vec<ParameterEntity>,
}

impl MethodEntity {
    pub fn name(&self) -> &str {
        &self.base.name
    }
}

/// A field, attribute or class-level assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldEntity {
    pub name: String,
    pub type_repr: String,
    pub access: Option<String>,
    pub modifiers: Vec<String>,
    pub value: Option<String>,
}

/// A module-level binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalEntity {
    pub name: String,
    /// Declared type, or the binding keyword (`const`/`let`/`var`) in JavaScript.
    pub type_repr: String,
    /// Value text; `None` for annotated names without an assigned value.
    pub value: Option<String>,
}

/// Discriminates the three kinds of type declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum { constants: Vec<String> },
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum { .. } => "enum",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A class, interface or enum declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeEntity {
    pub kind: TypeKind,
    pub base: EntityBase,
    /// Superclass (Java/JavaScript, at most one) or base classes (Python)
    /// or extended interfaces.
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    pub fields: Vec<FieldEntity>,
    pub constructors: Vec<MethodEntity>,
    pub methods: Vec<MethodEntity>,
}

impl TypeEntity {
    pub fn new(kind: TypeKind, base: EntityBase) -> Self {
        Self {
            kind,
            base,
            extends: Vec::new(),
            implements: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.base.name
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, TypeKind::Class)
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface)
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum { .. })
    }

    /// Enum constant names; empty for classes and interfaces.
    pub fn constants(&self) -> &[String] {
        match &self.kind {
            TypeKind::Enum { constants } => constants,
            _ => &[],
        }
    }
}

/// Everything extracted from one source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceModule {
    pub language: Language,
    /// Module docstring (Python).
    pub doc: Option<String>,
    /// Package declaration (Java).
    pub package: Option<String>,
    pub imports: Vec<String>,
    /// Export statements (JavaScript).
    pub exports: Vec<String>,
    pub globals: Vec<GlobalEntity>,
    pub types: Vec<TypeEntity>,
    pub functions: Vec<MethodEntity>,
}

impl SourceModule {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            doc: None,
            package: None,
            imports: Vec::new(),
            exports: Vec::new(),
            globals: Vec::new(),
            types: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &TypeEntity> {
        self.types.iter().filter(|t| t.is_class())
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &TypeEntity> {
        self.types.iter().filter(|t| t.is_interface())
    }

    pub fn enums(&self) -> impl Iterator<Item = &TypeEntity> {
        self.types.iter().filter(|t| t.is_enum())
    }

    /// Look up a type declaration by name.
    pub fn find_type(&self, name: &str) -> Option<&TypeEntity> {
        self.types.iter().find(|t| t.name() == name)
    }

    /// Look up a standalone function by name.
    pub fn find_function(&self, name: &str) -> Option<&MethodEntity> {
        self.functions.iter().find(|f| f.name() == name)
    }
}

/// Result of running an extractor.
///
/// Python text that does not parse yields `SyntaxError` instead of a
/// module; the renderer turns it into the syntax-error document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Module(SourceModule),
    SyntaxError(SyntaxError),
}

impl Extraction {
    pub fn module(&self) -> Option<&SourceModule> {
        match self {
            Extraction::Module(m) => Some(m),
            Extraction::SyntaxError(_) => None,
        }
    }

    pub fn is_syntax_error(&self) -> bool {
        matches!(self, Extraction::SyntaxError(_))
    }
}
