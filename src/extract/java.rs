//! Java extraction.
//!
//! Declarations are found with header regexes. Each body is then delimited
//! with the balanced-brace scanner and only its top brace level is
//! searched for members, so statements inside method bodies never turn
//! into fields.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::scan::{self, BraceDepths, DocComments, LineIndex};
use super::Extractor;
use crate::error::Result;
use crate::language::Language;
use crate::model::{
    EntityBase, Extraction, FieldEntity, MethodEntity, ParameterEntity, SourceModule, TypeEntity,
    TypeKind,
};

/// Lines searched above a declaration for its Javadoc.
pub const DOC_LOOKBACK: usize = 10;

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "throw", "new", "else", "do", "try",
    "synchronized",
];

const NON_TYPE_KEYWORDS: &[&str] = &[
    "if", "for", "while", "return", "throw", "throws", "new", "else", "case", "package", "import",
    "public", "private", "protected",
];

lazy_static! {
    static ref PACKAGE: Regex = Regex::new(r"package\s+([\w.]+)\s*;").unwrap();
    static ref IMPORT: Regex = Regex::new(r"import\s+(?:static\s+)?([\w.*]+)\s*;").unwrap();
    static ref INTERFACE_HEADER: Regex = Regex::new(
        r"(?:(public|private|protected)\s+)?(?:abstract\s+)?\binterface\s+(\w+)(?:\s+extends\s+([\w,\s]+?))?\s*\{"
    )
    .unwrap();
    static ref CLASS_HEADER: Regex = Regex::new(
        r"(?:(public|private|protected)\s+)?((?:(?:static|final|abstract)\s+)*)\bclass\s+(\w+)(?:\s+extends\s+(\w+))?(?:\s+implements\s+([\w,\s]+?))?\s*\{"
    )
    .unwrap();
    static ref ENUM_HEADER: Regex = Regex::new(
        r"(?:(public|private|protected)\s+)?\benum\s+(\w+)(?:\s+implements\s+([\w,\s]+?))?\s*\{"
    )
    .unwrap();
    static ref FIELD: Regex = Regex::new(
        r"(?:(public|private|protected)\s+)?((?:(?:static|final|transient|volatile)\s+)*)(\w+(?:<[^>]+>)?(?:\[\])*)\s+(\w+)(?:\s*=\s*([^;]+))?\s*;"
    )
    .unwrap();
    static ref METHOD: Regex = Regex::new(
        r"(?:(public|private|protected)\s+)?((?:(?:static|final|abstract|synchronized|native)\s+)*)(\w+(?:<[^>]+>)?(?:\[\])*)\s+(\w+)\s*\(([^)]*)\)\s*(?:throws\s+[\w.,\s]+?)?\s*([{;])"
    )
    .unwrap();
    static ref INTERFACE_METHOD: Regex = Regex::new(
        r"(?:(public|private)\s+)?((?:(?:static|default|abstract)\s+)*)(\w+(?:<[^>]+>)?(?:\[\])*)\s+(\w+)\s*\(([^)]*)\)\s*(?:throws\s+[\w.,\s]+?)?\s*([;{])"
    )
    .unwrap();
    static ref ENUM_CONSTANT: Regex =
        Regex::new(r"(\w+)(?:\([^)]*\))?(?:\s*\{[^}]*\})?\s*[,;]?").unwrap();
    static ref PARAM: Regex = Regex::new(
        r"^(?:@[\w.]+(?:\([^)]*\))?\s+)*(?:(final)\s+)?(\w+(?:<[^>]+>)?(?:\[\])*(?:\.\.\.)?)\s+(\w+)"
    )
    .unwrap();
}

/// Java extractor.
pub struct JavaExtractor;

impl Extractor for JavaExtractor {
    fn language(&self) -> Language {
        Language::Java
    }

    fn extract(&self, source: &str) -> Result<Extraction> {
        let module = extract_module(source);
        tracing::debug!(
            imports = module.imports.len(),
            types = module.types.len(),
            "extracted java module"
        );
        Ok(Extraction::Module(module))
    }
}

/// A header match with its delimited body.
struct Declaration<'t> {
    caps: Captures<'t>,
    offset: usize,
    body: &'t str,
}

fn extract_module(text: &str) -> SourceModule {
    let depths = BraceDepths::new(text);
    let lines = LineIndex::new(text);
    let docs = DocComments::harvest(text);

    let mut module = SourceModule::new(Language::Java);
    module.package = PACKAGE
        .captures_iter(text)
        .find(|c| c.get(0).is_some_and(|m| depths.is_code(m.start())))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    module.imports = IMPORT
        .find_iter(text)
        .filter(|m| depths.is_top_level_code(m.start()))
        .map(|m| m.as_str().trim().to_string())
        .collect();

    let doc_for = |offset: usize| {
        docs.lookup(lines.line_of(offset), DOC_LOOKBACK)
            .map(str::to_string)
    };

    let mut types: Vec<(usize, TypeEntity)> = Vec::new();
    for decl in declarations(&INTERFACE_HEADER, text, &depths) {
        let doc = doc_for(decl.offset);
        types.push((decl.offset, interface(&decl, doc)));
    }
    for decl in declarations(&CLASS_HEADER, text, &depths) {
        let doc = doc_for(decl.offset);
        types.push((decl.offset, class(&decl, doc)));
    }
    for decl in declarations(&ENUM_HEADER, text, &depths) {
        let doc = doc_for(decl.offset);
        types.push((decl.offset, enumeration(&decl, doc)));
    }
    types.sort_by_key(|(offset, _)| *offset);
    module.types = types.into_iter().map(|(_, t)| t).collect();
    module
}

/// Every match of a type header whose keyword is code and whose body is
/// balanced. The search resumes after each body, so members of a matched
/// type are not reported as separate declarations of the same kind.
fn declarations<'t>(header: &Regex, text: &'t str, depths: &BraceDepths) -> Vec<Declaration<'t>> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(caps) = header.captures_at(text, pos) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        let open = whole.end() - 1;
        if !depths.is_code(open) {
            pos = whole.end();
            continue;
        }
        match scan::find_block_end(text, open) {
            Some(close) => {
                found.push(Declaration {
                    offset: whole.start(),
                    body: &text[open + 1..close],
                    caps,
                });
                pos = close + 1;
            }
            None => pos = whole.end(),
        }
    }
    found
}

fn group(caps: &Captures, i: usize) -> Option<String> {
    caps.get(i).map(|m| m.as_str().trim().to_string())
}

fn split_list(list: Option<String>) -> Vec<String> {
    list.map(|l| {
        l.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

fn split_words(run: Option<String>) -> Vec<String> {
    run.map(|r| r.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

fn interface(decl: &Declaration, doc: Option<String>) -> TypeEntity {
    let caps = &decl.caps;
    let mut entity = TypeEntity::new(
        TypeKind::Interface,
        EntityBase {
            name: group(caps, 2).unwrap_or_default(),
            doc,
            access: group(caps, 1),
            ..EntityBase::default()
        },
    );
    entity.extends = split_list(group(caps, 3));
    entity.methods = interface_methods(decl.body);
    entity
}

fn class(decl: &Declaration, doc: Option<String>) -> TypeEntity {
    let caps = &decl.caps;
    let name = group(caps, 3).unwrap_or_default();
    let mut entity = TypeEntity::new(
        TypeKind::Class,
        EntityBase {
            name: name.clone(),
            doc,
            access: group(caps, 1),
            modifiers: split_words(group(caps, 2)),
            ..EntityBase::default()
        },
    );
    entity.extends = group(caps, 4).into_iter().collect();
    entity.implements = split_list(group(caps, 5));

    let depths = BraceDepths::new(decl.body);
    entity.fields = fields(decl.body, &depths);
    entity.constructors = constructors(decl.body, &depths, &name);
    entity.methods = methods(decl.body, &depths, &name);
    entity
}

fn enumeration(decl: &Declaration, doc: Option<String>) -> TypeEntity {
    let caps = &decl.caps;
    let depths = BraceDepths::new(decl.body);

    // Constants come before the first top-level `;`.
    let section_end = decl
        .body
        .bytes()
        .enumerate()
        .find(|&(i, b)| b == b';' && depths.is_top_level_code(i))
        .map_or(decl.body.len(), |(i, _)| i);
    let section = scan::code_only(&decl.body[..section_end]);

    let constants = ENUM_CONSTANT
        .captures_iter(&section)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|name| looks_like_constant(name))
        .map(str::to_string)
        .collect();

    let mut entity = TypeEntity::new(
        TypeKind::Enum { constants },
        EntityBase {
            name: group(caps, 2).unwrap_or_default(),
            doc,
            access: group(caps, 1),
            ..EntityBase::default()
        },
    );
    entity.implements = split_list(group(caps, 3));
    entity
}

/// Fully upper-case, or starting with an upper-case letter.
fn looks_like_constant(name: &str) -> bool {
    let starts_upper = name.chars().next().is_some_and(char::is_uppercase);
    let all_upper = name.chars().any(char::is_alphabetic) && !name.chars().any(char::is_lowercase);
    starts_upper || all_upper
}

fn fields(body: &str, depths: &BraceDepths) -> Vec<FieldEntity> {
    scan::captures_where(&FIELD, body, |c| {
        let Some(whole) = c.get(0) else {
            return false;
        };
        let type_repr = c.get(3).map_or("", |m| m.as_str());
        depths.is_top_level_code(whole.start())
            && !type_repr.contains('(')
            && !NON_TYPE_KEYWORDS.contains(&type_repr)
            && !CONTROL_KEYWORDS.contains(&c.get(4).map_or("", |m| m.as_str()))
    })
    .into_iter()
    .map(|c| FieldEntity {
        name: group(&c, 4).unwrap_or_default(),
        type_repr: group(&c, 3).unwrap_or_default(),
        access: group(&c, 1),
        modifiers: split_words(group(&c, 2)),
        value: group(&c, 5),
    })
    .collect()
}

fn constructors(body: &str, depths: &BraceDepths, class_name: &str) -> Vec<MethodEntity> {
    let pattern = format!(
        r"(?:(public|private|protected)\s+)?\b{}\s*\(([^)]*)\)\s*(?:throws\s+[\w.,\s]+?)?\s*\{{",
        regex::escape(class_name)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };

    scan::captures_where(&re, body, |c| {
        c.get(0).is_some_and(|m| depths.is_top_level_code(m.start()))
    })
    .into_iter()
    .map(|c| MethodEntity {
        base: EntityBase {
            name: class_name.to_string(),
            access: group(&c, 1),
            ..EntityBase::default()
        },
        params: parameters(c.get(2).map_or("", |m| m.as_str())),
        ..MethodEntity::default()
    })
    .collect()
}

fn methods(body: &str, depths: &BraceDepths, class_name: &str) -> Vec<MethodEntity> {
    scan::captures_where(&METHOD, body, |c| {
        let Some(whole) = c.get(0) else {
            return false;
        };
        let return_type = c.get(3).map_or("", |m| m.as_str());
        let name = c.get(4).map_or("", |m| m.as_str());
        depths.is_top_level_code(whole.start())
            && !CONTROL_KEYWORDS.contains(&name)
            && !NON_TYPE_KEYWORDS.contains(&return_type)
            && name != class_name
    })
    .into_iter()
    .map(|c| method(&c, None, true))
    .collect()
}

fn interface_methods(body: &str) -> Vec<MethodEntity> {
    let depths = BraceDepths::new(body);
    scan::captures_where(&INTERFACE_METHOD, body, |c| {
        let Some(whole) = c.get(0) else {
            return false;
        };
        let return_type = c.get(3).map_or("", |m| m.as_str());
        let name = c.get(4).map_or("", |m| m.as_str());
        depths.is_top_level_code(whole.start())
            && !CONTROL_KEYWORDS.contains(&name)
            && !NON_TYPE_KEYWORDS.contains(&return_type)
    })
    .into_iter()
    .map(|c| method(&c, Some("public"), false))
    .collect()
}

/// Build a method from a `METHOD`/`INTERFACE_METHOD` match.
///
/// Bodiless interface declarations carry no return type.
fn method(c: &Captures, default_access: Option<&str>, always_typed: bool) -> MethodEntity {
    let modifiers = split_words(group(c, 2));
    let has_body = c.get(6).is_some_and(|m| m.as_str() == "{");
    MethodEntity {
        base: EntityBase {
            name: group(c, 4).unwrap_or_default(),
            access: group(c, 1).or_else(|| default_access.map(str::to_string)),
            modifiers: modifiers.clone(),
            ..EntityBase::default()
        },
        return_type: if always_typed || has_body {
            group(c, 3)
        } else {
            None
        },
        is_static: modifiers.iter().any(|m| m == "static"),
        params: parameters(c.get(5).map_or("", |m| m.as_str())),
        ..MethodEntity::default()
    }
}

/// Parse a parameter list, splitting on commas outside `<...>`.
fn parameters(list: &str) -> Vec<ParameterEntity> {
    if list.trim().is_empty() {
        return Vec::new();
    }
    scan::split_top_level(list, b',', &[(b'<', b'>')])
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .filter_map(|p| PARAM.captures(p))
        .map(|c| ParameterEntity {
            name: group(&c, 3).unwrap_or_default(),
            type_repr: group(&c, 2),
            is_final: c.get(1).is_some(),
            ..ParameterEntity::default()
        })
        .collect()
}
