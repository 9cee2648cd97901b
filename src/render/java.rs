use super::{code_list, push_code_section, spaced, spaced_words};
use crate::model::{MethodEntity, ParameterEntity, SourceModule, TypeEntity};

pub(super) fn render(module: &SourceModule) -> Vec<String> {
    let mut lines = vec!["# Java Code Documentation\n".to_string()];

    if let Some(package) = &module.package {
        lines.push(format!("## Package: `{}`\n", package));
    }

    push_code_section(&mut lines, "Imports", &module.imports);

    let sections: [(&str, Vec<&TypeEntity>, fn(&TypeEntity) -> Vec<String>); 3] = [
        ("Interfaces", module.interfaces().collect(), interface_lines),
        ("Classes", module.classes().collect(), class_lines),
        ("Enums", module.enums().collect(), enum_lines),
    ];
    for (title, types, format) in sections {
        if types.is_empty() {
            continue;
        }
        lines.push(format!("## {}", title));
        for entity in types {
            lines.extend(format(entity));
        }
    }

    lines
}

fn interface_lines(interface: &TypeEntity) -> Vec<String> {
    let mut lines = vec![format!("### Interface: `{}`", interface.name())];

    if let Some(access) = &interface.base.access {
        lines.push(format!("**Access:** {}", access));
    }
    if !interface.extends.is_empty() {
        lines.push(format!("**Extends:** {}", code_list(&interface.extends, "")));
    }
    if let Some(doc) = &interface.base.doc {
        lines.push(format!("**Description:** {}", doc));
    }
    if !interface.methods.is_empty() {
        lines.push("**Methods:**".to_string());
        for method in &interface.methods {
            lines.extend(method_lines(method, false));
        }
    }

    lines.push(String::new());
    lines
}

fn class_lines(class: &TypeEntity) -> Vec<String> {
    let mut lines = vec![format!("### Class: `{}`", class.name())];

    if let Some(access) = &class.base.access {
        lines.push(format!("**Access:** {}", access));
    }
    if !class.base.modifiers.is_empty() {
        lines.push(format!("**Modifiers:** {}", class.base.modifiers.join(", ")));
    }
    if let Some(parent) = class.extends.first() {
        lines.push(format!("**Extends:** `{}`", parent));
    }
    if !class.implements.is_empty() {
        lines.push(format!("**Implements:** {}", code_list(&class.implements, "")));
    }
    if let Some(doc) = &class.base.doc {
        lines.push(format!("**Description:** {}", doc));
    }

    if !class.fields.is_empty() {
        lines.push("**Fields:**".to_string());
        for field in &class.fields {
            let value = field
                .value
                .as_deref()
                .map(|v| format!(" = `{}`", v))
                .unwrap_or_default();
            lines.push(format!(
                "- {}{}`{}`: {}{}",
                spaced(field.access.as_deref()),
                spaced_words(&field.modifiers),
                field.name,
                field.type_repr,
                value
            ));
        }
    }

    if !class.constructors.is_empty() {
        lines.push("**Constructors:**".to_string());
        for (i, constructor) in class.constructors.iter().enumerate() {
            lines.push(format!(
                "#### Constructor {}: {}`{}`",
                i + 1,
                spaced(constructor.base.access.as_deref()),
                class.name()
            ));
            lines.extend(parameter_lines(&constructor.params));
            lines.push(String::new());
        }
    }

    if !class.methods.is_empty() {
        lines.push("**Methods:**".to_string());
        for method in &class.methods {
            lines.extend(method_lines(method, true));
        }
    }

    lines.push(String::new());
    lines
}

fn enum_lines(enumeration: &TypeEntity) -> Vec<String> {
    let mut lines = vec![format!("### Enum: `{}`", enumeration.name())];

    if let Some(access) = &enumeration.base.access {
        lines.push(format!("**Access:** {}", access));
    }
    if !enumeration.implements.is_empty() {
        lines.push(format!(
            "**Implements:** {}",
            code_list(&enumeration.implements, "")
        ));
    }
    if let Some(doc) = &enumeration.base.doc {
        lines.push(format!("**Description:** {}", doc));
    }
    if !enumeration.constants().is_empty() {
        lines.push("**Constants:**".to_string());
        lines.extend(enumeration.constants().iter().map(|c| format!("- `{}`", c)));
    }

    lines.push(String::new());
    lines
}

/// Interface methods never show a return line.
fn method_lines(method: &MethodEntity, show_returns: bool) -> Vec<String> {
    let mut lines = vec![format!(
        "#### Method: {}{}`{}`",
        spaced(method.base.access.as_deref()),
        spaced_words(&method.base.modifiers),
        method.name()
    )];

    if show_returns {
        if let Some(return_type) = &method.return_type {
            lines.push(format!("**Returns:** `{}`", return_type));
        }
    }
    lines.extend(parameter_lines(&method.params));

    lines.push(String::new());
    lines
}

fn parameter_lines(params: &[ParameterEntity]) -> Vec<String> {
    if params.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["**Parameters:**".to_string()];
    for param in params {
        lines.push(format!(
            "- {}`{}`: {}",
            if param.is_final { "final " } else { "" },
            param.name,
            param.type_repr.as_deref().unwrap_or("")
        ));
    }
    lines
}
