use super::{code_list, push_code_section};
use crate::model::{MethodEntity, SourceModule, TypeEntity};

pub(super) fn render(module: &SourceModule) -> Vec<String> {
    let mut lines = vec!["# Python Code Documentation\n".to_string()];

    if let Some(doc) = &module.doc {
        lines.push("## Module Description".to_string());
        lines.push(format!("{}\n", doc));
    }

    push_code_section(&mut lines, "Imports", &module.imports);

    if !module.globals.is_empty() {
        lines.push("## Global Variables".to_string());
        for global in &module.globals {
            lines.push(format!(
                "- **{}**: {} = `{}`",
                global.name,
                global.type_repr,
                global.value.as_deref().unwrap_or("Not assigned")
            ));
        }
        lines.push(String::new());
    }

    if !module.types.is_empty() {
        lines.push("## Classes".to_string());
        for class in &module.types {
            lines.extend(class_lines(class));
        }
    }

    if !module.functions.is_empty() {
        lines.push("## Functions".to_string());
        for function in &module.functions {
            lines.extend(function_lines(function, "###"));
        }
    }

    lines
}

fn class_lines(class: &TypeEntity) -> Vec<String> {
    let mut lines = vec![format!("### Class: `{}`", class.name())];

    if !class.extends.is_empty() {
        lines.push(format!("**Inherits from:** {}", code_list(&class.extends, "")));
    }
    if !class.base.decorators.is_empty() {
        lines.push(format!("**Decorators:** {}", code_list(&class.base.decorators, "@")));
    }
    if let Some(doc) = &class.base.doc {
        lines.push(format!("**Description:** {}", doc));
    }

    if !class.fields.is_empty() {
        lines.push("**Attributes:**".to_string());
        for field in &class.fields {
            // A `None` value documents no default.
            let default = match field.value.as_deref() {
                Some(value) if value != "None" => format!(" = `{}`", value),
                _ => String::new(),
            };
            lines.push(format!("- `{}`: {}{}", field.name, field.type_repr, default));
        }
    }

    if !class.methods.is_empty() {
        lines.push("**Methods:**".to_string());
        for method in &class.methods {
            lines.extend(function_lines(method, "####"));
        }
    }

    lines.push(String::new());
    lines
}

fn function_lines(function: &MethodEntity, heading: &str) -> Vec<String> {
    let async_prefix = if function.is_async { "async " } else { "" };
    let mut lines = vec![format!(
        "{} {}Function: `{}`",
        heading,
        async_prefix,
        function.name()
    )];

    if !function.base.decorators.is_empty() {
        lines.push(format!(
            "**Decorators:** {}",
            code_list(&function.base.decorators, "@")
        ));
    }

    if !function.params.is_empty() {
        lines.push("**Arguments:**".to_string());
        for param in &function.params {
            let mut line = format!("- `{}`", param.name);
            if let Some(type_repr) = &param.type_repr {
                line.push_str(&format!(": {}", type_repr));
            }
            if let Some(default) = param.default.as_deref().filter(|d| !d.is_empty()) {
                line.push_str(&format!(" = `{}`", default));
            }
            lines.push(line);
        }
    }

    if let Some(return_type) = &function.return_type {
        lines.push(format!("**Returns:** {}", return_type));
    }
    if let Some(doc) = &function.base.doc {
        lines.push(format!("**Description:** {}", doc));
    }

    lines.push(String::new());
    lines
}
