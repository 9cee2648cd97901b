use super::push_code_section;
use crate::model::{MethodEntity, ParameterEntity, SourceModule, TypeEntity};

pub(super) fn render(module: &SourceModule) -> Vec<String> {
    let mut lines = vec!["# JavaScript Code Documentation\n".to_string()];

    push_code_section(&mut lines, "Imports", &module.imports);
    push_code_section(&mut lines, "Exports", &module.exports);

    if !module.globals.is_empty() {
        lines.push("## Variables".to_string());
        for var in &module.globals {
            lines.push(format!(
                "- **{}** ({}): `{}`",
                var.name,
                var.type_repr,
                var.value.as_deref().unwrap_or("")
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
            lines.extend(function_lines(function));
        }
    }

    lines
}

fn class_lines(class: &TypeEntity) -> Vec<String> {
    let mut lines = vec![format!("### Class: `{}`", class.name())];

    if let Some(parent) = class.extends.first() {
        lines.push(format!("**Extends:** `{}`", parent));
    }
    if let Some(doc) = &class.base.doc {
        lines.push(format!("**Description:** {}", doc));
    }

    if let Some(constructor) = class.constructors.first() {
        lines.push("**Constructor:**".to_string());
        if constructor.params.is_empty() {
            lines.push("- No parameters".to_string());
        } else {
            lines.extend(constructor.params.iter().map(|p| param_line(p, false)));
        }
    }

    if !class.methods.is_empty() {
        lines.push("**Methods:**".to_string());
        for method in &class.methods {
            lines.push(format!(
                "#### {}{}Method: `{}`",
                if method.is_static { "static " } else { "" },
                if method.is_async { "async " } else { "" },
                method.name()
            ));
            if !method.params.is_empty() {
                lines.push("**Parameters:**".to_string());
                lines.extend(method.params.iter().map(|p| param_line(p, false)));
            }
            if let Some(doc) = &method.base.doc {
                lines.push(format!("**Description:** {}", doc));
            }
            lines.push(String::new());
        }
    }

    lines.push(String::new());
    lines
}

fn function_lines(function: &MethodEntity) -> Vec<String> {
    let mut lines = vec![format!(
        "### {}Function: `{}`{}",
        if function.is_async { "async " } else { "" },
        function.name(),
        if function.is_arrow { " (arrow function)" } else { "" }
    )];

    if !function.params.is_empty() {
        lines.push("**Parameters:**".to_string());
        lines.extend(function.params.iter().map(|p| param_line(p, true)));
    }
    if let Some(doc) = &function.base.doc {
        lines.push(format!("**Description:** {}", doc));
    }

    lines.push(String::new());
    lines
}

fn param_line(param: &ParameterEntity, mark_destructured: bool) -> String {
    let mut line = format!("- `{}`", param.name);
    if let Some(default) = param.default.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(&format!(" = `{}`", default));
    }
    if mark_destructured && param.is_destructured {
        line.push_str(" (destructured)");
    }
    line
}

#[cfg(test)]
mod tests {
    use crate::extract::{Extractor, JavaScriptExtractor};
    use crate::render::render_markdown;

    fn render(source: &str) -> String {
        render_markdown(&JavaScriptExtractor.extract(source).unwrap())
    }

    #[test]
    fn test_full_document() {
        let source = r#"import { api } from './api';

export default Store;

const LIMIT = 5;

/** Keeps items. */
class Store {
  constructor() {
    this.items = [];
  }

  static of(items, { strict } = {}) {
    return new Store();
  }
}

const pick = async ({ id }, fallback = null) => {
  return id || fallback;
};
"#;
        let expected = "# JavaScript Code Documentation\n
## Imports
- `import { api } from './api'`

## Exports
- `export default Store`

## Variables
- **LIMIT** (const): `5`
- **pick** (const): `async ({ id }`

## Classes
### Class: `Store`
**Description:** Keeps items.
**Constructor:**
- No parameters
**Methods:**
#### static Method: `of`
**Parameters:**
- `items`
- `{ strict }` = `{}`


## Functions
### async Function: `pick` (arrow function)
**Parameters:**
- `{ id }` (destructured)
- `fallback` = `null`
";
        assert_eq!(render(source), expected);
    }
}
