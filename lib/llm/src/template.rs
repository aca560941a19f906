//! Prompt template rendering.
//!
//! The engine only depends on the substitution contract: a template plus
//! a variable map in, rendered text out. The platform may plug in a full
//! template engine; `SimpleTemplateRenderer` covers the built-in
//! `{{variable}}` syntax.

use crate::error::TemplateError;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Variables available during template rendering.
pub type TemplateVars = HashMap<String, JsonValue>;

/// Renders prompt templates against a variable map.
pub trait TemplateRenderer: Send + Sync {
    /// Renders `template` with the given variables.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the template cannot be rendered.
    fn render(&self, template: &str, variables: &TemplateVars) -> Result<String, TemplateError>;
}

/// Built-in renderer substituting `{{variable_name}}` placeholders.
///
/// Any placeholder left unresolved after substitution is a render error,
/// so prompt typos surface at provisioning time instead of reaching the
/// model verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTemplateRenderer;

impl TemplateRenderer for SimpleTemplateRenderer {
    fn render(&self, template: &str, variables: &TemplateVars) -> Result<String, TemplateError> {
        let mut result = template.to_string();

        for (name, value) in variables {
            let placeholder = format!("{{{{{name}}}}}");
            let replacement = match value {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            result = result.replace(&placeholder, &replacement);
        }

        if let Some(start) = result.find("{{")
            && let Some(end) = result[start..].find("}}")
        {
            let name = &result[start + 2..start + end];
            return Err(TemplateError::RenderFailed {
                reason: format!("unresolved template variable: {name}"),
            });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> TemplateVars {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), serde_json::json!(v)))
            .collect()
    }

    #[test]
    fn renders_string_variables() {
        let renderer = SimpleTemplateRenderer;
        let rendered = renderer
            .render(
                "You are a voice assistant for {{platform}}.",
                &vars(&[("platform", "amber-hearth")]),
            )
            .expect("render");
        assert_eq!(rendered, "You are a voice assistant for amber-hearth.");
    }

    #[test]
    fn renders_non_string_variables_as_json() {
        let renderer = SimpleTemplateRenderer;
        let mut variables = TemplateVars::new();
        variables.insert("count".to_string(), serde_json::json!(3));

        let rendered = renderer
            .render("There are {{count}} lights.", &variables)
            .expect("render");
        assert_eq!(rendered, "There are 3 lights.");
    }

    #[test]
    fn unresolved_variable_is_an_error() {
        let renderer = SimpleTemplateRenderer;
        let result = renderer.render("Hello {{who}}", &TemplateVars::new());

        let err = result.expect_err("should fail");
        assert!(err.to_string().contains("who"));
    }
}
