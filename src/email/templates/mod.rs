//! Email template rendering
//!
//! [`TemplateRenderer`] is the seam the transports render bodies through.
//! Two small implementations ship with the crate, both built on
//! [`TemplateEngine`] and its `{{variable_name}}` syntax:
//! - [`FileTemplateRenderer`] reads `<root>/<folder>/<template_id>.html`
//! - [`InMemoryTemplateRenderer`] keeps template sources in a map

mod file;

pub use file::FileTemplateRenderer;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Template rendering error types
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Invalid template id: {0}")]
    InvalidTemplateId(String),

    #[error("Failed to read template {template_id}: {source}")]
    Io {
        template_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid template data: {0}")]
    Data(String),
}

/// Turns a template identifier and template data into an HTML body
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    async fn render(
        &self,
        template_id: &str,
        data: &serde_json::Value,
    ) -> Result<String, RenderError>;
}

/// Template rendering engine with variable substitution
#[derive(Debug, Default)]
pub struct TemplateEngine {
    variables: HashMap<String, String>,
}

impl TemplateEngine {
    /// Create a new template engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an engine from the top-level fields of a JSON object
    ///
    /// Strings are HTML-escaped, numbers and booleans are formatted, `null`
    /// becomes an empty string. Nested objects and arrays are skipped.
    pub fn from_data(data: &serde_json::Value) -> Result<Self, RenderError> {
        let object = data
            .as_object()
            .ok_or_else(|| RenderError::Data("template data must be a JSON object".to_string()))?;

        let scalars = object.iter().filter_map(|(key, value)| {
            let rendered = match value {
                serde_json::Value::String(s) => escape_html(s),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Null => String::new(),
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => return None,
            };
            Some((key.as_str(), rendered))
        });

        let mut engine = Self::new();
        engine.set_all(scalars);
        Ok(engine)
    }

    /// Set a variable value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Set multiple variables from an iterator
    pub fn set_all<I, K, V>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in iter {
            self.variables.insert(k.into(), v.into());
        }
        self
    }

    /// Render a template string, replacing {{variable}} with values
    ///
    /// Substitution is a single left-to-right pass, so placeholders inside
    /// substituted values are never expanded. Unknown variables are left as-is.
    pub fn render(&self, template: &str) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];

            match after_open.find("}}") {
                Some(end) => {
                    let key = after_open[..end].trim();
                    match self.variables.get(key) {
                        Some(value) => result.push_str(value),
                        None => result.push_str(&rest[start..start + 2 + end + 2]),
                    }
                    rest = &after_open[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        result.push_str(rest);
        result
    }
}

/// Renderer over template sources held in memory
#[derive(Debug, Default, Clone)]
pub struct InMemoryTemplateRenderer {
    templates: HashMap<String, String>,
}

impl InMemoryTemplateRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template source under an identifier
    pub fn with_template(mut self, template_id: impl Into<String>, source: impl Into<String>) -> Self {
        self.templates.insert(template_id.into(), source.into());
        self
    }
}

#[async_trait]
impl TemplateRenderer for InMemoryTemplateRenderer {
    async fn render(
        &self,
        template_id: &str,
        data: &serde_json::Value,
    ) -> Result<String, RenderError> {
        let source = self
            .templates
            .get(template_id)
            .ok_or_else(|| RenderError::NotFound(template_id.to_string()))?;

        Ok(TemplateEngine::from_data(data)?.render(source))
    }
}

pub(crate) fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
