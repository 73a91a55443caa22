// SPDX-License-Identifier: MIT OR Apache-2.0

//! Default template renderer for `@jinja` values.
//!
//! Supports `{{ expression | filter | ... }}` where the expression is a
//! `this.` or `env.` path or a quoted literal, and the filters are `upper`,
//! `lower`, `trim` and `default("text")`. A missing value renders as an empty
//! string unless a `default` filter supplies one.

use crate::domain::{ConfigError, EvalContext, Result};
use crate::ports::TemplateRenderer;
use once_cell::sync::Lazy;
use regex::Regex;

static EXPRESSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*(.*?)\s*\}\}").expect("expression pattern is valid"));

/// The built-in template renderer.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::PlaceholderRenderer;
/// use layercfg::domain::{DataTree, EvalContext, Evaluator, MergeEngine, Value};
/// use layercfg::ports::TemplateRenderer;
///
/// let mut tree = DataTree::new(MergeEngine::default());
/// tree.set("name", Value::from("demo"), false);
/// let evaluator = Evaluator::default();
/// let context = EvalContext::new(&tree, &evaluator);
///
/// let rendered = PlaceholderRenderer::new()
///     .render("{{ this.NAME | upper }}-{{ this.missing | default('x') }}", &context)
///     .unwrap();
/// assert_eq!(rendered, "DEMO-x");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer {
    /// Creates the renderer.
    pub fn new() -> Self {
        PlaceholderRenderer
    }

    fn evaluate(&self, template: &str, expression: &str, context: &EvalContext<'_>) -> Result<String> {
        let mut parts = expression.split('|').map(str::trim);
        let head = parts.next().unwrap_or_default();
        let mut current = match unquote(head) {
            Some(literal) => Some(literal.to_string()),
            None => context.lookup(head)?.map(|value| value.to_string()),
        };
        for filter in parts {
            current = apply_filter(template, filter, current)?;
        }
        Ok(current.unwrap_or_default())
    }
}

fn unquote(text: &str) -> Option<&str> {
    ['"', '\''].into_iter().find_map(|quote| {
        text.strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    })
}

fn apply_filter(template: &str, filter: &str, value: Option<String>) -> Result<Option<String>> {
    let (name, argument) = match filter.split_once('(') {
        Some((name, rest)) => (name.trim(), Some(rest.trim_end_matches(')').trim())),
        None => (filter, None),
    };
    match (name, argument) {
        ("upper", None) => Ok(value.map(|v| v.to_uppercase())),
        ("lower", None) => Ok(value.map(|v| v.to_lowercase())),
        ("trim", None) => Ok(value.map(|v| v.trim().to_string())),
        ("default", Some(argument)) => {
            let fallback = unquote(argument).unwrap_or(argument).to_string();
            Ok(Some(value.filter(|v| !v.is_empty()).unwrap_or(fallback)))
        }
        _ => Err(ConfigError::Template {
            template: template.to_string(),
            message: format!("unknown filter '{}'", filter),
        }),
    }
}

impl TemplateRenderer for PlaceholderRenderer {
    fn name(&self) -> &str {
        "placeholder"
    }

    fn render(&self, template: &str, context: &EvalContext<'_>) -> Result<String> {
        let mut rendered = String::with_capacity(template.len());
        let mut last = 0;
        for captures in EXPRESSION.captures_iter(template) {
            let (Some(whole), Some(expression)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            rendered.push_str(&template[last..whole.start()]);
            rendered.push_str(&self.evaluate(template, expression.as_str(), context)?);
            last = whole.end();
        }
        rendered.push_str(&template[last..]);
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DataTree, Evaluator, MergeEngine, Value};

    fn render(tree: &DataTree, template: &str) -> Result<String> {
        let evaluator = Evaluator::default();
        let context = EvalContext::new(tree, &evaluator);
        PlaceholderRenderer::new().render(template, &context)
    }

    fn tree() -> DataTree {
        let mut tree = DataTree::new(MergeEngine::default());
        tree.set("db.host", Value::from("  LocalHost "), false);
        tree.set("port", Value::from(5432), false);
        tree
    }

    #[test]
    fn test_render_paths() {
        assert_eq!(
            render(&tree(), "postgres://{{ this.db.host | trim | lower }}:{{this.PORT}}").unwrap(),
            "postgres://localhost:5432"
        );
    }

    #[test]
    fn test_render_missing_is_empty() {
        assert_eq!(render(&tree(), "[{{ this.nope }}]").unwrap(), "[]");
    }

    #[test]
    fn test_render_default_filter() {
        assert_eq!(
            render(&tree(), r#"{{ this.nope | default("fallback") | upper }}"#).unwrap(),
            "FALLBACK"
        );
    }

    #[test]
    fn test_render_literal() {
        assert_eq!(render(&tree(), "{{ 'Hi' | lower }}").unwrap(), "hi");
    }

    #[test]
    fn test_render_unknown_filter() {
        let err = render(&tree(), "{{ this.port | reverse }}").unwrap_err();
        assert!(matches!(err, ConfigError::Template { .. }));
    }

    #[test]
    fn test_render_env() {
        std::env::set_var("LAYERCFG_TEMPLATE_TEST_VAR", "from-env");
        let rendered = render(&tree(), "{{ env.LAYERCFG_TEMPLATE_TEST_VAR }}").unwrap();
        std::env::remove_var("LAYERCFG_TEMPLATE_TEST_VAR");
        assert_eq!(rendered, "from-env");
    }
}
