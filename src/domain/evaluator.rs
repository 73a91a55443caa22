// SPDX-License-Identifier: MIT OR Apache-2.0

//! Evaluation of lazy values against the live tree.
//!
//! `@format` expressions are interpolated natively: every `{root.path}`
//! placeholder is replaced by the value it names, where `root` is either `this`
//! (the tree being read) or `env` (the process environment). `{{` and `}}`
//! produce literal braces. `@jinja` expressions are handed to the configured
//! `TemplateRenderer`, and `@get` returns the value stored at another key.

use crate::domain::converters::ConverterRegistry;
use crate::domain::errors::{ConfigError, Result};
use crate::domain::lazy::{EvaluationGuard, LazyKind, LazyValue};
use crate::domain::tree::DataTree;
use crate::domain::value::{Mapping, Value};
use crate::ports::renderer::TemplateRenderer;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{|\}\}|\{([^{}]*)\}").expect("placeholder pattern is valid")
});

/// Evaluates values, resolving every lazy value they contain.
///
/// An evaluator is cheap to clone; the renderer and converters are shared.
#[derive(Clone, Default)]
pub struct Evaluator {
    renderer: Option<Arc<dyn TemplateRenderer>>,
    converters: Arc<ConverterRegistry>,
}

impl Evaluator {
    /// Creates an evaluator without a template renderer.
    pub fn new(converters: Arc<ConverterRegistry>) -> Self {
        Self {
            renderer: None,
            converters,
        }
    }

    /// Sets the renderer used for `@jinja` values.
    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Returns the converter registry used for casts.
    pub fn converters(&self) -> &Arc<ConverterRegistry> {
        &self.converters
    }

    /// Returns the configured template renderer, if any.
    pub fn renderer(&self) -> Option<&Arc<dyn TemplateRenderer>> {
        self.renderer.as_ref()
    }

    /// Returns `value` with every lazy value in it evaluated.
    ///
    /// Sequences and mappings are evaluated element by element.
    pub fn evaluate(&self, value: &Value, tree: &DataTree) -> Result<Value> {
        match value {
            Value::Lazy(lazy) => self.evaluate_lazy(lazy, tree),
            Value::Sequence(items) => items
                .iter()
                .map(|item| self.evaluate(item, tree))
                .collect::<Result<Vec<_>>>()
                .map(Value::Sequence),
            Value::Mapping(map) => {
                let mut evaluated = Mapping::new();
                for (key, item) in map.iter() {
                    evaluated.insert(key, self.evaluate(item, tree)?);
                }
                Ok(Value::Mapping(evaluated))
            }
            Value::Directive(_, inner) => self.evaluate(inner, tree),
            other => Ok(other.clone()),
        }
    }

    /// Evaluates a single lazy value.
    ///
    /// The value stays on the evaluation stack until its result, including any
    /// lazy values nested in that result, is fully evaluated.
    pub fn evaluate_lazy(&self, lazy: &LazyValue, tree: &DataTree) -> Result<Value> {
        let _guard = EvaluationGuard::enter(lazy)?;
        tracing::debug!(
            kind = lazy.kind().marker(),
            expression = lazy.expression(),
            "evaluating lazy value"
        );

        let context = EvalContext::new(tree, self);
        let mut result = match lazy.kind() {
            LazyKind::Format => Value::String(interpolate(lazy.expression(), &context)?),
            LazyKind::Template => {
                let renderer = self.renderer.as_ref().ok_or_else(|| ConfigError::Template {
                    template: lazy.expression().to_string(),
                    message: "no template renderer configured".to_string(),
                })?;
                Value::String(renderer.render(lazy.expression(), &context)?)
            }
            LazyKind::Reference => reference(lazy.expression(), &context)?,
        };
        for cast in lazy.casts() {
            result = self.converters.cast(cast, result)?;
        }
        self.evaluate(&result, tree)
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("renderer", &self.renderer.as_ref().map(|r| r.name()))
            .field("converters", &self.converters)
            .finish()
    }
}

/// The bindings visible to an expression while it is evaluated.
///
/// `this` is the tree the lazy value was read from; `env` is the process
/// environment.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    tree: &'a DataTree,
    evaluator: &'a Evaluator,
}

impl<'a> EvalContext<'a> {
    /// Binds `tree` as `this`.
    pub fn new(tree: &'a DataTree, evaluator: &'a Evaluator) -> Self {
        Self { tree, evaluator }
    }

    /// Returns the tree bound to `this`.
    pub fn tree(&self) -> &'a DataTree {
        self.tree
    }

    /// Returns the evaluated value at `path` in the tree.
    pub fn this(&self, path: &str) -> Result<Option<Value>> {
        if path.trim().is_empty() {
            let root = Value::Mapping(self.tree.root().clone());
            return self.evaluator.evaluate(&root, self.tree).map(Some);
        }
        self.tree.resolve(path, self.evaluator)
    }

    /// Returns the process environment variable `name`.
    pub fn env(&self, name: &str) -> Option<String> {
        std::env::var(name.trim()).ok()
    }

    /// Resolves a placeholder expression such as `this.db.host`, `this[db]`
    /// or `env.HOME`.
    ///
    /// Returns `None` when the named key or variable does not exist. An
    /// expression whose root is neither `this` nor `env` is an error.
    pub fn lookup(&self, expression: &str) -> Result<Option<Value>> {
        let path = normalize_path(expression);
        let (root, rest) = path.split_once('.').unwrap_or((path.as_str(), ""));
        match root.trim().to_lowercase().as_str() {
            "this" => self.this(rest),
            "env" if !rest.trim().is_empty() => Ok(self.env(rest).map(Value::String)),
            _ => Err(ConfigError::Interpolation {
                expression: expression.to_string(),
                message: format!("unknown placeholder root '{}'", root.trim()),
            }),
        }
    }
}

impl fmt::Debug for EvalContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalContext")
            .field("keys", &self.tree.len())
            .finish()
    }
}

/// Rewrites bracket segments into dotted ones: `this[db]["host"]` becomes
/// `this.db.host`.
pub fn normalize_path(expression: &str) -> String {
    expression
        .trim()
        .replace('[', ".")
        .replace([']', '"', '\''], "")
}

/// Replaces every `{root.path}` placeholder in `template`.
///
/// A missing `this` key is an error; a missing environment variable renders
/// as an empty string.
pub fn interpolate(template: &str, context: &EvalContext<'_>) -> Result<String> {
    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;
    for captures in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        rendered.push_str(&template[last..whole.start()]);
        match captures.get(1) {
            Some(expression) => {
                let is_env = normalize_path(expression.as_str())
                    .to_lowercase()
                    .starts_with("env.");
                match context.lookup(expression.as_str())? {
                    Some(value) => rendered.push_str(&value.to_string()),
                    None if is_env => {}
                    None => {
                        return Err(ConfigError::Interpolation {
                            expression: template.to_string(),
                            message: format!("key '{}' not found", expression.as_str().trim()),
                        })
                    }
                }
            }
            None if whole.as_str() == "{{" => rendered.push('{'),
            None => rendered.push('}'),
        }
        last = whole.end();
    }
    rendered.push_str(&template[last..]);
    Ok(rendered)
}

/// Evaluates a `@get` expression: `key` or `key default`.
fn reference(expression: &str, context: &EvalContext<'_>) -> Result<Value> {
    let expression = expression.trim();
    let (key, default) = match expression.split_once(char::is_whitespace) {
        Some((key, default)) => (key, Some(default.trim())),
        None => (expression, None),
    };
    match context.this(key)? {
        Some(value) => Ok(value),
        None => match default {
            Some(default) => Ok(context.evaluator.converters.parse(default)),
            None => Err(ConfigError::Interpolation {
                expression: expression.to_string(),
                message: format!("key '{}' not found", key),
            }),
        },
    }
}
