// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template renderer trait definition.

use crate::domain::{EvalContext, Result};

/// Renders `@jinja` expressions.
///
/// The context exposes `this` (the tree being read) and `env` (the process
/// environment). Lookups through the context are evaluated, so a template may
/// reference other lazy values; cycles are detected by the evaluator.
///
/// # Examples
///
/// ```rust
/// use layercfg::domain::{EvalContext, Result};
/// use layercfg::ports::TemplateRenderer;
///
/// struct Shouting;
///
/// impl TemplateRenderer for Shouting {
///     fn name(&self) -> &str {
///         "shouting"
///     }
///
///     fn render(&self, template: &str, _context: &EvalContext<'_>) -> Result<String> {
///         Ok(template.to_uppercase())
///     }
/// }
/// ```
pub trait TemplateRenderer: Send + Sync {
    /// Returns a name for diagnostics.
    fn name(&self) -> &str;

    /// Renders `template` against `context`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Template` for malformed templates. Errors raised by
    /// context lookups, such as circular references, should be returned as-is.
    fn render(&self, template: &str, context: &EvalContext<'_>) -> Result<String>;
}
