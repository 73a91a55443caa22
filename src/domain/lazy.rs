// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lazy values and the evaluation stack used for cycle detection.
//!
//! A `LazyValue` is an expression evaluated every time it is read. While one is
//! being evaluated its identity sits on a thread-local stack; meeting the same
//! identity again before it is popped means the value depends on itself.
//!
//! Evaluation is synchronous and never suspends, so a thread-local stack also
//! isolates interleaved async tasks: an evaluation always finishes on the thread
//! that started it.

use crate::domain::errors::{ConfigError, Result};
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LAZY_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static EVALUATION_STACK: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

/// The kind of expression a lazy value holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LazyKind {
    /// `{this.KEY}` placeholder substitution, marker `@format`.
    Format,
    /// Template rendered by the configured `TemplateRenderer`, marker `@jinja`.
    Template,
    /// The value stored at another key, marker `@get`.
    Reference,
}

impl LazyKind {
    /// Returns the converter marker (without `@`) that produces this kind.
    pub fn marker(self) -> &'static str {
        match self {
            LazyKind::Format => "format",
            LazyKind::Template => "jinja",
            LazyKind::Reference => "get",
        }
    }
}

/// A value computed at read time.
///
/// Every `LazyValue` gets a process-unique identity when it is created; clones
/// share it. Equality ignores the identity.
///
/// # Examples
///
/// ```
/// use layercfg::domain::{LazyKind, LazyValue};
///
/// let lazy = LazyValue::new(LazyKind::Format, "{this.HOST}:{this.PORT}").with_cast("str");
/// assert_eq!(lazy.to_string(), "@str @format {this.HOST}:{this.PORT}");
/// assert_eq!(lazy.clone().id(), lazy.id());
/// ```
#[derive(Clone, Debug)]
pub struct LazyValue {
    id: u64,
    kind: LazyKind,
    expression: String,
    casts: Vec<String>,
}

impl LazyValue {
    /// Creates a lazy value with a fresh identity.
    pub fn new(kind: LazyKind, expression: impl Into<String>) -> Self {
        Self {
            id: NEXT_LAZY_ID.fetch_add(1, Ordering::Relaxed),
            kind,
            expression: expression.into(),
            casts: Vec::new(),
        }
    }

    /// Adds a converter applied to the evaluated result.
    ///
    /// Casts run in the order they were added.
    pub fn with_cast(mut self, marker: impl Into<String>) -> Self {
        self.casts.push(marker.into());
        self
    }

    /// Returns the identity used for cycle detection.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the expression kind.
    pub fn kind(&self) -> LazyKind {
        self.kind
    }

    /// Returns the raw expression, without its marker.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Returns the converters applied after evaluation, innermost first.
    pub fn casts(&self) -> &[String] {
        &self.casts
    }
}

impl PartialEq for LazyValue {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.expression == other.expression && self.casts == other.casts
    }
}

impl fmt::Display for LazyValue {
    /// Formats the value as the marker string it was parsed from.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cast in self.casts.iter().rev() {
            write!(f, "@{} ", cast)?;
        }
        write!(f, "@{} {}", self.kind.marker(), self.expression)
    }
}

/// Marks a lazy value as being evaluated on the current thread.
///
/// The identity is pushed on creation and popped on drop, so the stack is
/// restored on every exit path including errors and panics. The guard is not
/// `Send`: it must be dropped on the thread that created it.
#[derive(Debug)]
pub struct EvaluationGuard {
    id: u64,
    _not_send: PhantomData<*const ()>,
}

impl EvaluationGuard {
    /// Pushes `lazy` on the evaluation stack.
    ///
    /// Fails with `ConfigError::CircularReference` if it is already there.
    pub fn enter(lazy: &LazyValue) -> Result<Self> {
        EVALUATION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&lazy.id) {
                return Err(ConfigError::CircularReference {
                    expression: lazy.to_string(),
                });
            }
            stack.push(lazy.id);
            Ok(EvaluationGuard {
                id: lazy.id,
                _not_send: PhantomData,
            })
        })
    }
}

impl Drop for EvaluationGuard {
    fn drop(&mut self) {
        EVALUATION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|id| *id == self.id) {
                stack.remove(pos);
            }
        });
    }
}

/// Returns how many lazy values are being evaluated on the current thread.
pub fn evaluation_depth() -> usize {
    EVALUATION_STACK.with(|stack| stack.borrow().len())
}
