// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structural merge of incoming data into existing tree state.
//!
//! The merge is type-directed and recursive. Two sequences are concatenated,
//! de-duplicated or replaced depending on the directive; two mappings are merged
//! key by key when the directive is a merging one; everything else is replaced.
//!
//! Root-level keys are always folded into the existing root key by key, whatever
//! the merge flag says. Only the values under those keys obey the flag.

use crate::domain::directive::{strip_directives, take_directive, MergeDirective};
use crate::domain::value::{Mapping, Value};

/// Merges incoming values into existing ones.
///
/// # Examples
///
/// ```
/// use layercfg::domain::{MergeDirective, MergeEngine, Value};
///
/// let engine = MergeEngine::new(false);
/// let old = Value::Sequence(vec![Value::from("red"), Value::from("green")]);
/// let new = Value::Sequence(vec![Value::from("green"), Value::from("blue")]);
///
/// let merged = engine.merge(Some(old), new, Some(MergeDirective::MergeUniqueAppend));
/// assert_eq!(
///     merged,
///     Some(Value::Sequence(vec![
///         Value::from("red"),
///         Value::from("green"),
///         Value::from("blue"),
///     ]))
/// );
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeEngine {
    merge_enabled: bool,
}

impl MergeEngine {
    /// Creates an engine. With `merge_enabled`, directive-less nested values merge
    /// instead of replacing.
    pub fn new(merge_enabled: bool) -> Self {
        Self { merge_enabled }
    }

    /// Returns the default for directive-less nested merges.
    pub fn merge_enabled(&self) -> bool {
        self.merge_enabled
    }

    fn default_directive(&self) -> MergeDirective {
        if self.merge_enabled {
            MergeDirective::MergeAppend
        } else {
            MergeDirective::Replace
        }
    }

    /// Merges `new` into `old`.
    ///
    /// `directive` is the directive inherited from the caller; a directive carried
    /// by `new` itself takes precedence over it, and the engine's merge flag is
    /// used when neither is present. Returns `None` when the result is that the
    /// key should not exist (a delete directive).
    pub fn merge(
        &self,
        old: Option<Value>,
        new: Value,
        directive: Option<MergeDirective>,
    ) -> Option<Value> {
        let (explicit, new) = take_directive(new);
        let directive = explicit.or(directive);

        if directive == Some(MergeDirective::Delete) {
            tracing::trace!(existed = old.is_some(), "delete directive applied");
            return None;
        }

        let old = match old {
            Some(old) => old,
            None => return strip_directives(new),
        };
        if old == new {
            return Some(new);
        }

        let directive = directive.unwrap_or_else(|| self.default_directive());
        if directive == MergeDirective::Reset {
            tracing::trace!("reset directive replaces existing value");
            return strip_directives(new);
        }

        match (old, new) {
            (Value::Sequence(old_items), Value::Sequence(new_items)) => {
                let new_items = new_items.into_iter().filter_map(strip_directives);
                Some(Value::Sequence(match directive {
                    MergeDirective::MergeAppend => old_items.into_iter().chain(new_items).collect(),
                    MergeDirective::MergeUniqueAppend => append_unique(old_items, new_items),
                    _ => new_items.collect(),
                }))
            }
            (Value::Mapping(old_map), Value::Mapping(new_map)) if directive.is_merge() => Some(
                Value::Mapping(self.merge_mapping(old_map, new_map, Some(directive.inherited()))),
            ),
            (_, new) => strip_directives(new),
        }
    }

    /// Merges every key of `new` into a copy of `old`.
    pub fn merge_mapping(
        &self,
        old: Mapping,
        new: Mapping,
        directive: Option<MergeDirective>,
    ) -> Mapping {
        let mut result = old;
        for (key, value) in new {
            let existing = result.remove(&key);
            if let Some(merged) = self.merge(existing, value, directive) {
                result.insert(key, merged);
            }
        }
        result
    }

    /// Folds a whole contribution into the root mapping.
    ///
    /// Root-level keys always merge. A root-level `dynaconf_merge` token sets the
    /// directive inherited by every value of the contribution; it is returned so
    /// callers can record it.
    pub fn fold_root(&self, root: &mut Mapping, incoming: Mapping) -> Option<MergeDirective> {
        let (directive, incoming) = take_directive(Value::Mapping(incoming));
        let directive = directive.map(MergeDirective::inherited);
        if let Value::Mapping(incoming) = incoming {
            for (key, value) in incoming {
                let existing = root.remove(&key);
                if let Some(merged) = self.merge(existing, value, directive) {
                    root.insert(key, merged);
                }
            }
        }
        directive
    }
}

fn append_unique(old: Vec<Value>, new: impl Iterator<Item = Value>) -> Vec<Value> {
    let mut result = old;
    for item in new {
        if !result.contains(&item) {
            result.push(item);
        }
    }
    result
}
