// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merge directives and the in-band tokens that carry them.
//!
//! Incoming data can ask for a non-default merge in three ways:
//!
//! - a mapping key `dynaconf_merge`, `dynaconf_merge_unique` or `dynaconf_reset`
//! - a sequence element equal to `dynaconf_merge` or `dynaconf_merge_unique`
//! - a `Value::Directive` wrapper produced by a converter marker such as `@merge`
//!
//! Tokens are always removed from the data before it is stored.

use crate::domain::value::Value;

/// Mapping key or sequence element requesting a merge-append.
pub const MERGE_TOKEN: &str = "dynaconf_merge";

/// Mapping key or sequence element requesting a merge-unique-append.
pub const MERGE_UNIQUE_TOKEN: &str = "dynaconf_merge_unique";

/// Mapping key requesting that the existing mapping be replaced wholesale.
pub const RESET_TOKEN: &str = "dynaconf_reset";

/// How an incoming value combines with the value already stored at its key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MergeDirective {
    /// The incoming value replaces the existing one.
    Replace,
    /// Sequences are concatenated, mappings are merged key by key.
    MergeAppend,
    /// Like `MergeAppend`, but sequence items already present are skipped.
    MergeUniqueAppend,
    /// The existing key is removed.
    Delete,
    /// The existing value is discarded before the incoming one is stored.
    Reset,
}

impl MergeDirective {
    /// Returns `true` for the two merging directives.
    pub fn is_merge(self) -> bool {
        matches!(
            self,
            MergeDirective::MergeAppend | MergeDirective::MergeUniqueAppend
        )
    }

    /// Returns the directive nested values inherit from a parent carrying `self`.
    ///
    /// `Delete` and `Reset` act on the tagged value only, so children fall back
    /// to plain replacement.
    pub fn inherited(self) -> MergeDirective {
        match self {
            MergeDirective::MergeAppend | MergeDirective::MergeUniqueAppend => self,
            _ => MergeDirective::Replace,
        }
    }
}

/// Interprets a token's value as a flag.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Integer(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "on" | "1"
        ),
        Value::Directive(_, inner) => is_truthy(inner),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) | Value::Lazy(_) => false,
    }
}

fn sequence_token(item: &Value) -> Option<MergeDirective> {
    let token = item.as_str()?.trim();
    if token.eq_ignore_ascii_case(MERGE_TOKEN) {
        Some(MergeDirective::MergeAppend)
    } else if token.eq_ignore_ascii_case(MERGE_UNIQUE_TOKEN) {
        Some(MergeDirective::MergeUniqueAppend)
    } else {
        None
    }
}

/// Splits an incoming value into its explicit directive and the bare value.
///
/// Only the top level of `value` is inspected; nested tokens are left for the
/// recursive merge to find. An outer `Value::Directive` wins over tokens found
/// inside the value it wraps, but those tokens are still removed.
///
/// # Examples
///
/// ```
/// use layercfg::domain::{take_directive, MergeDirective, Value};
///
/// let incoming = Value::Sequence(vec![Value::from("dynaconf_merge"), Value::from("blue")]);
/// let (directive, bare) = take_directive(incoming);
/// assert_eq!(directive, Some(MergeDirective::MergeAppend));
/// assert_eq!(bare, Value::Sequence(vec![Value::from("blue")]));
/// ```
pub fn take_directive(value: Value) -> (Option<MergeDirective>, Value) {
    match value {
        Value::Directive(directive, inner) => {
            let (_, bare) = take_directive(*inner);
            (Some(directive), bare)
        }
        Value::Sequence(items) => {
            let mut directive = None;
            let items = items
                .into_iter()
                .filter(|item| match sequence_token(item) {
                    Some(found) => {
                        directive = Some(found);
                        false
                    }
                    None => true,
                })
                .collect();
            (directive, Value::Sequence(items))
        }
        Value::Mapping(mut map) => {
            let mut directive = None;
            if let Some(flag) = map.remove(MERGE_TOKEN) {
                directive = Some(if is_truthy(&flag) {
                    MergeDirective::MergeAppend
                } else {
                    MergeDirective::Replace
                });
            }
            if let Some(flag) = map.remove(MERGE_UNIQUE_TOKEN) {
                if is_truthy(&flag) {
                    directive = Some(MergeDirective::MergeUniqueAppend);
                }
            }
            if let Some(flag) = map.remove(RESET_TOKEN) {
                if is_truthy(&flag) {
                    directive = Some(MergeDirective::Reset);
                }
            }
            (directive, Value::Mapping(map))
        }
        other => (None, other),
    }
}

/// Removes every directive and token from `value`, recursively.
///
/// Returns `None` when the value itself is a delete directive: there is nothing
/// to store. Entries and items tagged for deletion are dropped.
pub fn strip_directives(value: Value) -> Option<Value> {
    let (directive, bare) = take_directive(value);
    if directive == Some(MergeDirective::Delete) {
        return None;
    }
    Some(match bare {
        Value::Sequence(items) => {
            Value::Sequence(items.into_iter().filter_map(strip_directives).collect())
        }
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .filter_map(|(k, v)| strip_directives(v).map(|v| (k, v)))
                .collect(),
        ),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::Mapping;

    fn mapping(entries: Vec<(&str, Value)>) -> Value {
        Value::Mapping(entries.into_iter().collect())
    }

    #[test]
    fn test_sequence_merge_token_removed() {
        let incoming = Value::Sequence(vec![Value::from("a"), Value::from("DYNACONF_MERGE")]);
        let (directive, bare) = take_directive(incoming);
        assert_eq!(directive, Some(MergeDirective::MergeAppend));
        assert_eq!(bare, Value::Sequence(vec![Value::from("a")]));
    }

    #[test]
    fn test_sequence_unique_token() {
        let incoming = Value::Sequence(vec![Value::from("dynaconf_merge_unique")]);
        let (directive, bare) = take_directive(incoming);
        assert_eq!(directive, Some(MergeDirective::MergeUniqueAppend));
        assert_eq!(bare, Value::Sequence(vec![]));
    }

    #[test]
    fn test_mapping_merge_flag_false_means_replace() {
        let incoming = mapping(vec![("dynaconf_merge", Value::from(false)), ("a", Value::from(1))]);
        let (directive, bare) = take_directive(incoming);
        assert_eq!(directive, Some(MergeDirective::Replace));
        assert_eq!(bare, mapping(vec![("a", Value::from(1))]));
    }

    #[test]
    fn test_mapping_reset_token() {
        let incoming = mapping(vec![("dynaconf_reset", Value::from(true)), ("a", Value::from(1))]);
        let (directive, _) = take_directive(incoming);
        assert_eq!(directive, Some(MergeDirective::Reset));
    }

    #[test]
    fn test_outer_directive_wins_and_strips_inner_tokens() {
        let inner = Value::Sequence(vec![Value::from("dynaconf_merge"), Value::from(1)]);
        let incoming = Value::Directive(MergeDirective::Replace, Box::new(inner));
        let (directive, bare) = take_directive(incoming);
        assert_eq!(directive, Some(MergeDirective::Replace));
        assert_eq!(bare, Value::Sequence(vec![Value::from(1)]));
    }

    #[test]
    fn test_plain_value_has_no_directive() {
        let (directive, bare) = take_directive(Value::from("x"));
        assert_eq!(directive, None);
        assert_eq!(bare, Value::from("x"));
    }

    #[test]
    fn test_strip_directives_recursive() {
        let incoming = mapping(vec![
            ("dynaconf_merge", Value::from(true)),
            (
                "nested",
                mapping(vec![
                    ("keep", Value::from(1)),
                    (
                        "gone",
                        Value::Directive(MergeDirective::Delete, Box::new(Value::Null)),
                    ),
                    (
                        "list",
                        Value::Sequence(vec![Value::from("dynaconf_merge"), Value::from(2)]),
                    ),
                ]),
            ),
        ]);
        let stripped = strip_directives(incoming).unwrap();
        let expected = mapping(vec![(
            "nested",
            mapping(vec![
                ("keep", Value::from(1)),
                ("list", Value::Sequence(vec![Value::from(2)])),
            ]),
        )]);
        assert_eq!(stripped, expected);
    }

    #[test]
    fn test_strip_delete_is_none() {
        let incoming = Value::Directive(MergeDirective::Delete, Box::new(Value::Null));
        assert_eq!(strip_directives(incoming), None);
        assert_eq!(strip_directives(Value::Mapping(Mapping::new())), Some(Value::Mapping(Mapping::new())));
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&Value::from("On")));
        assert!(is_truthy(&Value::from(1)));
        assert!(!is_truthy(&Value::from("false")));
        assert!(!is_truthy(&Value::Null));
    }

    #[test]
    fn test_inherited() {
        assert_eq!(
            MergeDirective::MergeUniqueAppend.inherited(),
            MergeDirective::MergeUniqueAppend
        );
        assert_eq!(MergeDirective::Reset.inherited(), MergeDirective::Replace);
        assert_eq!(MergeDirective::Delete.inherited(), MergeDirective::Replace);
    }
}
