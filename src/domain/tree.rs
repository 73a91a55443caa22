// SPDX-License-Identifier: MIT OR Apache-2.0

//! The case-insensitive, dotted-path addressable settings tree.

use crate::domain::config_key::ConfigKey;
use crate::domain::directive::MergeDirective;
use crate::domain::errors::Result;
use crate::domain::evaluator::Evaluator;
use crate::domain::merge::MergeEngine;
use crate::domain::value::{Mapping, Value};

/// Nested configuration data addressed by dotted paths.
///
/// Path segments descend through mappings by key and through sequences by
/// numeric index (`hosts.0`). Keys are canonical upper case, so every lookup is
/// case-insensitive. Nothing is cached between calls.
///
/// # Examples
///
/// ```
/// use layercfg::domain::{DataTree, MergeEngine, Value};
///
/// let mut tree = DataTree::new(MergeEngine::default());
/// tree.set("db.host", Value::from("localhost"), false);
/// tree.set("DB.Port", Value::from(5432), false);
///
/// assert_eq!(tree.get("db.HOST"), Some(&Value::from("localhost")));
/// assert_eq!(tree.get("db").and_then(|v| v.as_mapping()).map(|m| m.len()), Some(2));
/// assert!(tree.contains("Db.port"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct DataTree {
    root: Mapping,
    engine: MergeEngine,
}

impl DataTree {
    /// Creates an empty tree that merges with `engine`.
    pub fn new(engine: MergeEngine) -> Self {
        Self {
            root: Mapping::new(),
            engine,
        }
    }

    /// Creates a tree holding `root`.
    pub fn from_mapping(root: Mapping, engine: MergeEngine) -> Self {
        Self { root, engine }
    }

    /// Returns the root mapping.
    pub fn root(&self) -> &Mapping {
        &self.root
    }

    /// Consumes the tree and returns its root mapping.
    pub fn into_mapping(self) -> Mapping {
        self.root
    }

    /// Returns the merge engine used by `set` and `merge_contribution`.
    pub fn engine(&self) -> &MergeEngine {
        &self.engine
    }

    /// Returns the number of root-level keys.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// Returns `true` when the tree has no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Iterates over canonical root-level keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys()
    }

    /// Iterates over root-level entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.root.iter()
    }

    /// Returns the raw value at `path` without evaluating lazy values.
    pub fn get(&self, path: impl Into<ConfigKey>) -> Option<&Value> {
        descend(&self.root, &path.into())
    }

    /// Returns `true` if `path` exists. Lazy values are not evaluated.
    pub fn contains(&self, path: impl Into<ConfigKey>) -> bool {
        self.get(path).is_some()
    }

    /// Returns the value at `path` with every lazy value evaluated.
    ///
    /// A lazy value met half-way down the path is evaluated and the remaining
    /// segments are looked up in its result.
    pub fn resolve(
        &self,
        path: impl Into<ConfigKey>,
        evaluator: &Evaluator,
    ) -> Result<Option<Value>> {
        let key = path.into();
        let segments: Vec<&str> = key.segments().collect();
        let Some((first, rest)) = segments.split_first() else {
            return Ok(None);
        };
        let Some(mut node) = self.root.get(first) else {
            return Ok(None);
        };
        for (index, segment) in rest.iter().enumerate() {
            if node.is_lazy() {
                let evaluated = evaluator.evaluate(node, self)?;
                return Ok(descend_owned(evaluated, &rest[index..]));
            }
            match child(node, segment) {
                Some(next) => node = next,
                None => return Ok(None),
            }
        }
        evaluator.evaluate(node, self).map(Some)
    }

    /// Returns the value at `path`, or `default` when it is absent.
    ///
    /// With `bypass_eval` the raw value is returned and lazy values stay lazy.
    pub fn get_or(
        &self,
        path: impl Into<ConfigKey>,
        default: Value,
        evaluator: &Evaluator,
        bypass_eval: bool,
    ) -> Result<Value> {
        let key = path.into();
        if bypass_eval {
            return Ok(self.get(&key).cloned().unwrap_or(default));
        }
        Ok(self.resolve(&key, evaluator)?.unwrap_or(default))
    }

    /// Stores `value` at `path`, creating intermediate mappings as needed.
    ///
    /// Without `merge` the value replaces whatever is stored; with it the value is
    /// merged into the existing one. Directives carried by `value` apply either way.
    /// A numeric segment one past the end of a sequence appends to it.
    ///
    /// Returns `false` when nothing is stored: an empty path, a delete directive,
    /// or a segment that is not a valid index into an existing sequence. The
    /// sequence is left unchanged in that last case.
    pub fn set(&mut self, path: impl Into<ConfigKey>, value: Value, merge: bool) -> bool {
        let key = path.into();
        let segments: Vec<&str> = key.segments().collect();
        let Some((first, rest)) = segments.split_first() else {
            return false;
        };
        if !self.accepts_write(&segments) {
            return false;
        }
        let directive = if merge {
            MergeDirective::MergeAppend
        } else {
            MergeDirective::Replace
        };
        let existing = self.root.remove(first);
        match assign(&self.engine, existing, rest, value, directive) {
            Some(updated) => {
                self.root.insert(first, updated);
                true
            }
            None => false,
        }
    }

    /// Checks that every existing sequence along `segments` is addressed by an
    /// index inside it or one past its end.
    fn accepts_write(&self, segments: &[&str]) -> bool {
        let Some((first, rest)) = segments.split_first() else {
            return true;
        };
        let Some(mut node) = self.root.get(first) else {
            return true;
        };
        for segment in rest {
            match node {
                Value::Sequence(items) => match segment.parse::<usize>() {
                    Ok(index) if index < items.len() => node = &items[index],
                    Ok(index) => return index == items.len(),
                    Err(_) => return false,
                },
                Value::Mapping(map) => match map.get(segment) {
                    Some(next) => node = next,
                    None => return true,
                },
                _ => return true,
            }
        }
        true
    }

    /// Removes the node at `path`, returning it.
    pub fn delete(&mut self, path: impl Into<ConfigKey>) -> Option<Value> {
        let key = path.into();
        let mut segments: Vec<&str> = key.segments().collect();
        let last = segments.pop()?;
        let Some((first, rest)) = segments.split_first() else {
            return self.root.remove(last);
        };
        let mut node = self.root.get_mut(first)?;
        for segment in rest {
            node = child_mut(node, segment)?;
        }
        match node {
            Value::Mapping(map) => map.remove(last),
            Value::Sequence(items) => {
                let index = last.parse::<usize>().ok()?;
                (index < items.len()).then(|| items.remove(index))
            }
            _ => None,
        }
    }

    /// Folds a contribution into the root; root-level keys always merge.
    pub fn merge_contribution(&mut self, incoming: Mapping) -> Option<MergeDirective> {
        self.engine.fold_root(&mut self.root, incoming)
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.root.clear();
    }
}

/// Looks up `key` inside `map` without evaluating anything.
pub fn descend<'a>(map: &'a Mapping, key: &ConfigKey) -> Option<&'a Value> {
    let mut segments = key.segments();
    let mut node = map.get(segments.next()?)?;
    for segment in segments {
        node = child(node, segment)?;
    }
    Some(node)
}

fn child<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Mapping(map) => map.get(segment),
        Value::Sequence(items) => items.get(segment.parse::<usize>().ok()?),
        _ => None,
    }
}

fn child_mut<'a>(node: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match node {
        Value::Mapping(map) => map.get_mut(segment),
        Value::Sequence(items) => items.get_mut(segment.parse::<usize>().ok()?),
        _ => None,
    }
}

fn descend_owned(value: Value, segments: &[&str]) -> Option<Value> {
    let mut node = value;
    for segment in segments {
        node = match node {
            Value::Mapping(mut map) => map.remove(segment)?,
            Value::Sequence(mut items) => {
                let index = segment.parse::<usize>().ok()?;
                if index >= items.len() {
                    return None;
                }
                items.swap_remove(index)
            }
            _ => return None,
        };
    }
    Some(node)
}

fn sequence_index(items: &[Value], segment: &str) -> Option<usize> {
    segment
        .parse::<usize>()
        .ok()
        .filter(|index| *index < items.len())
}

fn assign(
    engine: &MergeEngine,
    slot: Option<Value>,
    segments: &[&str],
    value: Value,
    directive: MergeDirective,
) -> Option<Value> {
    let Some((segment, rest)) = segments.split_first() else {
        return engine.merge(slot, value, Some(directive));
    };
    match slot {
        Some(Value::Sequence(mut items)) if sequence_index(&items, segment).is_some() => {
            let index = sequence_index(&items, segment)?;
            let current = std::mem::take(&mut items[index]);
            match assign(engine, Some(current), rest, value, directive) {
                Some(updated) => items[index] = updated,
                None => {
                    items.remove(index);
                }
            }
            Some(Value::Sequence(items))
        }
        Some(Value::Sequence(mut items)) if segment.parse::<usize>().ok() == Some(items.len()) => {
            if let Some(appended) = assign(engine, None, rest, value, directive) {
                items.push(appended);
            }
            Some(Value::Sequence(items))
        }
        Some(Value::Mapping(mut map)) => {
            let current = map.remove(segment);
            if let Some(updated) = assign(engine, current, rest, value, directive) {
                map.insert(segment, updated);
            }
            Some(Value::Mapping(map))
        }
        other => match assign(engine, None, rest, value, directive) {
            Some(updated) => {
                let mut map = Mapping::new();
                map.insert(segment, updated);
                Some(Value::Mapping(map))
            }
            None => other,
        },
    }
}
