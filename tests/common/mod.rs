// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared helpers for integration tests.

use layercfg::domain::{ConfigError, Mapping, Result, Value};
use layercfg::ports::{ConfigSource, LayerData, LoadRequest};
use std::env;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Builds a mapping from key/value pairs.
#[allow(dead_code)]
pub fn mapping(entries: Vec<(&str, Value)>) -> Mapping {
    entries.into_iter().collect()
}

/// Builds a sequence of strings.
#[allow(dead_code)]
pub fn strings(items: &[&str]) -> Value {
    Value::Sequence(items.iter().map(|s| Value::from(*s)).collect())
}

#[derive(Debug)]
struct MockState {
    document: Mutex<Mapping>,
    failing: AtomicBool,
    loads: AtomicUsize,
}

/// An in-memory source whose document can be swapped and which can be told
/// to fail. Clones share state, so a test can keep a handle after giving the
/// source to a builder.
#[derive(Clone, Debug)]
pub struct MockSource {
    origin: String,
    state: Arc<MockState>,
}

#[allow(dead_code)]
impl MockSource {
    pub fn new(origin: &str, document: Mapping) -> Self {
        Self {
            origin: origin.to_string(),
            state: Arc::new(MockState {
                document: Mutex::new(document),
                failing: AtomicBool::new(false),
                loads: AtomicUsize::new(0),
            }),
        }
    }

    pub fn boxed(&self) -> Box<dyn ConfigSource> {
        Box::new(self.clone())
    }

    pub fn replace(&self, document: Mapping) {
        *self.state.document.lock().unwrap() = document;
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    pub fn loads(&self) -> usize {
        self.state.loads.load(Ordering::SeqCst)
    }
}

impl ConfigSource for MockSource {
    fn format_id(&self) -> &str {
        "mock"
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn load(&self, request: &LoadRequest<'_>) -> Result<Vec<LayerData>> {
        self.state.loads.fetch_add(1, Ordering::SeqCst);
        if self.state.failing.load(Ordering::SeqCst) {
            return Err(ConfigError::SourceRead {
                origin: self.origin.clone(),
                message: "mock source unavailable".to_string(),
                source: None,
            });
        }
        let document = self.state.document.lock().unwrap().clone();
        Ok(request.select(document))
    }
}

/// Helper to set and clean up environment variables
#[allow(dead_code)]
pub struct EnvGuard {
    keys: Vec<String>,
}

#[allow(dead_code)]
impl EnvGuard {
    pub fn new() -> Self {
        EnvGuard { keys: Vec::new() }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        env::set_var(key, value);
        self.keys.push(key.to_string());
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in &self.keys {
            env::remove_var(key);
        }
    }
}
