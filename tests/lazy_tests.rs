// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for lazy values: interpolation, templates, references
//! and cycle detection.

mod common;

use common::{mapping, EnvGuard};
use layercfg::domain::lazy::evaluation_depth;
use layercfg::domain::{DataTree, EvalContext, Evaluator, LazyKind, LazyValue, MergeEngine};
use layercfg::prelude::*;
use std::sync::Arc;
use std::thread;

fn settings_with(data: Mapping) -> Settings {
    Settings::builder().with_map("inline", data).build().unwrap()
}

#[test]
fn test_format_reads_other_keys() {
    let settings = settings_with(mapping(vec![
        ("host", Value::from("localhost")),
        ("port", Value::from(5432)),
        ("url", Value::from("@format postgres://{this.HOST}:{this.port}/app")),
    ]));
    assert_eq!(
        settings.get("url").unwrap(),
        Some(Value::from("postgres://localhost:5432/app"))
    );
}

#[test]
fn test_format_is_evaluated_on_every_read() {
    let settings = settings_with(mapping(vec![
        ("host", Value::from("localhost")),
        ("url", Value::from("@format http://{this.HOST}")),
    ]));
    assert_eq!(settings.get("url").unwrap(), Some(Value::from("http://localhost")));
    settings.set("host", "example.com").unwrap();
    assert_eq!(
        settings.get("url").unwrap(),
        Some(Value::from("http://example.com"))
    );
}

#[test]
fn test_format_reads_environment() {
    let mut guard = EnvGuard::new();
    guard.set("LAYERCFG_LAZY_ROOT", "/srv");
    let settings = settings_with(mapping(vec![
        ("data_dir", Value::from("@format {env[LAYERCFG_LAZY_ROOT]}/data")),
        ("cache_dir", Value::from("@format {env.LAYERCFG_LAZY_ABSENT}/cache")),
    ]));
    assert_eq!(settings.get("data_dir").unwrap(), Some(Value::from("/srv/data")));
    assert_eq!(settings.get("cache_dir").unwrap(), Some(Value::from("/cache")));
}

#[test]
fn test_format_escaped_braces() {
    let settings = settings_with(mapping(vec![
        ("name", Value::from("app")),
        ("label", Value::from("@format {{literal}} {this.NAME}")),
    ]));
    assert_eq!(settings.get("label").unwrap(), Some(Value::from("{literal} app")));
}

#[test]
fn test_format_missing_key_is_an_error() {
    let settings = settings_with(mapping(vec![(
        "url",
        Value::from("@format http://{this.MISSING}"),
    )]));
    let err = settings.get("url").unwrap_err();
    assert!(matches!(err, ConfigError::Interpolation { .. }));
    assert_eq!(evaluation_depth(), 0);
}

#[test]
fn test_cast_applies_after_evaluation() {
    let settings = settings_with(mapping(vec![
        ("base_port", Value::from("8080")),
        ("port", Value::from("@int @format {this.BASE_PORT}")),
    ]));
    assert_eq!(settings.get("port").unwrap(), Some(Value::from(8080)));
    let raw = settings.get_raw("port").unwrap().unwrap();
    assert_eq!(raw.as_lazy().unwrap().casts(), ["int".to_string()]);
}

#[test]
fn test_template_with_filters() {
    let settings = settings_with(mapping(vec![
        ("name", Value::from("app")),
        (
            "banner",
            Value::from(
                "@jinja {{ this.name | upper }}-{{ env.LAYERCFG_LAZY_NOPE | default('none') }}",
            ),
        ),
    ]));
    assert_eq!(settings.get("banner").unwrap(), Some(Value::from("APP-none")));
}

struct ReversingRenderer;

impl TemplateRenderer for ReversingRenderer {
    fn name(&self) -> &str {
        "reversing"
    }

    fn render(&self, template: &str, context: &EvalContext<'_>) -> Result<String> {
        let value = context.lookup(template)?.unwrap_or(Value::Null);
        Ok(value.to_string().chars().rev().collect())
    }
}

#[test]
fn test_custom_renderer() {
    let settings = Settings::builder()
        .renderer(ReversingRenderer)
        .with_map(
            "inline",
            mapping(vec![
                ("name", Value::from("abc")),
                ("mirrored", Value::from("@jinja this.NAME")),
            ]),
        )
        .build()
        .unwrap();
    assert_eq!(settings.get("mirrored").unwrap(), Some(Value::from("cba")));
}

#[test]
fn test_template_without_renderer_fails() {
    let mut tree = DataTree::new(MergeEngine::default());
    tree.set(
        "greeting",
        Value::Lazy(LazyValue::new(LazyKind::Template, "{{ this.name }}")),
        false,
    );
    let err = tree.resolve("greeting", &Evaluator::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Template { .. }));
}

#[test]
fn test_reference_returns_structure() {
    let settings = settings_with(mapping(vec![
        (
            "database",
            Value::Mapping(mapping(vec![
                ("host", Value::from("localhost")),
                ("url", Value::from("@format {this.DATABASE.HOST}:5432")),
            ])),
        ),
        ("replica", Value::from("@get database")),
    ]));
    assert_eq!(
        settings.get("replica").unwrap(),
        Some(Value::Mapping(mapping(vec![
            ("host", Value::from("localhost")),
            ("url", Value::from("localhost:5432")),
        ])))
    );
    assert_eq!(
        settings.get("replica.url").unwrap(),
        Some(Value::from("localhost:5432"))
    );
}

#[test]
fn test_reference_default() {
    let settings = settings_with(mapping(vec![
        ("timeout", Value::from("@get request_timeout @int 30")),
        ("mode", Value::from("@get run_mode fast")),
    ]));
    assert_eq!(settings.get("timeout").unwrap(), Some(Value::from(30)));
    assert_eq!(settings.get("mode").unwrap(), Some(Value::from("fast")));
}

#[test]
fn test_reference_missing_without_default() {
    let settings = settings_with(mapping(vec![("alias", Value::from("@get nowhere"))]));
    assert!(matches!(
        settings.get("alias").unwrap_err(),
        ConfigError::Interpolation { .. }
    ));
}

#[test]
fn test_mutual_references_are_circular() {
    let settings = settings_with(Mapping::new());
    settings.set("A", "@format {this.B}").unwrap();
    settings.set("B", "@format {this.A}").unwrap();
    settings.set("C", "plain").unwrap();

    let err = settings.get("A").unwrap_err();
    assert!(matches!(err, ConfigError::CircularReference { .. }));
    assert_eq!(evaluation_depth(), 0);

    assert_eq!(settings.get("C").unwrap(), Some(Value::from("plain")));
    assert!(matches!(
        settings.get("B").unwrap_err(),
        ConfigError::CircularReference { .. }
    ));
    assert_eq!(evaluation_depth(), 0);
}

#[test]
fn test_transitive_and_self_references_are_circular() {
    let settings = settings_with(mapping(vec![
        ("a", Value::from("@get b")),
        ("b", Value::from("@format {this.C}")),
        ("c", Value::from("@jinja {{ this.a }}")),
        ("selfish", Value::from("@format {this.SELFISH}!")),
    ]));
    assert!(matches!(
        settings.get("a").unwrap_err(),
        ConfigError::CircularReference { .. }
    ));
    assert!(matches!(
        settings.get("selfish").unwrap_err(),
        ConfigError::CircularReference { .. }
    ));
    assert_eq!(evaluation_depth(), 0);
}

#[test]
fn test_shared_dependency_is_not_circular() {
    let settings = settings_with(mapping(vec![
        ("host", Value::from("@format local{this.SUFFIX}")),
        ("suffix", Value::from("host")),
        ("pair", Value::from("@format {this.HOST}/{this.HOST}")),
    ]));
    assert_eq!(
        settings.get("pair").unwrap(),
        Some(Value::from("localhost/localhost"))
    );
}

#[test]
fn test_evaluation_is_deterministic() {
    let settings = settings_with(mapping(vec![
        ("name", Value::from("app")),
        ("label", Value::from("@format [{this.NAME}]")),
    ]));
    let first = settings.get("label").unwrap();
    let second = settings.get("label").unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_reads_of_shared_store() {
    let settings = Arc::new(settings_with(mapping(vec![
        ("host", Value::from("localhost")),
        ("url", Value::from("@format http://{this.HOST}")),
        ("loop", Value::from("@format {this.LOOP}")),
    ])));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let settings = Arc::clone(&settings);
            thread::spawn(move || {
                for _ in 0..50 {
                    if i % 2 == 0 {
                        assert_eq!(
                            settings.get("url").unwrap(),
                            Some(Value::from("http://localhost"))
                        );
                    } else {
                        assert!(matches!(
                            settings.get("loop").unwrap_err(),
                            ConfigError::CircularReference { .. }
                        ));
                    }
                }
                evaluation_depth()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 0);
    }
}

#[test]
fn test_independent_stores_on_many_threads() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            thread::spawn(move || {
                let settings = settings_with(mapping(vec![
                    ("id", Value::from(i)),
                    ("label", Value::from("@format worker-{this.ID}")),
                ]));
                settings.get("label").unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(
            handle.join().unwrap(),
            Some(Value::from(format!("worker-{}", i)))
        );
    }
}
