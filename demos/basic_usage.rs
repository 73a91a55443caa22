// SPDX-License-Identifier: MIT OR Apache-2.0

//! Basic usage example for the settings store.
//!
//! This example demonstrates:
//! - Building a store from an inline document, defaults and environment variables
//! - Case-insensitive reads
//! - Lazy `@format` values and marker casts
//! - Typed reads with `get_as`
//!
//! To run this example:
//! ```bash
//! # Override a value through the environment
//! export DEMO_DATABASE__HOST="db.internal"
//!
//! cargo run --example basic_usage
//! ```

use layercfg::prelude::*;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Database {
    host: String,
    port: u16,
    url: String,
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt::init();

    println!("=== layercfg: Basic Usage ===\n");

    let mut database = Mapping::new();
    database.insert("host", Value::from("localhost"));
    database.insert("port", Value::from("@int 5432"));
    database.insert(
        "url",
        Value::from("@format postgres://{this.DATABASE.HOST}:{this.DATABASE.PORT}/{this.NAME}"),
    );
    let mut document = Mapping::new();
    document.insert("name", Value::from("demo"));
    document.insert("database", Value::Mapping(database));

    let settings = Settings::builder()
        .merge_enabled(true)
        .with_map("inline", document)
        .with_default("debug", Value::from(false))
        .with_env_prefix("DEMO")
        .build()?;

    println!("--- Example 1: Case-insensitive keys ---");
    println!("name = {:?}", settings.get("name")?);
    println!("NAME = {:?}", settings.get("NAME")?);

    println!("\n--- Example 2: Lazy values ---");
    println!("database.url = {:?}", settings.get("database.url")?);
    settings.set("name", "renamed")?;
    println!("after rename = {:?}", settings.get("database.url")?);

    println!("\n--- Example 3: Typed reads ---");
    if let Some(database) = settings.get_as::<Database>("database")? {
        println!("{:#?}", database);
    }

    println!("\n--- Example 4: Defaults and missing keys ---");
    println!("debug = {:?}", settings.get("debug")?);
    println!("timeout = {}", settings.get_or("timeout", 30)?);

    println!("\n--- Example 5: Where values came from ---");
    for contribution in settings.key_history("database") {
        println!(
            "{} ({}) in layer {}",
            contribution.origin_id(),
            contribution.format_id(),
            contribution.layer_name()
        );
    }

    Ok(())
}
