// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment layers example.
//!
//! This example demonstrates:
//! - Splitting a settings file into `default`, per-environment and `global` sections
//! - Switching environments at runtime
//! - Merge directives inside a file
//! - Dumping the resolved settings
//!
//! To run this example:
//! ```bash
//! APP_ENV=production cargo run --example environments
//! ```

use layercfg::prelude::*;
use std::fs;

const SETTINGS: &str = r#"
[default]
host = "localhost"
port = 8000
plugins = ["auth"]
url = "@format http://{this.HOST}:{this.PORT}"

[development]
debug = true

[production]
host = "example.com"
port = "@int 443"
plugins = ["dynaconf_merge", "metrics"]

[global]
owner = "platform-team"
"#;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt::init();

    println!("=== layercfg: Environments ===\n");

    let dir = std::env::temp_dir().join("layercfg-environments-demo");
    fs::create_dir_all(&dir)?;
    let path = dir.join("settings.toml");
    fs::write(&path, SETTINGS)?;

    let settings = Settings::builder()
        .environments(true)
        .with_file(&path)?
        .build()?;

    println!("active environment: {}", settings.current_env());
    println!("layers: {:?}", settings.layers());
    println!("url = {:?}", settings.get("url")?);
    println!("plugins = {:?}", settings.get("plugins")?);

    for env in ["development", "production"] {
        let view = settings.from_env(env)?;
        println!("\n--- {} ---", env);
        println!("{}", view.dump(&JsonParser::new())?);
    }

    fs::remove_dir_all(&dir)?;
    Ok(())
}
