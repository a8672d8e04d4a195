//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "arch-conform.toml";

const DEFAULT_CONFIG: &str = r#"# arch-conform configuration
#
# Rules run against a dependency graph (arch-graph.json by default).
# Replace the com.example packages below with your own.

# Lowest severity that fails a check: "info", "warning" or "error"
fail_on = "error"

[import]
# Package prefixes to keep; empty keeps every package
packages = ["com.example"]
# Keep units from test sources and libraries
include_tests = false
include_external = false

# Patterns: "." separates packages, ".." matches any number of packages,
# "*" matches one package name and "(*)" captures it as a slice name.

[[layers]]
name = "Controllers"
packages = ["com.example.controllers.."]

[[layers]]
name = "Services"
packages = ["com.example.service.."]

# No other unit may depend on the Controllers layer
[[isolate-layer]]
layer = "Controllers"
# "all" judges every origin, "layers" only origins inside a declared layer
considering = "all"
message = "Controllers are entry points and must not be called from other code."
# doc = "ARCHITECTURE.md#controllers"
# severity = "warning"

# Units in these packages may only be accessed by themselves
# [[only-self-access]]
# name = "config-self-only"
# packages = "com.example.config"

# Top-level packages must not depend on each other in cycles
[[free-of-cycles]]
name = "modules-free-of-cycles"
slices = "com.example.(*).."
# max_witnesses = 20
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = write_template(Path::new("."), force)?;

    println!("Created {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE} to declare your layers and rules");
    println!("  2. Export your dependency graph to arch-graph.json");
    println!("  3. Run: arch-conform check");

    Ok(())
}

fn write_template(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILE);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    Ok(config_path)
}
