//! Init command - write an example config file

use crate::config::{example_config, CONFIG_FILE};
use anyhow::{Context, Result};
use console::style;
use std::path::Path;

pub fn run() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        println!(
            "{} {} already exists, leaving it untouched",
            style("✓").green(),
            style(CONFIG_FILE).cyan()
        );
        return Ok(());
    }

    std::fs::write(path, example_config())
        .with_context(|| format!("failed to write {CONFIG_FILE}"))?;
    println!(
        "{} Created {}",
        style("✓").green(),
        style(CONFIG_FILE).cyan()
    );

    Ok(())
}
