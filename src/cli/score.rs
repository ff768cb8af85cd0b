//! Score command - offline scoring of a fact set from a JSON file

use crate::models::FactSet;
use crate::scoring;
use anyhow::{Context, Result};
use console::style;
use std::path::Path;

pub fn run(facts_path: &Path, format: &str) -> Result<()> {
    let raw = std::fs::read_to_string(facts_path)
        .with_context(|| format!("failed to read {}", facts_path.display()))?;
    let facts: FactSet = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid fact set", facts_path.display()))?;

    let result = scoring::score(&facts);

    if format.eq_ignore_ascii_case("json") {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "\n{} {}/1000 — {}",
        style("Score:").bold(),
        result.score,
        style(result.tier).bold()
    );
    if result.inferred {
        println!("{}", style("(includes heuristically inferred data)").dim());
    }
    let b = &result.breakdown;
    println!("  Muscle:     {:>3}/400", b.muscle);
    println!("  Complexity: {:>3}/250", b.complexity);
    println!("  People:     {:>3}/200", b.people);
    println!("  Momentum:   {:>3}/150", b.momentum);
    println!();
    for j in &result.justifications {
        println!("  - {j}");
    }

    Ok(())
}
