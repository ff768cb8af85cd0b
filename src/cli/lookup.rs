//! Lookup command - registry record only, no LLM involved

use crate::cache::{paths, TieredCache};
use crate::config::load_config;
use crate::limiter::CallGate;
use crate::registry::{format_cnpj, RegistryClient};
use anyhow::Result;
use console::style;
use std::path::Path;
use std::time::Duration;

pub fn run(cnpj: &str, format: &str) -> Result<()> {
    let config = load_config(Path::new("."));
    let cache = TieredCache::with_slow_tier(
        &paths::slow_tier_path(),
        Duration::from_secs(config.cache.ttl_secs),
    );
    let gate = CallGate::new(config.rate_limit.rpm);
    let client = RegistryClient::new()
        .with_backoff(Duration::from_secs(config.registry.backoff_secs));

    let record = client.lookup_cached(
        &cache,
        &gate,
        Duration::from_secs(config.rate_limit.acquire_timeout_secs),
        cnpj,
    )?;

    if format.eq_ignore_ascii_case("json") {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!("\n{}", style(&record.legal_name).bold());
    if !record.trade_name.is_empty() {
        println!("  Trade name: {}", record.trade_name);
    }
    println!("  CNPJ: {}", format_cnpj(&record.cnpj));
    println!("  Status: {}", record.registration_status);
    if !record.opened.is_empty() {
        println!("  Opened: {}", record.opened);
    }
    println!("  Legal nature: {}", record.legal_nature);
    println!("  Capital: R${:.2}", record.capital);
    if !record.company_size.is_empty() {
        println!("  Size: {}", record.company_size);
    }
    println!("  CNAE: {} - {}", record.main_cnae, record.cnae_description);
    println!("  Location: {}/{}", record.municipality, record.state);
    if !record.shareholders.is_empty() {
        println!("  Shareholders ({}):", record.shareholders.len());
        for s in &record.shareholders {
            println!("    - {} ({})", s.name, s.role);
        }
    }
    println!("  {}", style(format!("source: {}", record.source)).dim());

    Ok(())
}
