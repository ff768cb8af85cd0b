//! Dossier command implementation
//!
//! This command wires the shared services together and drives the full
//! pipeline:
//! 1. Load agroscout.toml and resolve the LLM backend
//! 2. Construct cache, call gate and registry client (one instance each)
//! 3. Run the six-phase pipeline with a progress bar
//! 4. Render the report (text, json, markdown)

use crate::agents::AgentContext;
use crate::cache::{paths, TieredCache};
use crate::config::load_config;
use crate::limiter::CallGate;
use crate::llm::{LlmBackend, LlmClient};
use crate::orchestrator::Pipeline;
use crate::registry::RegistryClient;
use crate::reporters::{self, OutputFormat};
use anyhow::{bail, Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct DossierArgs {
    pub target: String,
    pub cnpj: Option<String>,
    pub format: String,
    pub output: Option<PathBuf>,
    pub backend: Option<String>,
    pub no_cache: bool,
}

pub fn run(args: DossierArgs) -> Result<()> {
    let format: OutputFormat = args.format.parse()?;
    let config = load_config(Path::new("."));

    let mut llm_config = config.llm_config();
    if let Some(name) = &args.backend {
        match LlmBackend::parse(name) {
            Some(backend) => llm_config.backend = backend,
            None => bail!("unknown backend '{name}'; expected gemini, openai or anthropic"),
        }
    }

    let llm = LlmClient::from_env_with_config(llm_config)?;

    let ttl = Duration::from_secs(config.cache.ttl_secs);
    let cache = if args.no_cache || config.cache.memory_only {
        TieredCache::in_memory(ttl)
    } else {
        TieredCache::with_slow_tier(&paths::slow_tier_path(), ttl)
    };

    let gate = CallGate::new(config.rate_limit.rpm);
    let registry = RegistryClient::new()
        .with_backoff(Duration::from_secs(config.registry.backoff_secs));

    let ctx = AgentContext {
        cache: &cache,
        gate: &gate,
        llm: &llm,
        call_timeout: Duration::from_secs(config.rate_limit.acquire_timeout_secs),
    };

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {msg}")
            .expect("static template")
            .progress_chars("=>-"),
    );

    let pipeline = Pipeline::new(ctx, &registry).with_progress(|fraction, message| {
        bar.set_position((fraction * 100.0) as u64);
        bar.set_message(message.to_string());
    });

    let dossier = pipeline.run(&args.target, args.cnpj.as_deref().unwrap_or(""))?;
    bar.finish_and_clear();

    let report = reporters::render(&dossier, format)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &report)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "{} Wrote {} report to {}",
                style("✓").green(),
                format,
                style(path.display()).cyan()
            );
        }
        None => println!("{report}"),
    }

    let cache_stats = cache.stats();
    let gate_stats = gate.stats();
    eprintln!(
        "{}",
        style(format!(
            "cache: {} hits / {} misses ({:.0}% hit rate) | queue: {} requests, {} errors, avg wait {:.2}s",
            cache_stats.hits,
            cache_stats.misses,
            cache_stats.hit_rate() * 100.0,
            gate_stats.total_requests,
            gate_stats.total_errors,
            gate_stats.avg_wait_seconds
        ))
        .dim()
    );

    Ok(())
}
