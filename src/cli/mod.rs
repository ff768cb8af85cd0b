//! CLI command definitions and handlers

mod cache_cmd;
mod doctor;
mod dossier;
mod init;
mod lookup;
mod score;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Agroscout - agribusiness prospecting dossiers
///
/// Investigates a target company/economic group through the public company
/// registry and LLM search agents, then aggregates the findings into a
/// scored dossier.
#[derive(Parser, Debug)]
#[command(name = "agroscout")]
#[command(
    version,
    about = "Generate scored prospecting dossiers for agribusiness groups",
    after_help = "\
Examples:
  agroscout dossier \"Grupo Bom Futuro\"              Investigate by name
  agroscout dossier \"Grupo X\" --cnpj 12.345.678/0001-00
  agroscout dossier \"Grupo X\" --format md -o dossier.md
  agroscout lookup 12.345.678/0001-00                Registry record only
  agroscout score facts.json                         Offline scoring
  agroscout cache stats                              Cache hit rates and sizes

API keys are read from GEMINI_API_KEY / OPENAI_API_KEY / ANTHROPIC_API_KEY."
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a complete dossier for a target company
    Dossier {
        /// Company or economic-group name to investigate
        target: String,

        /// Registry id (CNPJ); discovered automatically when omitted
        #[arg(long)]
        cnpj: Option<String>,

        /// Output format (text, json, markdown)
        #[arg(long, default_value = "text")]
        format: String,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// LLM backend override (gemini, openai, anthropic)
        #[arg(long)]
        backend: Option<String>,

        /// Skip the persistent cache tier for this run
        #[arg(long)]
        no_cache: bool,
    },

    /// Look up a company registry record by CNPJ
    Lookup {
        /// Registry id (CNPJ), formatted or bare digits
        cnpj: String,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Score a fact set from a JSON file (offline, no API calls)
    Score {
        /// Path to a JSON file with the merged facts
        facts: PathBuf,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Inspect or clear the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Check environment, API keys and cache health
    Doctor,

    /// Write an example agroscout.toml config file
    Init,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show hit rates and tier sizes
    Stats,
    /// Empty both cache tiers
    Clear,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Dossier {
            target,
            cnpj,
            format,
            output,
            backend,
            no_cache,
        } => dossier::run(dossier::DossierArgs {
            target,
            cnpj,
            format,
            output,
            backend,
            no_cache,
        }),
        Commands::Lookup { cnpj, format } => lookup::run(&cnpj, &format),
        Commands::Score { facts, format } => score::run(&facts, &format),
        Commands::Cache { action } => cache_cmd::run(action),
        Commands::Doctor => doctor::run(),
        Commands::Init => init::run(),
    }
}
