//! Doctor command - check environment

use crate::cache::paths;
use crate::config::{load_config, CONFIG_FILE};
use anyhow::Result;
use std::path::Path;

pub fn run() -> Result<()> {
    println!("🩺 Agroscout Doctor\n");

    // Config file
    if Path::new(CONFIG_FILE).exists() {
        let config = load_config(Path::new("."));
        println!(
            "✓ Config: {CONFIG_FILE} (backend: {}, {} rpm)",
            config.llm.backend, config.rate_limit.rpm
        );
    } else {
        println!("○ Config: none found (defaults apply, run `agroscout init`)");
    }

    // Cache directory
    match paths::ensure_cache_dir() {
        Ok(dir) => println!("✓ Cache directory: {}", dir.display()),
        Err(e) => println!("✗ Cache directory: {e}"),
    }

    // LLM providers (BYOK - at least one needed for dossier generation)
    let has_gemini = std::env::var("GEMINI_API_KEY").is_ok();
    let has_openai = std::env::var("OPENAI_API_KEY").is_ok();
    let has_anthropic = std::env::var("ANTHROPIC_API_KEY").is_ok();

    if has_gemini || has_openai || has_anthropic {
        let mut providers = Vec::new();
        if has_gemini {
            providers.push("Gemini");
        }
        if has_openai {
            providers.push("OpenAI");
        }
        if has_anthropic {
            providers.push("Anthropic");
        }
        println!("✓ LLM providers: {}", providers.join(", "));
    } else {
        println!("○ LLM providers: none configured");
        println!("  Set GEMINI_API_KEY, OPENAI_API_KEY, or ANTHROPIC_API_KEY to generate dossiers");
        println!("  (lookup and score commands work without one)");
    }

    println!("\n✅ Doctor finished");
    Ok(())
}
