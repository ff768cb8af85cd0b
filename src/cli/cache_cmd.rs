//! Cache command - inspect or clear the two-tier response cache

use crate::cache::{paths, TieredCache};
use crate::cli::CacheAction;
use anyhow::Result;
use console::style;
use std::time::Duration;

pub fn run(action: CacheAction) -> Result<()> {
    let cache = TieredCache::with_slow_tier(&paths::slow_tier_path(), Duration::from_secs(3600));

    match action {
        CacheAction::Stats => {
            let stats = cache.stats();
            println!("\n{}", style("Cache").bold());
            println!("  Location: {}", paths::slow_tier_path().display());
            println!("  Persistent entries: {}", stats.slow_entries);
            println!("  Memory entries: {}", stats.fast_entries);
            println!(
                "  This process: {} hits / {} misses ({:.0}% hit rate)",
                stats.hits,
                stats.misses,
                stats.hit_rate() * 100.0
            );
            if stats.slow_errors > 0 {
                println!(
                    "  {}",
                    style(format!("degraded slow-tier operations: {}", stats.slow_errors)).yellow()
                );
            }
        }
        CacheAction::Clear => {
            cache.clear_all();
            println!("{} Cache cleared", style("✓").green());
        }
    }

    Ok(())
}
