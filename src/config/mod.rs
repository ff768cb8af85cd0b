//! Configuration module for Agroscout
//!
//! Loads per-project configuration from an `agroscout.toml` file in the
//! working directory (or the path given with `--config`). Every section is
//! optional; a missing or malformed file logs a warning and falls back to
//! defaults rather than failing the run.
//!
//! # Configuration Format
//!
//! ```toml
//! # agroscout.toml
//!
//! [llm]
//! backend = "gemini"        # gemini | openai | anthropic
//! # model = "gemini-2.5-pro"  # override the per-tier default
//! max_tokens = 8192
//! temperature = 0.2
//!
//! [rate_limit]
//! rpm = 14                  # requests per minute across all outbound calls
//! acquire_timeout_secs = 120
//!
//! [cache]
//! ttl_secs = 3600
//! memory_only = false
//!
//! [registry]
//! backoff_secs = 2          # base retry backoff, doubled per attempt
//! ```

use crate::llm::{LlmBackend, LlmConfig};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "agroscout.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub backend: String,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            backend: "gemini".to_string(),
            model: None,
            max_tokens: 8192,
            temperature: 0.2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Requests per minute across every outbound call.
    pub rpm: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        // Matched to the Gemini free tier (15 RPM) with one token of slack.
        Self {
            rpm: 14,
            acquire_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    /// Skip the persistent tier entirely.
    pub memory_only: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            memory_only: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Base retry backoff in seconds, doubled per attempt.
    pub backoff_secs: u64,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self { backoff_secs: 2 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub llm: LlmSettings,
    pub rate_limit: RateLimitSettings,
    pub cache: CacheSettings,
    pub registry: RegistrySettings,
}

impl ScoutConfig {
    /// Resolve the LLM client config. An unknown backend name warns and
    /// falls back to the default backend.
    pub fn llm_config(&self) -> LlmConfig {
        let backend = match LlmBackend::parse(&self.llm.backend) {
            Some(b) => b,
            None => {
                warn!(
                    "unknown llm backend '{}', using {}",
                    self.llm.backend,
                    LlmBackend::default()
                );
                LlmBackend::default()
            }
        };
        LlmConfig {
            backend,
            model: self.llm.model.clone(),
            max_tokens: self.llm.max_tokens,
            temperature: self.llm.temperature,
        }
    }
}

/// Load configuration from `dir/agroscout.toml`, falling back to defaults.
pub fn load_config(dir: &Path) -> ScoutConfig {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        debug!("no {CONFIG_FILE} found, using defaults");
        return ScoutConfig::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(raw) => match toml::from_str(&raw) {
            Ok(config) => {
                debug!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("failed to parse {}: {e}; using defaults", path.display());
                ScoutConfig::default()
            }
        },
        Err(e) => {
            warn!("failed to read {}: {e}; using defaults", path.display());
            ScoutConfig::default()
        }
    }
}

/// Commented example configuration written by `agroscout init`.
pub fn example_config() -> &'static str {
    r#"# Agroscout configuration

[llm]
# Backend: gemini (default), openai, anthropic.
# API key comes from GEMINI_API_KEY / OPENAI_API_KEY / ANTHROPIC_API_KEY.
backend = "gemini"
# Uncomment to pin a single model for every call:
# model = "gemini-2.5-pro"
max_tokens = 8192
temperature = 0.2

[rate_limit]
# Requests per minute across all outbound calls (LLM + registry).
rpm = 14
# How long a call may wait for a token before giving up.
acquire_timeout_secs = 120

[cache]
# Default TTL for cached agent responses.
ttl_secs = 3600
# Set true to skip the persistent tier (~/.cache/agroscout).
memory_only = false

[registry]
# Base retry backoff for registry lookups, doubled per attempt.
backoff_secs = 2
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path());
        assert_eq!(config.rate_limit.rpm, 14);
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.llm.backend, "gemini");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[rate_limit]\nrpm = 5\n").unwrap();
        let config = load_config(dir.path());
        assert_eq!(config.rate_limit.rpm, 5);
        assert_eq!(config.rate_limit.acquire_timeout_secs, 120);
        assert_eq!(config.cache.ttl_secs, 3600);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "not toml {{{{").unwrap();
        let config = load_config(dir.path());
        assert_eq!(config.rate_limit.rpm, 14);
    }

    #[test]
    fn test_example_config_parses() {
        let config: ScoutConfig = toml::from_str(example_config()).unwrap();
        assert_eq!(config.rate_limit.rpm, 14);
        assert!(!config.cache.memory_only);
    }

    #[test]
    fn test_unknown_backend_falls_back() {
        let config = ScoutConfig {
            llm: LlmSettings {
                backend: "mystery".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.llm_config().backend, crate::llm::LlmBackend::Gemini);
    }
}
