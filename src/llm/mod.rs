//! LLM service access
//!
//! Sync client for the investigation agents with support for multiple
//! backends (Gemini, OpenAI-compatible, Anthropic). BYOK (bring your own
//! key) model - API keys are read from environment variables.
//!
//! # Environment Variables
//!
//! - `GEMINI_API_KEY`: Required for the Gemini backend (default)
//! - `OPENAI_API_KEY`: Required for the OpenAI backend
//! - `ANTHROPIC_API_KEY`: Required for the Anthropic backend

mod client;
mod json;

pub use client::{GenerateOptions, LlmBackend, LlmClient, LlmConfig, ModelTier};
pub use json::{extract_json_array, extract_json_object};

use thiserror::Error;

/// Errors that can occur when talking to the LLM service
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Missing API key: {env_var} not set. Get your key at {signup_url}")]
    MissingApiKey { env_var: String, signup_url: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("API request failed: {0}")]
    Transport(String),

    #[error("Failed to parse API response: {0}")]
    ParseError(String),
}

pub type LlmResult<T> = Result<T, LlmError>;
