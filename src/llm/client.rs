//! LLM API client supporting Gemini, OpenAI-compatible and Anthropic backends
//!
//! Provides a unified interface for making API calls to different LLM
//! providers. Uses ureq (sync HTTP) — no async runtime needed.

use crate::llm::{LlmError, LlmResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmBackend {
    #[default]
    Gemini,
    OpenAi,
    Anthropic,
}

impl LlmBackend {
    pub fn env_key(&self) -> &'static str {
        match self {
            LlmBackend::Gemini => "GEMINI_API_KEY",
            LlmBackend::OpenAi => "OPENAI_API_KEY",
            LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn signup_url(&self) -> &'static str {
        match self {
            LlmBackend::Gemini => "https://aistudio.google.com/apikey",
            LlmBackend::OpenAi => "https://platform.openai.com/api-keys",
            LlmBackend::Anthropic => "https://console.anthropic.com/settings/keys",
        }
    }

    /// Model used for collection agents: fast, cheap, search-capable.
    pub fn fast_model(&self) -> &'static str {
        match self {
            LlmBackend::Gemini => "gemini-2.5-flash",
            LlmBackend::OpenAi => "gpt-4o-mini",
            LlmBackend::Anthropic => "claude-3-5-haiku-20241022",
        }
    }

    /// Model used for strategic analysis and auditing: deep reasoning.
    pub fn deep_model(&self) -> &'static str {
        match self {
            LlmBackend::Gemini => "gemini-2.5-pro",
            LlmBackend::OpenAi => "gpt-4o",
            LlmBackend::Anthropic => "claude-sonnet-4-20250514",
        }
    }

    pub fn api_url(&self) -> &'static str {
        match self {
            LlmBackend::Gemini => "https://generativelanguage.googleapis.com/v1beta/models",
            LlmBackend::OpenAi => "https://api.openai.com/v1/chat/completions",
            LlmBackend::Anthropic => "https://api.anthropic.com/v1/messages",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "gemini" | "google" => Some(LlmBackend::Gemini),
            "openai" => Some(LlmBackend::OpenAi),
            "anthropic" | "claude" => Some(LlmBackend::Anthropic),
            _ => None,
        }
    }
}

impl std::fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmBackend::Gemini => write!(f, "gemini"),
            LlmBackend::OpenAi => write!(f, "openai"),
            LlmBackend::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Which model class a call should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelTier {
    /// Collection agents: quick, search-grounded lookups.
    #[default]
    Fast,
    /// Narrative analysis and auditing.
    Deep,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    /// Overrides the per-tier default model when set.
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::default(),
            model: None,
            max_tokens: 8192,
            temperature: 0.2,
        }
    }
}

impl LlmConfig {
    pub fn model_for(&self, tier: ModelTier) -> &str {
        if let Some(model) = self.model.as_deref() {
            return model;
        }
        match tier {
            ModelTier::Fast => self.backend.fast_model(),
            ModelTier::Deep => self.backend.deep_model(),
        }
    }
}

/// Per-call generation options. Unset temperature/max_tokens fall back to
/// the client-level config.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub tier: ModelTier,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Ask the provider to ground the answer with web search.
    /// Honored by Gemini; ignored by the other backends.
    pub web_search: bool,
    pub system: Option<String>,
}

impl GenerateOptions {
    /// Defaults for collection agents: fast model, grounded, low temperature.
    pub fn fast_search() -> Self {
        Self {
            web_search: true,
            temperature: Some(0.1),
            ..Default::default()
        }
    }
}

/// Unified LLM client — sync HTTP via ureq (no tokio needed)
pub struct LlmClient {
    config: LlmConfig,
    api_key: String,
    agent: ureq::Agent,
}

fn make_agent() -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // We handle status codes ourselves
        .timeout_global(Some(std::time::Duration::from_secs(120))) // LLM calls can be slow
        .build()
        .new_agent()
}

impl LlmClient {
    pub fn new(config: LlmConfig, api_key: impl Into<String>) -> Self {
        Self {
            config,
            api_key: api_key.into(),
            agent: make_agent(),
        }
    }

    pub fn from_env(backend: LlmBackend) -> LlmResult<Self> {
        let config = LlmConfig {
            backend,
            ..Default::default()
        };
        Self::from_env_with_config(config)
    }

    pub fn from_env_with_config(config: LlmConfig) -> LlmResult<Self> {
        let env_key = config.backend.env_key();
        let api_key = env::var(env_key).map_err(|_| LlmError::MissingApiKey {
            env_var: env_key.to_string(),
            signup_url: config.backend.signup_url().to_string(),
        })?;
        Ok(Self::new(config, api_key))
    }

    pub fn backend(&self) -> LlmBackend {
        self.config.backend
    }

    pub fn model_for(&self, tier: ModelTier) -> &str {
        self.config.model_for(tier)
    }

    /// Generate a response (sync)
    pub fn generate(&self, prompt: &str, opts: &GenerateOptions) -> LlmResult<String> {
        match self.config.backend {
            LlmBackend::Gemini => self.generate_gemini(prompt, opts),
            LlmBackend::OpenAi => self.generate_openai(prompt, opts),
            LlmBackend::Anthropic => self.generate_anthropic(prompt, opts),
        }
    }

    /// Per-call temperature, falling back to the client config.
    fn temperature(&self, opts: &GenerateOptions) -> f32 {
        opts.temperature.unwrap_or(self.config.temperature)
    }

    /// Per-call token budget, falling back to the client config.
    fn max_tokens(&self, opts: &GenerateOptions) -> u32 {
        opts.max_tokens.unwrap_or(self.config.max_tokens)
    }

    fn generate_gemini(&self, prompt: &str, opts: &GenerateOptions) -> LlmResult<String> {
        let model = self.config.model_for(opts.tier);
        let url = format!("{}/{}:generateContent", self.config.backend.api_url(), model);

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: opts.system.as_deref().map(|s| GeminiContent {
                parts: vec![GeminiPart {
                    text: s.to_string(),
                }],
            }),
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature(opts),
                max_output_tokens: self.max_tokens(opts),
            },
            tools: if opts.web_search {
                Some(vec![GeminiTool {
                    google_search: GeminiSearchTool {},
                }])
            } else {
                None
            },
        };

        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .send_json(&body)
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let error_text = response.into_body().read_to_string().unwrap_or_default();
            return Err(LlmError::ApiError {
                status,
                message: error_text,
            });
        }

        let resp: GeminiResponse = response
            .into_body()
            .read_json()
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let text: String = resp
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LlmError::ParseError("No candidates in response".to_string()));
        }
        Ok(text)
    }

    fn generate_openai(&self, prompt: &str, opts: &GenerateOptions) -> LlmResult<String> {
        let mut messages = Vec::new();
        if let Some(sys) = opts.system.as_deref() {
            messages.push(OpenAiMessage {
                role: "system".to_string(),
                content: sys.to_string(),
            });
        }
        messages.push(OpenAiMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        let body = OpenAiRequest {
            model: self.config.model_for(opts.tier).to_string(),
            messages,
            max_tokens: self.max_tokens(opts),
            temperature: self.temperature(opts),
        };

        let response = self
            .agent
            .post(self.config.backend.api_url())
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&body)
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let error_text = response.into_body().read_to_string().unwrap_or_default();
            return Err(LlmError::ApiError {
                status,
                message: error_text,
            });
        }

        let resp: OpenAiResponse = response
            .into_body()
            .read_json()
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        resp.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::ParseError("No response choices".to_string()))
    }

    fn generate_anthropic(&self, prompt: &str, opts: &GenerateOptions) -> LlmResult<String> {
        let body = AnthropicRequest {
            model: self.config.model_for(opts.tier).to_string(),
            max_tokens: self.max_tokens(opts),
            messages: vec![OpenAiMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            system: opts.system.clone(),
            temperature: Some(self.temperature(opts)),
        };

        let response = self
            .agent
            .post(self.config.backend.api_url())
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .send_json(&body)
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let error_text = response.into_body().read_to_string().unwrap_or_default();
            return Err(LlmError::ApiError {
                status,
                message: error_text,
            });
        }

        let resp: AnthropicResponse = response
            .into_body()
            .read_json()
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        resp.content
            .into_iter()
            .find(|c| c.content_type == "text")
            .map(|c| c.text)
            .ok_or_else(|| LlmError::ParseError("No text content in response".to_string()))
    }
}

// Gemini API types
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct GeminiTool {
    google_search: GeminiSearchTool,
}

#[derive(Serialize)]
struct GeminiSearchTool {}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

// OpenAI API types
#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

// Anthropic API types
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    text: String,
}
