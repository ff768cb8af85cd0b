//! Investigation agents
//!
//! Each collection agent wraps one LLM call: cache check, prompt build,
//! rate-gated generation, JSON extraction, cache write. Agents return a
//! loosely-typed JSON fragment; the orchestrator parses it into the typed
//! model with defaults, so a malformed reply degrades instead of failing
//! the pipeline.

mod analyst;
mod auditor;
mod discovery;
mod financial;
mod intel;
mod recon;

pub use analyst::{split_sections, StrategistAgent, SECTION_TITLES};
pub use auditor::{AuditOutcome, QualityAuditor};
pub use discovery::discover_cnpj;
pub use financial::FinanceAgent;
pub use intel::MarketIntelAgent;
pub use recon::OperationsAgent;

use crate::cache::TieredCache;
use crate::limiter::{CallGate, Priority};
use crate::llm::{GenerateOptions, LlmClient};
use std::time::Duration;
use tracing::warn;

/// Shared services handed to every agent call. Constructed once at process
/// start and passed by reference (no hidden globals).
pub struct AgentContext<'a> {
    pub cache: &'a TieredCache,
    pub gate: &'a CallGate,
    pub llm: &'a LlmClient,
    /// Deadline for waiting on a rate-limit token.
    pub call_timeout: Duration,
}

/// What an agent is asked to investigate.
#[derive(Debug, Clone, Default)]
pub struct TargetQuery {
    /// The identifier the user typed.
    pub target: String,
    /// Official group name once known (recon output); may be empty.
    pub group_name: String,
    /// Static sector/region enrichment for the prompt; may be empty.
    pub sector_context: String,
}

impl TargetQuery {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    /// Best name to investigate under.
    pub fn effective_name(&self) -> &str {
        if self.group_name.is_empty() {
            &self.target
        } else {
            &self.group_name
        }
    }
}

/// A collection collaborator consumed by the orchestrator.
///
/// `collect` never fails: any transport, rate-limit or parse problem is
/// logged and folded into the returned fragment as defaults.
pub trait CollectionAgent: Send + Sync {
    fn name(&self) -> &'static str;
    fn collect(&self, ctx: &AgentContext<'_>, query: &TargetQuery) -> serde_json::Value;
}

/// Composes the narrative briefing from merged facts and score.
pub trait NarrativeAgent: Send + Sync {
    fn compose(
        &self,
        ctx: &AgentContext<'_>,
        facts_json: &serde_json::Value,
        score: &crate::models::ScoreResult,
        sector_context: &str,
    ) -> String;
}

/// Best-effort audit over the finished briefing.
pub trait AuditAgent: Send + Sync {
    fn audit(
        &self,
        ctx: &AgentContext<'_>,
        analysis: &str,
        facts_json: &serde_json::Value,
    ) -> AuditOutcome;
}

/// Finds a registry id for a bare company name.
pub trait DiscoveryAgent: Send + Sync {
    fn discover(&self, ctx: &AgentContext<'_>, company_name: &str) -> Option<String>;
}

/// Default discovery agent backed by [`discover_cnpj`].
pub struct CnpjDiscovery;

impl DiscoveryAgent for CnpjDiscovery {
    fn discover(&self, ctx: &AgentContext<'_>, company_name: &str) -> Option<String> {
        discover_cnpj(ctx, company_name)
    }
}

/// Run one gated LLM call and return the raw text, or None on any failure.
pub(crate) fn gated_generate(
    ctx: &AgentContext<'_>,
    agent: &str,
    priority: Priority,
    prompt: &str,
    opts: &GenerateOptions,
) -> Option<String> {
    match ctx
        .gate
        .execute(priority, ctx.call_timeout, || ctx.llm.generate(prompt, opts))
    {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("{agent} call failed: {e}");
            None
        }
    }
}
