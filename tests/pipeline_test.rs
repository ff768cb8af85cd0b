//! Integration tests for the dossier pipeline
//!
//! Collaborators are stubbed so no network is touched: collection agents
//! return canned fragments, the strategist returns a fixed briefing, and the
//! registry client points at an unroutable endpoint to exercise the
//! degraded path.

use agroscout::agents::{
    AgentContext, AuditAgent, AuditOutcome, CollectionAgent, DiscoveryAgent, NarrativeAgent,
    TargetQuery,
};
use agroscout::cache::TieredCache;
use agroscout::limiter::CallGate;
use agroscout::llm::{LlmClient, LlmConfig};
use agroscout::models::{QualityLevel, ScoreResult, Tier};
use agroscout::orchestrator::Pipeline;
use agroscout::registry::RegistryClient;
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;

// ==================== stubs ====================

struct StubAgent {
    fragment: Value,
}

impl CollectionAgent for StubAgent {
    fn name(&self) -> &'static str {
        "stub-agent"
    }
    fn collect(&self, _ctx: &AgentContext<'_>, _query: &TargetQuery) -> Value {
        self.fragment.clone()
    }
}

struct StubStrategist;

impl NarrativeAgent for StubStrategist {
    fn compose(
        &self,
        _ctx: &AgentContext<'_>,
        _facts: &Value,
        _score: &ScoreResult,
        _sector: &str,
    ) -> String {
        let section = "briefing ".repeat(120);
        format!("{section} ||| {section} ||| {section} ||| {section}")
    }
}

struct StubAuditor {
    outcome_completed: bool,
}

impl AuditAgent for StubAuditor {
    fn audit(&self, _ctx: &AgentContext<'_>, _analysis: &str, _facts: &Value) -> AuditOutcome {
        if self.outcome_completed {
            AuditOutcome::Completed {
                final_note: 8.5,
                level: "BOM".to_string(),
                recommendations: vec!["mention the CRA issuance earlier".to_string()],
            }
        } else {
            AuditOutcome::Degraded {
                reason: "auditor offline".to_string(),
            }
        }
    }
}

struct NoDiscovery;

impl DiscoveryAgent for NoDiscovery {
    fn discover(&self, _ctx: &AgentContext<'_>, _company_name: &str) -> Option<String> {
        None
    }
}

/// Discovery stub that records it was asked.
struct RecordingDiscovery {
    asked: Mutex<Vec<String>>,
}

impl DiscoveryAgent for RecordingDiscovery {
    fn discover(&self, _ctx: &AgentContext<'_>, company_name: &str) -> Option<String> {
        self.asked.lock().unwrap().push(company_name.to_string());
        None
    }
}

fn test_llm() -> LlmClient {
    LlmClient::new(LlmConfig::default(), "test-key")
}

/// Registry client pointing at a closed local port with minimal backoff.
fn unreachable_registry() -> RegistryClient {
    RegistryClient::new()
        .with_endpoints("http://127.0.0.1:9/brasilapi", "http://127.0.0.1:9/receitaws")
        .with_backoff(Duration::from_millis(1))
}

fn ops_fragment() -> Value {
    json!({
        "group_name": "Grupo Horizonte Agro",
        "hectares": 12_000,
        "crops": ["soja", "milho"],
        "vertical": {"agro_industry": true},
        "regions": ["MT"],
        "farm_count": 4,
        "technologies": ["ERP TOTVS"],
        "confidence": 0.85,
    })
}

fn finance_fragment() -> Value {
    json!({
        "estimated_capital": 60_000_000.0,
        "estimated_employees": 0,
        "movements": ["Emissão de CRA de R$50M via Itaú BBA"],
        "fiagro_funds": ["SNFZ11"],
        "corporate_governance": true,
        "confidence": 0.7,
    })
}

fn intel_fragment() -> Value {
    json!({
        "headlines": [{"title": "Expansão para o oeste da Bahia", "relevance": "alta"}],
        "buy_signals": ["contratou CFO"],
        "risks": [],
        "confidence": 0.6,
    })
}

// ==================== tests ====================

#[test]
fn full_pipeline_produces_a_complete_dossier() {
    let cache = TieredCache::in_memory(Duration::from_secs(60));
    let gate = CallGate::new(600);
    let llm = test_llm();
    let registry = unreachable_registry();
    let ctx = AgentContext {
        cache: &cache,
        gate: &gate,
        llm: &llm,
        call_timeout: Duration::from_secs(1),
    };

    let ops = StubAgent { fragment: ops_fragment() };
    let finance = StubAgent { fragment: finance_fragment() };
    let intel = StubAgent { fragment: intel_fragment() };
    let strategist = StubStrategist;
    let auditor = StubAuditor { outcome_completed: true };
    let discovery = NoDiscovery;

    let pipeline = Pipeline::new(ctx, &registry)
        .with_ops_agent(&ops)
        .with_finance_agent(&finance)
        .with_intel_agent(&intel)
        .with_strategist(&strategist)
        .with_auditor(&auditor)
        .with_discovery(&discovery);

    let dossier = pipeline.run("Grupo Horizonte", "").unwrap();

    // Facts merged from all fragments.
    assert_eq!(dossier.facts.group_name, "Grupo Horizonte Agro");
    assert_eq!(dossier.facts.hectares, 12_000);
    assert_eq!(dossier.facts.estimated_capital, 60_000_000.0);
    assert!(dossier.facts.corporate_governance);

    // Worked-example pillar values.
    assert_eq!(dossier.score.breakdown.muscle, 280);
    assert_eq!(dossier.score.breakdown.complexity, 135);
    assert!(dossier.score.inferred); // employees imputed

    // Narrative split into the four titled sections.
    assert_eq!(dossier.sections.len(), 4);
    assert_eq!(dossier.sections[0].title, "Profile and Market");

    // Quality gate attached, audit recommendation appended.
    let quality = dossier.quality.as_ref().unwrap();
    assert!(quality.score_pct > 0.0);
    assert!(quality
        .recommendations
        .iter()
        .any(|r| r.contains("CRA issuance")));

    // Pipeline log covers every phase.
    let log = dossier.pipeline_log.join("\n");
    for phase in ["Phase 1", "Phase 2", "Phase 3", "Phase 4", "Phase 5", "Phase 6"] {
        assert!(log.contains(phase), "missing {phase} in log");
    }
    assert!(dossier.elapsed_seconds >= 0.0);
    assert!(!dossier.generated_at.is_empty());
}

#[test]
fn degraded_collaborators_never_abort_the_pipeline() {
    let cache = TieredCache::in_memory(Duration::from_secs(60));
    let gate = CallGate::new(600);
    let llm = test_llm();
    let registry = unreachable_registry();
    let ctx = AgentContext {
        cache: &cache,
        gate: &gate,
        llm: &llm,
        call_timeout: Duration::from_secs(1),
    };

    // Junk fragments, unreachable registry, degraded auditor.
    let junk = StubAgent { fragment: json!("not even an object") };
    let junk2 = StubAgent { fragment: json!({"hectares": "plenty"}) };
    let junk3 = StubAgent { fragment: json!(null) };
    let strategist = StubStrategist;
    let auditor = StubAuditor { outcome_completed: false };
    let discovery = NoDiscovery;

    let pipeline = Pipeline::new(ctx, &registry)
        .with_ops_agent(&junk)
        .with_finance_agent(&junk2)
        .with_intel_agent(&junk3)
        .with_strategist(&strategist)
        .with_auditor(&auditor)
        .with_discovery(&discovery);

    // Valid CNPJ forces the registry phase to try (and fail over) both
    // unreachable providers.
    let dossier = pipeline.run("Grupo Fantasma", "12.345.678/0001-00").unwrap();

    // Everything defaulted, nothing aborted.
    assert!(dossier.registry.is_none());
    assert_eq!(dossier.facts.hectares, 0);
    assert_eq!(dossier.facts.group_name, "Grupo Fantasma");
    // Heuristics had no area to work from; scoring still total.
    assert!(!dossier.score.inferred);
    assert_eq!(dossier.score.tier, Tier::Bronze);
    // Degraded audit leaves the deterministic recommendations untouched.
    let quality = dossier.quality.as_ref().unwrap();
    assert_eq!(quality.level, QualityLevel::Insufficient);
    assert!(dossier
        .pipeline_log
        .iter()
        .any(|l| l.contains("AI audit skipped")));
}

#[test]
fn blank_target_is_the_only_fatal_input() {
    let cache = TieredCache::in_memory(Duration::from_secs(60));
    let gate = CallGate::new(600);
    let llm = test_llm();
    let registry = unreachable_registry();
    let ctx = AgentContext {
        cache: &cache,
        gate: &gate,
        llm: &llm,
        call_timeout: Duration::from_secs(1),
    };

    let pipeline = Pipeline::new(ctx, &registry).with_discovery(&NoDiscovery);
    assert!(pipeline.run("   ", "").is_err());
}

#[test]
fn discovery_runs_only_when_no_valid_cnpj_is_given() {
    let cache = TieredCache::in_memory(Duration::from_secs(60));
    let gate = CallGate::new(600);
    let llm = test_llm();
    let registry = unreachable_registry();
    let ctx = AgentContext {
        cache: &cache,
        gate: &gate,
        llm: &llm,
        call_timeout: Duration::from_secs(1),
    };

    let ops = StubAgent { fragment: ops_fragment() };
    let finance = StubAgent { fragment: finance_fragment() };
    let intel = StubAgent { fragment: intel_fragment() };
    let strategist = StubStrategist;
    let auditor = StubAuditor { outcome_completed: false };
    let discovery = RecordingDiscovery { asked: Mutex::new(Vec::new()) };

    let pipeline = Pipeline::new(ctx, &registry)
        .with_ops_agent(&ops)
        .with_finance_agent(&finance)
        .with_intel_agent(&intel)
        .with_strategist(&strategist)
        .with_auditor(&auditor)
        .with_discovery(&discovery);

    // With a valid CNPJ, discovery must not be consulted.
    pipeline.run("Grupo A", "12.345.678/0001-00").unwrap();
    assert!(discovery.asked.lock().unwrap().is_empty());

    // Without one, it must be.
    pipeline.run("Grupo B", "").unwrap();
    assert_eq!(discovery.asked.lock().unwrap().as_slice(), ["Grupo B"]);
}
