//! Dossier generation pipeline
//!
//! Drives the fixed phase sequence: registry lookup, operational recon,
//! financial deep-dive, market intel, score, narrative, quality gate.
//! Phases run sequentially on the calling thread; every external call goes
//! through the rate-governed gate. A phase that yields nothing degrades the
//! dossier instead of aborting; the only fatal condition is a blank target.

use crate::agents::{
    split_sections, AgentContext, AuditAgent, AuditOutcome, CnpjDiscovery, CollectionAgent,
    DiscoveryAgent, FinanceAgent, MarketIntelAgent, NarrativeAgent, OperationsAgent,
    QualityAuditor, StrategistAgent, TargetQuery,
};
use crate::context::prompt_context;
use crate::llm::ModelTier;
use crate::models::{
    Dossier, FinanceFragment, Headline, IntelFragment, OperationsFragment, VerticalIntegration,
};
use crate::quality::run_quality_gate;
use crate::registry::{is_valid_cnpj, strip_cnpj, RegistryClient, RegistryError};
use crate::scoring;
use anyhow::{bail, Result};
use serde_json::Value;
use std::time::Instant;
use tracing::{info, warn};

static DEFAULT_OPS: OperationsAgent = OperationsAgent;
static DEFAULT_FINANCE: FinanceAgent = FinanceAgent;
static DEFAULT_INTEL: MarketIntelAgent = MarketIntelAgent;
static DEFAULT_STRATEGIST: StrategistAgent = StrategistAgent;
static DEFAULT_AUDITOR: QualityAuditor = QualityAuditor;
static DEFAULT_DISCOVERY: CnpjDiscovery = CnpjDiscovery;

type ProgressFn<'a> = dyn Fn(f32, &str) + 'a;

/// Full dossier pipeline with injected collaborators.
pub struct Pipeline<'a> {
    ctx: AgentContext<'a>,
    registry: &'a RegistryClient,
    ops: &'a dyn CollectionAgent,
    finance: &'a dyn CollectionAgent,
    intel: &'a dyn CollectionAgent,
    strategist: &'a dyn NarrativeAgent,
    auditor: &'a dyn AuditAgent,
    discovery: &'a dyn DiscoveryAgent,
    progress: Option<Box<ProgressFn<'a>>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(ctx: AgentContext<'a>, registry: &'a RegistryClient) -> Self {
        Self {
            ctx,
            registry,
            ops: &DEFAULT_OPS,
            finance: &DEFAULT_FINANCE,
            intel: &DEFAULT_INTEL,
            strategist: &DEFAULT_STRATEGIST,
            auditor: &DEFAULT_AUDITOR,
            discovery: &DEFAULT_DISCOVERY,
            progress: None,
        }
    }

    pub fn with_ops_agent(mut self, agent: &'a dyn CollectionAgent) -> Self {
        self.ops = agent;
        self
    }

    pub fn with_finance_agent(mut self, agent: &'a dyn CollectionAgent) -> Self {
        self.finance = agent;
        self
    }

    pub fn with_intel_agent(mut self, agent: &'a dyn CollectionAgent) -> Self {
        self.intel = agent;
        self
    }

    pub fn with_strategist(mut self, agent: &'a dyn NarrativeAgent) -> Self {
        self.strategist = agent;
        self
    }

    pub fn with_auditor(mut self, agent: &'a dyn AuditAgent) -> Self {
        self.auditor = agent;
        self
    }

    pub fn with_discovery(mut self, agent: &'a dyn DiscoveryAgent) -> Self {
        self.discovery = agent;
        self
    }

    pub fn with_progress(mut self, f: impl Fn(f32, &str) + 'a) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    fn report(&self, fraction: f32, message: &str) {
        if let Some(progress) = &self.progress {
            progress(fraction, message);
        }
    }

    /// Generate a complete dossier for `target`. `cnpj` may be empty; a
    /// discovery call will then try to find one.
    pub fn run(&self, target: &str, cnpj: &str) -> Result<Dossier> {
        let target = target.trim();
        if target.is_empty() {
            bail!("target company name must not be blank");
        }

        let start = Instant::now();
        let mut dossier = Dossier::new(target, strip_cnpj(cnpj));
        let log = |dossier: &mut Dossier, line: String| {
            info!("{line}");
            dossier.pipeline_log.push(line);
        };

        // ---- Phase 1: registry lookup -------------------------------------
        self.report(0.05, "Phase 1/6: registry lookup");
        log(&mut dossier, "Phase 1: registry lookup".to_string());

        let mut cnpj_digits = strip_cnpj(cnpj);
        if !is_valid_cnpj(&cnpj_digits) {
            log(&mut dossier, "  no valid CNPJ given; trying discovery".to_string());
            cnpj_digits = self
                .discovery
                .discover(&self.ctx, target)
                .unwrap_or_default();
            if !cnpj_digits.is_empty() {
                log(&mut dossier, format!("  CNPJ discovered: {cnpj_digits}"));
            }
        }

        if is_valid_cnpj(&cnpj_digits) {
            match self.registry.lookup_cached(
                self.ctx.cache,
                self.ctx.gate,
                self.ctx.call_timeout,
                &cnpj_digits,
            ) {
                Ok(record) => {
                    log(
                        &mut dossier,
                        format!("  registry record found: {}", record.legal_name),
                    );
                    dossier.cnpj = cnpj_digits;
                    dossier.registry = Some(record);
                }
                Err(RegistryError::NotFound(c)) => {
                    log(&mut dossier, format!("  CNPJ {c} not found in registry"));
                }
                Err(e) => {
                    warn!("registry lookup failed: {e}");
                    log(&mut dossier, format!("  registry unavailable: {e}"));
                }
            }
        } else {
            log(
                &mut dossier,
                "  continuing without cadastral data".to_string(),
            );
        }

        // ---- Phase 2: operational recon -----------------------------------
        self.report(0.20, "Phase 2/6: operational recon");
        log(&mut dossier, "Phase 2: operational recon".to_string());

        let mut query = TargetQuery::new(target);
        let raw_ops = self.ops.collect(&self.ctx, &query);
        dossier.operations = parse_operations(&raw_ops);
        query.group_name = dossier.operations.group_name.clone();
        let line = format!(
            "  group: {} | {} ha | crops: {} | confidence: {:.0}%",
            query.effective_name(),
            dossier.operations.hectares,
            dossier.operations.crops.join(", "),
            dossier.operations.confidence * 100.0
        );
        log(&mut dossier, line);

        // ---- Phase 3: financial deep-dive ---------------------------------
        self.report(0.40, "Phase 3/6: financial deep-dive");
        log(&mut dossier, "Phase 3: financial deep-dive".to_string());

        let raw_fin = self.finance.collect(&self.ctx, &query);
        dossier.finance = parse_finance(&raw_fin);
        let line = format!(
            "  {} movements | {} Fiagro funds | capital: R${:.1}M | confidence: {:.0}%",
            dossier.finance.movements.len(),
            dossier.finance.fiagro_funds.len(),
            dossier.finance.estimated_capital / 1e6,
            dossier.finance.confidence * 100.0
        );
        log(&mut dossier, line);

        // ---- Phase 4: market intel ----------------------------------------
        self.report(0.55, "Phase 4/6: market intelligence");
        log(&mut dossier, "Phase 4: market intelligence".to_string());

        let (cnae, uf) = match &dossier.registry {
            Some(reg) => (reg.main_cnae.clone(), reg.state.clone()),
            None => (
                String::new(),
                dossier.operations.regions.first().cloned().unwrap_or_default(),
            ),
        };
        query.sector_context = prompt_context(&cnae, &uf);

        let raw_intel = self.intel.collect(&self.ctx, &query);
        dossier.intel = parse_intel(&raw_intel);
        let line = format!(
            "  {} headlines | {} buy signals | confidence: {:.0}%",
            dossier.intel.headlines.len(),
            dossier.intel.buy_signals.len(),
            dossier.intel.confidence * 100.0
        );
        log(&mut dossier, line);

        // ---- Phase 4.5: merge + score -------------------------------------
        self.report(0.65, "Computing account score");
        log(&mut dossier, "Phase 4.5: account score".to_string());

        dossier.facts = dossier.merge_facts();
        dossier.score = scoring::score(&dossier.facts);
        let line = format!("  score: {}/1000 - {}", dossier.score.score, dossier.score.tier);
        log(&mut dossier, line);
        let justifications = dossier.score.justifications.clone();
        for j in &justifications {
            log(&mut dossier, format!("    -> {j}"));
        }

        // ---- Phase 5: strategic narrative ---------------------------------
        self.report(0.75, "Phase 5/6: strategic analysis");
        log(&mut dossier, "Phase 5: strategic analysis".to_string());

        let facts_json = build_analysis_payload(&dossier);
        let analysis =
            self.strategist
                .compose(&self.ctx, &facts_json, &dossier.score, &query.sector_context);
        dossier.raw_analysis = analysis.clone();
        dossier.sections = split_sections(&analysis);
        dossier.model_used = format!(
            "{} (analysis) + {} (recon/search)",
            self.ctx.llm.model_for(ModelTier::Deep),
            self.ctx.llm.model_for(ModelTier::Fast)
        );

        let words: usize = dossier
            .sections
            .iter()
            .map(|s| s.body.split_whitespace().count())
            .sum();
        let line = format!("  {} sections | {} words", dossier.sections.len(), words);
        log(&mut dossier, line);

        // ---- Phase 6: quality gate ----------------------------------------
        self.report(0.90, "Phase 6/6: quality gate");
        log(&mut dossier, "Phase 6: quality gate".to_string());

        let mut report = run_quality_gate(&dossier);
        log(
            &mut dossier,
            format!("  level: {} ({:.0}%)", report.level, report.score_pct),
        );

        // Best-effort AI audit: appended on success, logged when degraded.
        match self.auditor.audit(&self.ctx, &analysis, &facts_json) {
            AuditOutcome::Completed {
                final_note,
                recommendations,
                ..
            } => {
                report.recommendations.extend(recommendations);
                log(&mut dossier, format!("  AI audit: grade {final_note:.1}/10"));
            }
            AuditOutcome::Degraded { reason } => {
                log(&mut dossier, format!("  AI audit skipped: {reason}"));
            }
        }
        dossier.quality = Some(report);

        dossier.elapsed_seconds = start.elapsed().as_secs_f64();
        dossier.generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        self.report(1.0, "Dossier complete");
        let line = format!("pipeline complete in {:.1}s", dossier.elapsed_seconds);
        log(&mut dossier, line);

        Ok(dossier)
    }
}

// ==================== lenient fragment parsing ====================
//
// Collection fragments are loosely-typed mappings; every field is read
// individually with a default so one malformed value never discards the
// rest of the fragment.

fn num_u64(v: &Value) -> u64 {
    v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)).unwrap_or(0)
}

fn num_u32(v: &Value) -> u32 {
    num_u64(v).min(u32::MAX as u64) as u32
}

fn num_f64(v: &Value) -> f64 {
    v.as_f64().unwrap_or(0.0).max(0.0)
}

fn num_f32(v: &Value) -> f32 {
    num_f64(v) as f32
}

fn text(v: &Value) -> String {
    v.as_str().unwrap_or_default().to_string()
}

fn str_vec(v: &Value) -> Vec<String> {
    v.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn parse_operations(raw: &Value) -> OperationsFragment {
    let vert = &raw["vertical"];
    OperationsFragment {
        group_name: text(&raw["group_name"]),
        hectares: num_u64(&raw["hectares"]),
        crops: str_vec(&raw["crops"]),
        vertical: VerticalIntegration {
            agro_industry: vert["agro_industry"].as_bool().unwrap_or(false),
            seed_plant: vert["seed_plant"].as_bool().unwrap_or(false),
            silos: vert["silos"].as_bool().unwrap_or(false),
            cotton_gin: vert["cotton_gin"].as_bool().unwrap_or(false),
            mill: vert["mill"].as_bool().unwrap_or(false),
            slaughterhouse: vert["slaughterhouse"].as_bool().unwrap_or(false),
            feed_factory: vert["feed_factory"].as_bool().unwrap_or(false),
        },
        regions: str_vec(&raw["regions"]),
        farm_count: num_u32(&raw["farm_count"]),
        technologies: str_vec(&raw["technologies"]),
        confidence: num_f32(&raw["confidence"]),
    }
}

pub(crate) fn parse_finance(raw: &Value) -> FinanceFragment {
    FinanceFragment {
        estimated_capital: num_f64(&raw["estimated_capital"]),
        estimated_employees: num_u32(&raw["estimated_employees"]),
        estimated_revenue: num_f64(&raw["estimated_revenue"]),
        movements: str_vec(&raw["movements"]),
        fiagro_funds: str_vec(&raw["fiagro_funds"]),
        cra_issues: str_vec(&raw["cra_issues"]),
        partners: str_vec(&raw["partners"]),
        audits: str_vec(&raw["audits"]),
        corporate_governance: raw["corporate_governance"].as_bool().unwrap_or(false),
        summary: text(&raw["summary"]),
        confidence: num_f32(&raw["confidence"]),
    }
}

pub(crate) fn parse_intel(raw: &Value) -> IntelFragment {
    let headlines = raw["headlines"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|h| Headline {
                    title: text(&h["title"]),
                    summary: text(&h["summary"]),
                    approx_date: text(&h["approx_date"]),
                    relevance: text(&h["relevance"]),
                })
                .collect()
        })
        .unwrap_or_default();

    IntelFragment {
        headlines,
        competitors: str_vec(&raw["competitors"]),
        sector_trends: str_vec(&raw["sector_trends"]),
        pains: str_vec(&raw["pains"]),
        opportunities: str_vec(&raw["opportunities"]),
        buy_signals: str_vec(&raw["buy_signals"]),
        risks: str_vec(&raw["risks"]),
        confidence: num_f32(&raw["confidence"]),
    }
}

/// Full JSON payload handed to the strategist and the auditor: the merged
/// facts plus the intel block.
fn build_analysis_payload(dossier: &Dossier) -> Value {
    let mut payload = serde_json::to_value(&dossier.facts).unwrap_or_default();
    if let Some(obj) = payload.as_object_mut() {
        obj.insert(
            "market_intel".to_string(),
            serde_json::to_value(&dossier.intel).unwrap_or_default(),
        );
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_operations_tolerates_junk() {
        let raw = json!({
            "group_name": "Grupo X",
            "hectares": "twelve thousand",   // wrong type
            "crops": ["soja", 42, "milho"],  // mixed types
            "vertical": {"agro_industry": true},
            "confidence": 0.9,
        });
        let ops = parse_operations(&raw);
        assert_eq!(ops.group_name, "Grupo X");
        assert_eq!(ops.hectares, 0);
        assert_eq!(ops.crops, vec!["soja".to_string(), "milho".to_string()]);
        assert!(ops.vertical.agro_industry);
        assert!(!ops.vertical.silos);
    }

    #[test]
    fn test_parse_operations_accepts_float_hectares() {
        let ops = parse_operations(&json!({"hectares": 12000.7}));
        assert_eq!(ops.hectares, 12000);
    }

    #[test]
    fn test_parse_finance_defaults() {
        let fin = parse_finance(&json!({}));
        assert_eq!(fin.estimated_capital, 0.0);
        assert!(fin.movements.is_empty());
        assert!(!fin.corporate_governance);
    }

    #[test]
    fn test_parse_intel_headlines() {
        let intel = parse_intel(&json!({
            "headlines": [
                {"title": "Expansion", "summary": "s", "approx_date": "2025-03", "relevance": "alta"},
                {"title": "CRA issued"},
            ],
            "buy_signals": ["hired a CFO"],
        }));
        assert_eq!(intel.headlines.len(), 2);
        assert_eq!(intel.headlines[1].title, "CRA issued");
        assert_eq!(intel.buy_signals.len(), 1);
    }

    #[test]
    fn test_negative_numbers_clamp_to_zero() {
        let fin = parse_finance(&json!({"estimated_capital": -5.0, "estimated_employees": -3}));
        assert_eq!(fin.estimated_capital, 0.0);
        assert_eq!(fin.estimated_employees, 0);
    }
}
