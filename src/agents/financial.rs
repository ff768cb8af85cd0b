//! Financial deep-dive agent
//!
//! Hunts capital-markets footprints: CRA issuances, Fiagro funds,
//! governance, M&A, declared capital and workforce.

use super::{gated_generate, AgentContext, CollectionAgent, TargetQuery};
use crate::limiter::Priority;
use crate::llm::{extract_json_object, GenerateOptions};
use serde_json::json;
use std::time::Duration;

const CACHE_NS: &str = "agent_finance";
const CACHE_TTL: Duration = Duration::from_secs(7_200);

pub struct FinanceAgent;

fn build_prompt(name: &str, also_known_as: &str) -> String {
    format!(
        r#"ATUE COMO: Analista Sênior de Mercado de Capitais especializado em Agro.
ALVO: "{name}" (também pesquise como "{also_known_as}" se for diferente)

Você é um detetive financeiro. Vasculhe a web procurando ESPECIFICAMENTE:

1. EMISSÕES DE CRA (Certificados de Recebíveis do Agronegócio):
   valor, data, estruturador, séries, ratings
2. FIAGRO: fundos que investiram neles ou que eles criaram; gestoras; ticker
3. GOVERNANÇA CORPORATIVA: auditoria externa (Big 4), conselho, natureza
   jurídica (S.A. vs Ltda)
4. M&A: compraram ou foram comprados? Parcerias estratégicas
5. DADOS FINANCEIROS: capital social, faturamento estimado, número de
   funcionários
6. PARCEIROS FINANCEIROS: bancos, gestoras, seguradoras

Retorne APENAS JSON válido:
{{
    "estimated_capital": numero,
    "estimated_employees": numero,
    "estimated_revenue": numero,
    "movements": ["Fato 1: Emissão de CRA de R$50M via Itaú BBA em 2023"],
    "fiagro_funds": ["SNFZ11 (Suno)"],
    "cra_issues": ["CRA Série X - R$YM - Estruturador Z"],
    "partners": ["Itaú BBA", "XP"],
    "audits": ["Deloitte"],
    "corporate_governance": bool,
    "summary": "Texto curto sobre a robustez financeira.",
    "confidence": 0.7
}}"#
    )
}

impl CollectionAgent for FinanceAgent {
    fn name(&self) -> &'static str {
        "finance-deep-dive"
    }

    fn collect(&self, ctx: &AgentContext<'_>, query: &TargetQuery) -> serde_json::Value {
        let name = query.effective_name();
        let params = json!({ "agent": "finance", "company": name });
        if let Some(cached) = ctx.cache.get(CACHE_NS, &params) {
            return cached;
        }

        let prompt = build_prompt(name, &query.target);
        let opts = GenerateOptions::fast_search();
        let fragment = gated_generate(ctx, self.name(), Priority::High, &prompt, &opts)
            .and_then(|text| extract_json_object(&text))
            .unwrap_or_else(|| json!({ "confidence": 0.0 }));

        ctx.cache
            .set(CACHE_NS, &params, fragment.clone(), Some(CACHE_TTL));
        fragment
    }
}
