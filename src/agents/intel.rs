//! Market-intelligence agent
//!
//! Recent news, buying signals, risks, competitors and explicit pains over
//! the last 12 months. The prompt is enriched with the static sector and
//! regional context so the model starts from domain knowledge.

use super::{gated_generate, AgentContext, CollectionAgent, TargetQuery};
use crate::limiter::Priority;
use crate::llm::{extract_json_object, GenerateOptions};
use serde_json::json;
use std::time::Duration;

const CACHE_NS: &str = "agent_intel";
const CACHE_TTL: Duration = Duration::from_secs(3_600);

pub struct MarketIntelAgent;

fn build_prompt(target: &str, sector_context: &str) -> String {
    let context_block = if sector_context.is_empty() {
        String::new()
    } else {
        format!("CONTEXTO DO SETOR:\n{sector_context}\n")
    };

    format!(
        r#"ATUE COMO: Analista de Inteligência Competitiva focado em Agronegócio.
ALVO: "{target}"
{context_block}
Busque as NOTÍCIAS E SINAIS mais recentes (últimos 12 meses) sobre esta empresa.

INVESTIGUE:
1. NOTÍCIAS RECENTES: expansão? Crise? Investimento? Novo projeto?
2. SINAIS DE COMPRA para ERP/tecnologia: expansão de área, contratação de
   C-level, problemas operacionais, auditoria ou IPO
3. RISCOS: processos judiciais, problemas ambientais, inadimplência
4. CONCORRENTES: quem mais atua no mesmo segmento/região?
5. OPORTUNIDADES: janelas de venda, dores explícitas

Retorne APENAS JSON válido:
{{
    "headlines": [
        {{"title": "...", "summary": "...", "approx_date": "2024-XX", "relevance": "alta/media/baixa"}}
    ],
    "buy_signals": ["Sinal 1: ..."],
    "risks": ["Risco 1: ..."],
    "opportunities": ["Oportunidade 1: ..."],
    "competitors": ["Empresa X"],
    "pains": ["Dor 1: ..."],
    "confidence": 0.7
}}"#
    )
}

impl CollectionAgent for MarketIntelAgent {
    fn name(&self) -> &'static str {
        "market-intel"
    }

    fn collect(&self, ctx: &AgentContext<'_>, query: &TargetQuery) -> serde_json::Value {
        let params = json!({ "agent": "intel", "company": query.target });
        if let Some(cached) = ctx.cache.get(CACHE_NS, &params) {
            return cached;
        }

        let prompt = build_prompt(&query.target, &query.sector_context);
        let opts = GenerateOptions {
            temperature: Some(0.2),
            ..GenerateOptions::fast_search()
        };
        let fragment = gated_generate(ctx, self.name(), Priority::Normal, &prompt, &opts)
            .and_then(|text| extract_json_object(&text))
            .unwrap_or_else(|| json!({ "confidence": 0.0 }));

        ctx.cache
            .set(CACHE_NS, &params, fragment.clone(), Some(CACHE_TTL));
        fragment
    }
}
