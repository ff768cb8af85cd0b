//! Operational recon agent
//!
//! Maps the physical structure of the target group: land area, crops,
//! vertical infrastructure, regions, technologies.

use super::{gated_generate, AgentContext, CollectionAgent, TargetQuery};
use crate::limiter::Priority;
use crate::llm::{extract_json_object, GenerateOptions};
use serde_json::json;
use std::time::Duration;

const CACHE_NS: &str = "agent_recon";
const CACHE_TTL: Duration = Duration::from_secs(7_200);

pub struct OperationsAgent;

fn build_prompt(target: &str) -> String {
    format!(
        r#"ATUE COMO: Investigador Agrícola Sênior com 20 anos de experiência.
ALVO: "{target}"

Você deve descobrir a ESTRUTURA FÍSICA E OPERACIONAL do grupo econômico.
Busque em múltiplas fontes (site oficial, LinkedIn, notícias, Econodata).

INVESTIGUE:
1. Nome oficial do grupo econômico (pode ser diferente do nome fantasia)
2. Área TOTAL em hectares — se encontrar números diferentes, pegue o MAIS RECENTE
3. TODAS as culturas cultivadas (soja, milho, algodão, cana, café, HF, pecuária)
4. Infraestrutura vertical: agroindústria? Silos? Sementeira? Algodoeira? Usina? Frigorífico?
5. Regiões onde opera (estados, municípios)
6. Número aproximado de fazendas/unidades
7. Tecnologias que usa (agricultura de precisão, drones, ERP)

REGRAS:
- Seja FACTUAL. Não invente dados. Se não encontrar, diga 0.
- Se encontrar faixa (ex: "20 a 30 mil hectares"), use o valor MÉDIO.
- Atribua confiança de 0.0 a 1.0 aos dados encontrados.

Retorne APENAS JSON válido:
{{
    "group_name": "Nome Real do Grupo",
    "hectares": numero,
    "crops": ["lista", "de", "culturas"],
    "vertical": {{
        "agro_industry": bool,
        "seed_plant": bool,
        "silos": bool,
        "cotton_gin": bool,
        "mill": bool,
        "slaughterhouse": bool,
        "feed_factory": bool
    }},
    "regions": ["MT", "GO"],
    "farm_count": numero,
    "technologies": ["lista"],
    "confidence": 0.8
}}"#
    )
}

impl CollectionAgent for OperationsAgent {
    fn name(&self) -> &'static str {
        "operations-recon"
    }

    fn collect(&self, ctx: &AgentContext<'_>, query: &TargetQuery) -> serde_json::Value {
        let params = json!({ "agent": "recon", "company": query.target });
        if let Some(cached) = ctx.cache.get(CACHE_NS, &params) {
            return cached;
        }

        let fallback = json!({
            "group_name": query.target,
            "hectares": 0,
            "confidence": 0.0,
        });

        let prompt = build_prompt(&query.target);
        let opts = GenerateOptions::fast_search();
        let fragment = gated_generate(ctx, self.name(), Priority::High, &prompt, &opts)
            .and_then(|text| extract_json_object(&text))
            .unwrap_or(fallback);

        ctx.cache
            .set(CACHE_NS, &params, fragment.clone(), Some(CACHE_TTL));
        fragment
    }
}
