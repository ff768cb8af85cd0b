//! LLM-assisted CNPJ discovery
//!
//! When the user supplies only a name, a quick search-grounded call tries
//! to find the group's main registry id before the cadastral phase runs.

use super::{gated_generate, AgentContext};
use crate::limiter::Priority;
use crate::llm::GenerateOptions;
use crate::registry::find_cnpj_in_text;
use serde_json::json;
use std::time::Duration;

const CACHE_NS: &str = "cnpj_discovery";
const CACHE_TTL: Duration = Duration::from_secs(86_400);

/// Find the main CNPJ for a company name. Returns the bare digits, or None
/// when nothing CNPJ-shaped comes back.
pub fn discover_cnpj(ctx: &AgentContext<'_>, company_name: &str) -> Option<String> {
    let params = json!({ "company": company_name });
    if let Some(cached) = ctx.cache.get(CACHE_NS, &params) {
        return cached.as_str().map(String::from);
    }

    let prompt = format!(
        r#"Encontre o CNPJ principal da empresa/grupo "{company_name}" do
agronegócio brasileiro. Busque em sites como Econodata, Casa dos Dados,
ou o site oficial da empresa.
Retorne APENAS o CNPJ no formato XX.XXX.XXX/XXXX-XX ou "NAO_ENCONTRADO"."#
    );

    let opts = GenerateOptions {
        temperature: Some(0.0),
        ..GenerateOptions::fast_search()
    };
    let text = gated_generate(ctx, "cnpj-discovery", Priority::High, &prompt, &opts)?;

    if text.contains("NAO_ENCONTRADO") {
        return None;
    }

    let cnpj = find_cnpj_in_text(&text)?;
    ctx.cache
        .set(CACHE_NS, &params, json!(cnpj), Some(CACHE_TTL));
    Some(cnpj)
}
