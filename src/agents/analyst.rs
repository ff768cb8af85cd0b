//! Strategic analyst
//!
//! Writes the narrative briefing from the merged facts and the computed
//! score, using the deep-reasoning model. The reply carries four sections
//! separated by '|||'; the orchestrator splits them.

use super::{gated_generate, AgentContext};
use crate::limiter::Priority;
use crate::llm::{GenerateOptions, ModelTier};
use crate::models::ScoreResult;

/// Section titles in briefing order.
pub const SECTION_TITLES: [&str; 4] = [
    "Profile and Market",
    "Operational Complexity and Pains",
    "Product Fit",
    "Engagement Plan",
];

pub struct StrategistAgent;

fn build_prompt(facts_json: &serde_json::Value, score: &ScoreResult, sector_context: &str) -> String {
    let breakdown = serde_json::json!({
        "muscle": score.breakdown.muscle,
        "complexity": score.breakdown.complexity,
        "people": score.breakdown.people,
        "momentum": score.breakdown.momentum,
    });

    format!(
        r#"VOCÊ É: Analista Sênior de Inteligência de Vendas para o Agronegócio.
Você prepara briefings estratégicos ("off-the-record") para Executivos de
Contas que vão prospectar grandes operações agrícolas.

DADOS COLETADOS SOBRE O ALVO:
{facts}

SCORE: {score}/1000 — Classificação: {tier}
BREAKDOWN: {breakdown}

{sector_context}

=== ESTRUTURA OBRIGATÓRIA DO BRIEFING ===

Escreva 4 seções, separadas EXATAMENTE por '|||':

SEÇÃO 1 — PERFIL E MERCADO: quem é o grupo, tamanho REAL da operação,
contexto regional. Se emitiu CRA ou tem Fiagro, trate como CORPORAÇÃO.

SEÇÃO 2 — COMPLEXIDADE OPERACIONAL E DORES: múltiplas culturas?
Verticalização? Multisite? Dores ESPECÍFICAS desta operação, nunca genéricas.

SEÇÃO 3 — FIT DE PRODUTO (O PITCH): quais módulos resolvem as dores, o
argumento matador para esta conta, argumento de troca se usa concorrente.

SEÇÃO 4 — PLANO DE ATAQUE: decisor provável, timing ideal (safra?
entressafra? pós-CRA?), gatilho de entrada, red flags.

=== REGRAS ===
1. Seja DIRETO e PRÁTICO. O executivo lê isto antes de uma reunião.
2. USE OS DADOS FINANCEIROS: CRA, Fiagro, auditoria — mencione se existirem.
3. REALPOLITIK: 35k hectares + auditoria = corporação. Trate assim.
4. Separe as 4 seções com ||| (três pipes).
5. Mínimo 300 palavras por seção. Máximo 600.
"#,
        facts = serde_json::to_string_pretty(facts_json).unwrap_or_default(),
        score = score.score,
        tier = score.tier,
        breakdown = breakdown,
        sector_context = sector_context,
    )
}

impl super::NarrativeAgent for StrategistAgent {
    /// Compose the briefing text. Returns an explanatory placeholder when
    /// the call fails; the pipeline continues degraded.
    fn compose(
        &self,
        ctx: &AgentContext<'_>,
        facts_json: &serde_json::Value,
        score: &ScoreResult,
        sector_context: &str,
    ) -> String {
        let prompt = build_prompt(facts_json, score, sector_context);
        let opts = GenerateOptions {
            tier: ModelTier::Deep,
            temperature: Some(0.4),
            max_tokens: Some(16_000),
            ..Default::default()
        };

        gated_generate(ctx, "strategist", Priority::Critical, &prompt, &opts)
            .unwrap_or_else(|| "Strategic analysis unavailable.".to_string())
    }
}

/// Split the raw briefing into titled sections on '|||'. A reply that
/// cannot be split falls back to a single "Full Analysis" section.
pub fn split_sections(text: &str) -> Vec<crate::models::AnalysisSection> {
    let mut sections: Vec<crate::models::AnalysisSection> = text
        .split("|||")
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .enumerate()
        .map(|(i, part)| crate::models::AnalysisSection {
            title: SECTION_TITLES
                .get(i)
                .map(|t| t.to_string())
                .unwrap_or_else(|| format!("Section {}", i + 1)),
            body: part.to_string(),
        })
        .collect();

    if sections.len() < 2 {
        sections = vec![crate::models::AnalysisSection {
            title: "Full Analysis".to_string(),
            body: text.trim().to_string(),
        }];
    }

    sections
}
