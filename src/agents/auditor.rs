//! AI quality auditor
//!
//! Best-effort second opinion over the finished briefing. The outcome is an
//! explicit ok/degraded variant so callers (and tests) can tell a skipped
//! audit from a clean one; a degraded audit never fails the pipeline.

use super::{gated_generate, AgentContext};
use crate::limiter::Priority;
use crate::llm::{extract_json_object, GenerateOptions, ModelTier};

/// Result of the AI audit phase.
#[derive(Debug, Clone)]
pub enum AuditOutcome {
    Completed {
        /// Overall grade 0..=10 assigned by the auditor.
        final_note: f64,
        level: String,
        recommendations: Vec<String>,
    },
    /// The audit could not run or returned nothing usable.
    Degraded { reason: String },
}

impl AuditOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, AuditOutcome::Completed { .. })
    }
}

pub struct QualityAuditor;

fn build_prompt(analysis: &str, facts_json: &serde_json::Value) -> String {
    let facts = serde_json::to_string_pretty(facts_json).unwrap_or_default();
    let analysis_excerpt: String = analysis.chars().take(8_000).collect();
    let facts_excerpt: String = facts.chars().take(4_000).collect();

    format!(
        r#"ATUE COMO: Editor-Chefe de um relatório de inteligência de vendas.
Você está revisando o dossiê abaixo antes da entrega ao Executivo de Contas.

=== DOSSIÊ A SER AUDITADO ===
{analysis_excerpt}

=== DADOS BASE ===
{facts_excerpt}

=== AUDITORIA ===
Avalie o dossiê em cada critério (0 a 10) e justifique brevemente:
1. PRECISÃO: os dados no texto correspondem ao JSON base?
2. PROFUNDIDADE: a análise vai além do óbvio? Cita dados financeiros?
3. ACIONABILIDADE: o executivo sabe exatamente o que fazer?
4. PERSONALIZAÇÃO: o texto é específico para ESTA empresa?
5. COMPLETUDE: as 4 seções estão presentes e completas?

Retorne APENAS JSON:
{{
    "final_note": 8.0,
    "level": "EXCELENTE|BOM|ACEITAVEL|INSUFICIENTE",
    "recommendations": ["Recomendação 1", "Recomendação 2"]
}}"#
    )
}

impl super::AuditAgent for QualityAuditor {
    fn audit(
        &self,
        ctx: &AgentContext<'_>,
        analysis: &str,
        facts_json: &serde_json::Value,
    ) -> AuditOutcome {
        let prompt = build_prompt(analysis, facts_json);
        let opts = GenerateOptions {
            tier: ModelTier::Deep,
            temperature: Some(0.2),
            ..Default::default()
        };

        let Some(text) = gated_generate(ctx, "quality-auditor", Priority::Normal, &prompt, &opts)
        else {
            return AuditOutcome::Degraded {
                reason: "audit call failed".to_string(),
            };
        };

        let Some(parsed) = extract_json_object(&text) else {
            return AuditOutcome::Degraded {
                reason: "audit reply was not parseable JSON".to_string(),
            };
        };

        let recommendations = parsed["recommendations"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        AuditOutcome::Completed {
            final_note: parsed["final_note"].as_f64().unwrap_or(0.0),
            level: parsed["level"].as_str().unwrap_or("").to_string(),
            recommendations,
        }
    }
}
