//! JSON reporter - nested machine-readable export

use crate::models::Dossier;
use anyhow::Result;
use serde_json::json;

/// Render dossier as a nested JSON document.
pub fn render(dossier: &Dossier) -> Result<String> {
    let facts = &dossier.facts;
    let score = &dossier.score;

    let doc = json!({
        "target": &dossier.target,
        "group_name": &facts.group_name,
        "cnpj": &dossier.cnpj,
        "score": {
            "total": score.score,
            "tier": score.tier.to_string(),
            "breakdown": {
                "muscle": score.breakdown.muscle,
                "complexity": score.breakdown.complexity,
                "people": score.breakdown.people,
                "momentum": score.breakdown.momentum,
            },
            "inferred": score.inferred,
            "justifications": &score.justifications,
        },
        "registry": &dossier.registry,
        "operations": &dossier.operations,
        "finance": &dossier.finance,
        "market_intel": &dossier.intel,
        "facts": facts,
        "analysis_sections": &dossier.sections,
        "quality": &dossier.quality,
        "metadata": {
            "model_used": &dossier.model_used,
            "generated_at": &dossier.generated_at,
            "elapsed_seconds": dossier.elapsed_seconds,
            "pipeline_log": &dossier.pipeline_log,
        },
    });

    Ok(serde_json::to_string_pretty(&doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_is_valid_json_and_lossless_on_score() {
        let mut dossier = Dossier::new("grupo x", "12345678000100");
        dossier.score.score = 445;
        dossier.score.breakdown.muscle = 280;
        dossier.facts.hectares = 12_000;

        let out = render(&dossier).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["score"]["total"], 445);
        assert_eq!(parsed["score"]["breakdown"]["muscle"], 280);
        assert_eq!(parsed["facts"]["hectares"], 12_000);
        assert_eq!(parsed["target"], "grupo x");
    }
}
