//! Deterministic quality gate
//!
//! A fixed checklist scored over the finished dossier: each check carries a
//! weight and a pass/fail verdict, and the weighted pass ratio maps to a
//! quality level. Computed once per dossier; the optional AI audit only
//! appends recommendations afterwards.

use crate::models::{Dossier, QualityCheck, QualityLevel, QualityReport};

fn check_cadastral(dossier: &Dossier) -> QualityCheck {
    let has_record = dossier.registry.is_some();
    let has_legal_name = dossier
        .registry
        .as_ref()
        .map(|r| !r.legal_name.is_empty())
        .unwrap_or(false);
    let has_cnae = dossier
        .registry
        .as_ref()
        .map(|r| !r.main_cnae.is_empty())
        .unwrap_or(false);

    let total = [has_record, has_legal_name, has_cnae]
        .iter()
        .filter(|b| **b)
        .count();

    QualityCheck {
        criterion: "Cadastral data (registry record, legal name, CNAE)".to_string(),
        passed: total >= 2,
        note: format!("{total}/3 fields present"),
        weight: 1.0,
    }
}

fn check_operational(dossier: &Dossier) -> QualityCheck {
    let ops = &dossier.operations;
    let indicators = [
        ops.hectares > 0,
        !ops.crops.is_empty(),
        !ops.regions.is_empty(),
        ops.confidence >= 0.5,
    ];
    let total = indicators.iter().filter(|b| **b).count();

    QualityCheck {
        criterion: "Operational data (hectares, crops, regions)".to_string(),
        passed: total >= 2,
        note: format!(
            "{total}/4 indicators OK | confidence: {:.0}%",
            ops.confidence * 100.0
        ),
        weight: 1.5,
    }
}

fn check_financial(dossier: &Dossier) -> QualityCheck {
    let fin = &dossier.finance;
    let indicators = [
        fin.estimated_capital > 0.0,
        fin.estimated_employees > 0,
        !fin.movements.is_empty(),
        fin.corporate_governance || !fin.audits.is_empty(),
    ];
    let total = indicators.iter().filter(|b| **b).count();

    QualityCheck {
        criterion: "Financial data (capital, workforce, movements)".to_string(),
        passed: total >= 2,
        note: format!("{total}/4 indicators | {} movements detected", fin.movements.len()),
        weight: 1.5,
    }
}

fn check_narrative(dossier: &Dossier) -> QualityCheck {
    let sections = &dossier.sections;
    let has_sections = sections.len() >= 3;
    let total_words: usize = sections.iter().map(|s| s.body.split_whitespace().count()).sum();
    let words_ok = total_words >= 400;

    QualityCheck {
        criterion: "Strategic narrative (4 sections, depth)".to_string(),
        passed: has_sections && words_ok,
        note: format!("{} sections | {total_words} words total", sections.len()),
        weight: 2.0,
    }
}

fn check_score(dossier: &Dossier) -> QualityCheck {
    let has_score = dossier.score.score > 0;
    let has_breakdown = dossier.score.breakdown.total() > 0;

    QualityCheck {
        criterion: "Account score computed".to_string(),
        passed: has_score && has_breakdown,
        note: format!("Score: {}/1000 ({})", dossier.score.score, dossier.score.tier),
        weight: 1.0,
    }
}

fn level_for(score_pct: f64) -> QualityLevel {
    if score_pct >= 85.0 {
        QualityLevel::Excellent
    } else if score_pct >= 65.0 {
        QualityLevel::Good
    } else if score_pct >= 45.0 {
        QualityLevel::Acceptable
    } else {
        QualityLevel::Insufficient
    }
}

/// Run every deterministic check and aggregate the weighted pass ratio.
pub fn run_quality_gate(dossier: &Dossier) -> QualityReport {
    let checks = vec![
        check_cadastral(dossier),
        check_operational(dossier),
        check_financial(dossier),
        check_narrative(dossier),
        check_score(dossier),
    ];

    let total_weight: f64 = checks.iter().map(|c| c.weight).sum();
    let passed_weight: f64 = checks.iter().filter(|c| c.passed).map(|c| c.weight).sum();
    let score_pct = passed_weight / total_weight * 100.0;

    let recommendations = checks
        .iter()
        .filter(|c| !c.passed)
        .map(|c| format!("{}: {}", c.criterion, c.note))
        .collect();

    QualityReport {
        level: level_for(score_pct),
        score_pct,
        checks,
        recommendations,
        generated_at: chrono::Utc::now().to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisSection, RegistryRecord, ScoreResult, Tier};

    fn full_dossier() -> Dossier {
        let mut d = Dossier::new("grupo teste", "12345678000100");
        d.registry = Some(RegistryRecord {
            legal_name: "GRUPO TESTE SA".to_string(),
            main_cnae: "0111".to_string(),
            ..Default::default()
        });
        d.operations.hectares = 12_000;
        d.operations.crops = vec!["soja".to_string()];
        d.operations.regions = vec!["MT".to_string()];
        d.operations.confidence = 0.8;
        d.finance.estimated_capital = 60_000_000.0;
        d.finance.estimated_employees = 150;
        d.finance.movements = vec!["CRA issued".to_string()];
        d.finance.corporate_governance = true;
        d.sections = (0..4)
            .map(|i| AnalysisSection {
                title: format!("Section {i}"),
                body: "word ".repeat(150),
            })
            .collect();
        d.score = ScoreResult {
            score: 445,
            tier: Tier::Silver,
            ..Default::default()
        };
        d.score.breakdown.muscle = 445;
        d
    }

    #[test]
    fn test_full_dossier_is_excellent() {
        let report = run_quality_gate(&full_dossier());
        assert_eq!(report.level, QualityLevel::Excellent);
        assert_eq!(report.score_pct, 100.0);
        assert!(report.recommendations.is_empty());
        assert_eq!(report.checks.len(), 5);
    }

    #[test]
    fn test_empty_dossier_is_insufficient() {
        let report = run_quality_gate(&Dossier::new("x", ""));
        assert_eq!(report.level, QualityLevel::Insufficient);
        assert_eq!(report.recommendations.len(), 5);
    }

    #[test]
    fn test_weighted_ratio_reflects_narrative_weight() {
        // Everything passes except the narrative (weight 2.0 of 7.0).
        let mut d = full_dossier();
        d.sections.clear();
        let report = run_quality_gate(&d);
        let expected = (7.0 - 2.0) / 7.0 * 100.0;
        assert!((report.score_pct - expected).abs() < 1e-9);
        assert_eq!(report.level, QualityLevel::Good);
        assert_eq!(report.recommendations.len(), 1);
    }

    #[test]
    fn test_levels_are_exhaustive_over_pct() {
        assert_eq!(level_for(100.0), QualityLevel::Excellent);
        assert_eq!(level_for(85.0), QualityLevel::Excellent);
        assert_eq!(level_for(84.9), QualityLevel::Good);
        assert_eq!(level_for(65.0), QualityLevel::Good);
        assert_eq!(level_for(45.0), QualityLevel::Acceptable);
        assert_eq!(level_for(0.0), QualityLevel::Insufficient);
    }
}
