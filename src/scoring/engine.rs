//! Pillar assembly and tier derivation
//!
//! Pillars:
//! - Muscle (size): capital + hectares, max 400
//! - Complexity: crops + vertical integration, max 250
//! - People (management): workforce, max 200
//! - Momentum (tech/governance): signals, max 150
//!
//! Total: max 1000.

use crate::models::{FactSet, ScoreBreakdown, ScoreResult, Tier};
use crate::scoring::impute::impute;
use crate::scoring::tables::{
    capital_points, crop_points, employee_points, hectare_points, momentum_points,
    vertical_points, COMPLEXITY_MAX, MOMENTUM_MAX, MUSCLE_MAX, PEOPLE_MAX,
};
use tracing::debug;

/// Compute the account score for a merged fact set.
///
/// Deterministic and total: any well-typed fact set scores without error,
/// and identical inputs yield identical output including justification
/// order (imputation notes first, then one line per pillar).
pub fn score(facts: &FactSet) -> ScoreResult {
    let (facts, imputation_notes) = impute(facts);
    let inferred = !imputation_notes.is_empty();
    let mut justifications = imputation_notes;

    let (cap_pts, cap_label) = capital_points(facts.capital());
    let (hec_pts, hec_label) = hectare_points(facts.hectares);
    let muscle = (cap_pts + hec_pts).min(MUSCLE_MAX);
    justifications.push(format!(
        "Muscle: {cap_label} ({cap_pts}) + {hec_label} ({hec_pts}) = {muscle}"
    ));

    let (crop_pts, crop_label) = crop_points(&facts.crops);
    let (vert_pts, vert_label) = vertical_points(&facts.vertical);
    let complexity = (crop_pts + vert_pts).min(COMPLEXITY_MAX);
    justifications.push(format!(
        "Complexity: {crop_label} ({crop_pts}) + {vert_label} ({vert_pts}) = {complexity}"
    ));

    let (emp_pts, emp_label) = employee_points(facts.employees);
    let people = emp_pts.min(PEOPLE_MAX);
    justifications.push(format!("People: {emp_label} = {people}"));

    let (mom_pts, mom_label) = momentum_points(&facts);
    let momentum = mom_pts.min(MOMENTUM_MAX);
    justifications.push(format!("Momentum: {mom_label} = {momentum}"));

    let breakdown = ScoreBreakdown {
        muscle,
        complexity,
        people,
        momentum,
    };
    let total = breakdown.total();
    let tier = Tier::for_score(total);

    debug!(
        score = total,
        %tier,
        muscle, complexity, people, momentum, "account scored"
    );

    ScoreResult {
        score: total,
        tier,
        breakdown,
        inferred,
        justifications,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VerticalIntegration;

    fn facts(capital: f64, hectares: u64, crops: &[&str], employees: u32) -> FactSet {
        FactSet {
            estimated_capital: capital,
            hectares,
            crops: crops.iter().map(|s| s.to_string()).collect(),
            employees,
            ..Default::default()
        }
    }

    #[test]
    fn test_worked_example() {
        // capital 60M, 12k ha, soja+milho, agro-industry, employees imputed.
        let mut f = facts(60_000_000.0, 12_000, &["soja", "milho"], 0);
        f.vertical = VerticalIntegration {
            agro_industry: true,
            ..Default::default()
        };

        let result = score(&f);

        // Muscle: 150 (≥50M) + 130 (≥10k ha) = 280.
        assert_eq!(result.breakdown.muscle, 280);
        // Complexity: best crop 80 + 15 (2 crops) + 40 (agro-industry) = 135.
        assert_eq!(result.breakdown.complexity, 135);
        // Employees imputed via the mechanized factor: ceil(12000/350) = 35.
        assert!(result.inferred);
        assert_eq!(result.breakdown.people, 30);
        assert_eq!(result.tier, Tier::for_score(result.score));
        assert_eq!(
            result.score,
            result.breakdown.muscle
                + result.breakdown.complexity
                + result.breakdown.people
                + result.breakdown.momentum
        );
    }

    #[test]
    fn test_idempotence_bit_identical() {
        let f = facts(5_000_000.0, 4_000, &["cana", "soja"], 120);
        let a = score(&f);
        let b = score(&f);
        assert_eq!(a, b);
        assert_eq!(a.justifications, b.justifications);
    }

    #[test]
    fn test_monotonic_in_hectares() {
        let mut prev = 0;
        for h in [0u64, 400, 800, 2_000, 4_000, 8_000, 15_000, 30_000, 60_000, 150_000] {
            let result = score(&facts(1_000_000.0, h, &["soja"], 100));
            assert!(
                result.breakdown.muscle >= prev,
                "muscle dropped at {h} ha"
            );
            prev = result.breakdown.muscle;
        }
    }

    #[test]
    fn test_monotonic_in_employees() {
        let mut prev = 0;
        for e in [1u32, 10, 25, 60, 120, 300, 600, 1_500] {
            let result = score(&facts(1_000_000.0, 1_000, &["soja"], e));
            assert!(
                result.breakdown.people >= prev,
                "people dropped at {e} employees"
            );
            prev = result.breakdown.people;
        }
    }

    #[test]
    fn test_pillar_bounds_hold_under_extremes() {
        let mut f = facts(f64::MAX / 2.0, u64::MAX / 2, &["cana", "semente", "algodão", "café", "soja"], u32::MAX);
        f.vertical = VerticalIntegration {
            agro_industry: true,
            seed_plant: true,
            silos: true,
            cotton_gin: true,
            mill: true,
            slaughterhouse: true,
            feed_factory: true,
        };
        f.financial_movements = vec!["fiagro cra auditoria xp btg".to_string()];
        f.corporate_governance = true;
        f.legal_nature = "sociedade anônima".to_string();
        f.shareholder_count = 10;
        f.technologies = vec!["erp sap drone iot".to_string()];

        let result = score(&f);
        assert!(result.breakdown.muscle <= MUSCLE_MAX);
        assert!(result.breakdown.complexity <= COMPLEXITY_MAX);
        assert!(result.breakdown.people <= PEOPLE_MAX);
        assert!(result.breakdown.momentum <= MOMENTUM_MAX);
        assert!(result.score <= 1000);
        assert_eq!(result.tier, Tier::Diamond);
    }

    #[test]
    fn test_empty_facts_score_without_error() {
        let result = score(&FactSet::default());
        // No area, no imputation; crops default keeps complexity nonzero.
        assert!(!result.inferred);
        assert_eq!(result.breakdown.complexity, 50);
        assert_eq!(result.breakdown.muscle, 10); // micro-company capital floor
        assert_eq!(result.tier, Tier::Bronze);
    }

    #[test]
    fn test_justification_order_imputations_first() {
        let result = score(&facts(0.0, 10_000, &["soja"], 0));
        assert!(result.inferred);
        let first_pillar_line = result
            .justifications
            .iter()
            .position(|j| j.starts_with("Muscle:"))
            .unwrap();
        let last_note = result
            .justifications
            .iter()
            .rposition(|j| j.contains("estimated"))
            .unwrap();
        assert!(last_note < first_pillar_line);
        // Exactly four pillar lines at the tail.
        assert_eq!(result.justifications.len() - first_pillar_line, 4);
    }
}
