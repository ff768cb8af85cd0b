//! Heuristic gap-filling
//!
//! When web collection fails to bring exact figures, market heuristics keep
//! a large operation from scoring as zero. Imputation fires only when the
//! target field is exactly zero and land area is known; it never overwrites
//! an observed value. Pure: returns a new fact set plus the notes.

use crate::models::FactSet;

/// Hectares handled per employee, by crop intensity. Lower factor means
/// labor-intensive crops and therefore more imputed headcount.
const INTENSIVE_CROPS: &[&str] = &["cana", "batata", "alho", "semente", "hf"];
const SEMI_INTENSIVE_CROPS: &[&str] = &["café", "cafe", "algod", "laranja"];
const FACTOR_INTENSIVE: u64 = 120;
const FACTOR_SEMI_INTENSIVE: u64 = 200;
const FACTOR_MECHANIZED: u64 = 350;

/// Land value per hectare (BRL), by region tier.
const REGIONS_PRIME_CERRADO: &[&str] = &["mt", "mato grosso", "matopiba", "ba", "to", "pi", "ma"];
const REGIONS_SOUTH_SOUTHEAST: &[&str] = &["sp", "são paulo", "sao paulo", "pr", "paraná", "parana", "rs"];
const VALUE_HA_PRIME: f64 = 3_500.0;
const VALUE_HA_SOUTH: f64 = 5_000.0;
const VALUE_HA_CONSERVATIVE: f64 = 2_500.0;

/// Revenue per hectare per year (BRL), conservative.
const REVENUE_PER_HA: f64 = 5_000.0;

fn employee_factor(crops: &[String]) -> u64 {
    let haystack = crops.join(" ").to_lowercase();
    if INTENSIVE_CROPS.iter().any(|c| haystack.contains(c)) {
        FACTOR_INTENSIVE
    } else if SEMI_INTENSIVE_CROPS.iter().any(|c| haystack.contains(c)) {
        FACTOR_SEMI_INTENSIVE
    } else {
        FACTOR_MECHANIZED
    }
}

fn value_per_hectare(facts: &FactSet) -> f64 {
    let haystack = format!("{} {}", facts.regions.join(" "), facts.state).to_lowercase();
    // Unknown region falls through to the most conservative valuation.
    if REGIONS_PRIME_CERRADO.iter().any(|r| contains_region(&haystack, r)) {
        VALUE_HA_PRIME
    } else if REGIONS_SOUTH_SOUTHEAST.iter().any(|r| contains_region(&haystack, r)) {
        VALUE_HA_SOUTH
    } else {
        VALUE_HA_CONSERVATIVE
    }
}

/// Two-letter UF codes must match as whole words; longer names can match
/// as substrings ("mato grosso" inside a region list).
fn contains_region(haystack: &str, needle: &str) -> bool {
    if needle.len() > 2 {
        return haystack.contains(needle);
    }
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == needle)
}

/// Fill missing employee/capital/revenue figures from land area.
/// Returns the (possibly) completed fact set and one note per imputation.
pub fn impute(facts: &FactSet) -> (FactSet, Vec<String>) {
    let mut filled = facts.clone();
    let mut notes = Vec::new();
    let hectares = facts.hectares;

    if hectares == 0 {
        return (filled, notes);
    }

    if facts.employees == 0 {
        let factor = employee_factor(&facts.crops);
        let estimated = hectares.div_ceil(factor).min(u32::MAX as u64) as u32;
        filled.employees = estimated;
        notes.push(format!(
            "Employees estimated: ~{estimated} (heuristic {hectares}ha ÷ {factor})"
        ));
    }

    if facts.capital() == 0.0 {
        let value_ha = value_per_hectare(facts);
        let estimated = hectares as f64 * value_ha;
        filled.estimated_capital = estimated;
        notes.push(format!(
            "Capital estimated: R${:.1}M (heuristic {hectares}ha × R${value_ha}/ha)",
            estimated / 1e6
        ));
    }

    if facts.estimated_revenue == 0.0 {
        let estimated = hectares as f64 * REVENUE_PER_HA;
        filled.estimated_revenue = estimated;
        notes.push(format!(
            "Revenue estimated: R${:.1}M/year (heuristic)",
            estimated / 1e6
        ));
    }

    (filled, notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_facts(hectares: u64, crops: &[&str]) -> FactSet {
        FactSet {
            hectares,
            crops: crops.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_labor_intensive_imputes_more_employees_than_mechanized() {
        let (intensive, notes_a) = impute(&base_facts(10_000, &["cana"]));
        let (mechanized, notes_b) = impute(&base_facts(10_000, &["soja"]));

        assert!(intensive.employees > 0);
        assert!(intensive.employees > mechanized.employees);
        assert!(!notes_a.is_empty());
        assert!(!notes_b.is_empty());
    }

    #[test]
    fn test_never_overwrites_observed_employees() {
        let mut facts = base_facts(10_000, &["cana"]);
        facts.employees = 42;
        let (filled, notes) = impute(&facts);
        assert_eq!(filled.employees, 42);
        assert!(notes.iter().all(|n| !n.starts_with("Employees")));
    }

    #[test]
    fn test_capital_imputation_by_region_tier() {
        let mut mt = base_facts(1_000, &[]);
        mt.regions = vec!["MT".to_string()];
        let (mt_filled, _) = impute(&mt);
        assert_eq!(mt_filled.estimated_capital, 3_500_000.0);

        let mut sp = base_facts(1_000, &[]);
        sp.state = "SP".to_string();
        let (sp_filled, _) = impute(&sp);
        assert_eq!(sp_filled.estimated_capital, 5_000_000.0);

        // Absent region falls back to the conservative valuation.
        let (unknown_filled, _) = impute(&base_facts(1_000, &[]));
        assert_eq!(unknown_filled.estimated_capital, 2_500_000.0);
    }

    #[test]
    fn test_registry_capital_suppresses_capital_imputation() {
        let mut facts = base_facts(1_000, &[]);
        facts.registry_capital = 750_000.0;
        let (filled, _) = impute(&facts);
        assert_eq!(filled.estimated_capital, 0.0);
        assert_eq!(filled.capital(), 750_000.0);
    }

    #[test]
    fn test_no_area_no_imputation() {
        let (filled, notes) = impute(&FactSet::default());
        assert_eq!(filled, FactSet::default());
        assert!(notes.is_empty());
    }

    #[test]
    fn test_employee_rounding_is_ceiling() {
        // 100 ha ÷ 350 = 0.28... → 1 employee, not 0.
        let (filled, _) = impute(&base_facts(100, &["soja"]));
        assert_eq!(filled.employees, 1);
    }
}
