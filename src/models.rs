//! Core data models for Agroscout
//!
//! These models are used throughout the codebase for representing
//! collected fragments, the merged fact set, scores, and the final dossier.

use serde::{Deserialize, Serialize};

/// Account tier derived from the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Bronze,
    Silver,
    Gold,
    Diamond,
}

impl Tier {
    /// Map a total score to its tier. Thresholds are monotonic and
    /// exhaustive over the 0..=1000 range.
    pub fn for_score(score: u32) -> Self {
        if score >= 751 {
            Tier::Diamond
        } else if score >= 501 {
            Tier::Gold
        } else if score >= 251 {
            Tier::Silver
        } else {
            Tier::Bronze
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Diamond => write!(f, "DIAMOND"),
            Tier::Gold => write!(f, "GOLD"),
            Tier::Silver => write!(f, "SILVER"),
            Tier::Bronze => write!(f, "BRONZE"),
        }
    }
}

/// One shareholder entry from the registry's QSA list.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Shareholder {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub joined: String,
    #[serde(default)]
    pub document: String,
    #[serde(default)]
    pub age_bracket: String,
}

/// Cadastral record returned by the public company registry.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegistryRecord {
    #[serde(default)]
    pub cnpj: String,
    #[serde(default)]
    pub legal_name: String,
    #[serde(default)]
    pub trade_name: String,
    #[serde(default)]
    pub registration_status: String,
    #[serde(default)]
    pub opened: String,
    #[serde(default)]
    pub legal_nature: String,
    #[serde(default)]
    pub capital: f64,
    #[serde(default)]
    pub company_size: String,
    #[serde(default)]
    pub main_cnae: String,
    #[serde(default)]
    pub cnae_description: String,
    #[serde(default)]
    pub secondary_cnaes: Vec<String>,
    #[serde(default)]
    pub municipality: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub shareholders: Vec<Shareholder>,
    /// Which provider answered ("brasilapi" or "receitaws").
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub fetched_at: String,
}

/// Vertical-integration flags discovered by the operational recon agent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct VerticalIntegration {
    #[serde(default)]
    pub agro_industry: bool,
    #[serde(default)]
    pub seed_plant: bool,
    #[serde(default)]
    pub silos: bool,
    #[serde(default)]
    pub cotton_gin: bool,
    #[serde(default)]
    pub mill: bool,
    #[serde(default)]
    pub slaughterhouse: bool,
    #[serde(default)]
    pub feed_factory: bool,
}

impl VerticalIntegration {
    pub fn any(&self) -> bool {
        self.agro_industry
            || self.seed_plant
            || self.silos
            || self.cotton_gin
            || self.mill
            || self.slaughterhouse
            || self.feed_factory
    }
}

/// Physical/operational structure of the target group.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OperationsFragment {
    #[serde(default)]
    pub group_name: String,
    #[serde(default)]
    pub hectares: u64,
    #[serde(default)]
    pub crops: Vec<String>,
    #[serde(default)]
    pub vertical: VerticalIntegration,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub farm_count: u32,
    #[serde(default)]
    pub technologies: Vec<String>,
    /// Self-reported confidence of the collecting agent, 0.0..=1.0.
    #[serde(default)]
    pub confidence: f32,
}

/// Capital-markets and governance facts about the target group.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FinanceFragment {
    #[serde(default)]
    pub estimated_capital: f64,
    #[serde(default)]
    pub estimated_employees: u32,
    #[serde(default)]
    pub estimated_revenue: f64,
    #[serde(default)]
    pub movements: Vec<String>,
    #[serde(default)]
    pub fiagro_funds: Vec<String>,
    #[serde(default)]
    pub cra_issues: Vec<String>,
    #[serde(default)]
    pub partners: Vec<String>,
    #[serde(default)]
    pub audits: Vec<String>,
    #[serde(default)]
    pub corporate_governance: bool,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub confidence: f32,
}

/// One news headline surfaced by the market-intel agent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Headline {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub approx_date: String,
    #[serde(default)]
    pub relevance: String,
}

/// Recent news, competitive landscape, and buying signals.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IntelFragment {
    #[serde(default)]
    pub headlines: Vec<Headline>,
    #[serde(default)]
    pub competitors: Vec<String>,
    #[serde(default)]
    pub sector_trends: Vec<String>,
    #[serde(default)]
    pub pains: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub buy_signals: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub confidence: f32,
}

/// Flat merged fact map consumed by the scoring engine.
///
/// Produced by [`Dossier::merge_facts`]; the three fragments and the
/// registry record contribute disjoint groups of fields, so the merge is
/// additive rather than overwrite-by-recency.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FactSet {
    #[serde(default)]
    pub group_name: String,
    /// Capital declared in the registry record.
    #[serde(default)]
    pub registry_capital: f64,
    /// Capital estimated by the financial agent (or imputed).
    #[serde(default)]
    pub estimated_capital: f64,
    #[serde(default)]
    pub hectares: u64,
    #[serde(default)]
    pub crops: Vec<String>,
    #[serde(default)]
    pub vertical: VerticalIntegration,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub farm_count: u32,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub employees: u32,
    #[serde(default)]
    pub estimated_revenue: f64,
    #[serde(default)]
    pub financial_movements: Vec<String>,
    #[serde(default)]
    pub fiagro_funds: Vec<String>,
    #[serde(default)]
    pub cra_issues: Vec<String>,
    #[serde(default)]
    pub financial_partners: Vec<String>,
    #[serde(default)]
    pub audits: Vec<String>,
    #[serde(default)]
    pub corporate_governance: bool,
    #[serde(default)]
    pub legal_nature: String,
    #[serde(default)]
    pub shareholder_count: u32,
    #[serde(default)]
    pub main_cnae: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub municipality: String,
}

impl FactSet {
    /// Effective capital: the agent estimate when present, the registry
    /// figure otherwise.
    pub fn capital(&self) -> f64 {
        if self.estimated_capital > 0.0 {
            self.estimated_capital
        } else {
            self.registry_capital
        }
    }
}

/// Per-pillar point totals. Each pillar is clipped to its own maximum
/// before summing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    /// Capital + land area, max 400.
    pub muscle: u32,
    /// Crops + vertical integration, max 250.
    pub complexity: u32,
    /// Workforce, max 200.
    pub people: u32,
    /// Governance + technology signals, max 150.
    pub momentum: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.muscle + self.complexity + self.people + self.momentum
    }
}

/// Output of the scoring engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ScoreResult {
    pub score: u32,
    pub tier: Tier,
    pub breakdown: ScoreBreakdown,
    /// True when any fact was filled in by heuristic imputation.
    pub inferred: bool,
    /// Imputation notes first, then one line per pillar.
    pub justifications: Vec<String>,
}

/// Quality-gate verdict levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    #[default]
    Insufficient,
    Acceptable,
    Good,
    Excellent,
}

impl std::fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityLevel::Excellent => write!(f, "EXCELLENT"),
            QualityLevel::Good => write!(f, "GOOD"),
            QualityLevel::Acceptable => write!(f, "ACCEPTABLE"),
            QualityLevel::Insufficient => write!(f, "INSUFFICIENT"),
        }
    }
}

/// One deterministic completeness check over a finished dossier.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QualityCheck {
    pub criterion: String,
    pub passed: bool,
    pub note: String,
    pub weight: f64,
}

/// Aggregated quality-gate result. Immutable once computed, except that
/// the optional AI audit may append recommendations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QualityReport {
    pub level: QualityLevel,
    pub score_pct: f64,
    pub checks: Vec<QualityCheck>,
    pub recommendations: Vec<String>,
    pub generated_at: String,
}

/// One section of the strategist's narrative briefing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalysisSection {
    pub title: String,
    pub body: String,
}

/// The complete dossier assembled by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Dossier {
    pub target: String,
    pub cnpj: String,
    pub registry: Option<RegistryRecord>,
    pub operations: OperationsFragment,
    pub finance: FinanceFragment,
    pub intel: IntelFragment,
    pub facts: FactSet,
    pub score: ScoreResult,
    pub sections: Vec<AnalysisSection>,
    pub raw_analysis: String,
    pub quality: Option<QualityReport>,
    pub model_used: String,
    pub generated_at: String,
    pub elapsed_seconds: f64,
    pub pipeline_log: Vec<String>,
}

impl Dossier {
    pub fn new(target: impl Into<String>, cnpj: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            cnpj: cnpj.into(),
            ..Default::default()
        }
    }

    /// Fuse the registry record and the three fragments into the flat
    /// fact map the scoring engine consumes. Each source owns a disjoint
    /// group of fields; nothing here overwrites another source's data.
    pub fn merge_facts(&self) -> FactSet {
        let mut facts = FactSet::default();

        if let Some(reg) = &self.registry {
            facts.registry_capital = reg.capital;
            facts.main_cnae = reg.main_cnae.clone();
            facts.legal_nature = reg.legal_nature.clone();
            facts.shareholder_count = reg.shareholders.len() as u32;
            facts.state = reg.state.clone();
            facts.municipality = reg.municipality.clone();
        }

        let ops = &self.operations;
        facts.group_name = if ops.group_name.is_empty() {
            self.target.clone()
        } else {
            ops.group_name.clone()
        };
        facts.hectares = ops.hectares;
        facts.crops = ops.crops.clone();
        facts.vertical = ops.vertical;
        facts.regions = ops.regions.clone();
        facts.farm_count = ops.farm_count;
        facts.technologies = ops.technologies.clone();

        let fin = &self.finance;
        facts.estimated_capital = fin.estimated_capital;
        facts.employees = fin.estimated_employees;
        facts.estimated_revenue = fin.estimated_revenue;
        facts.financial_movements = fin.movements.clone();
        facts.fiagro_funds = fin.fiagro_funds.clone();
        facts.cra_issues = fin.cra_issues.clone();
        facts.financial_partners = fin.partners.clone();
        facts.audits = fin.audits.clone();
        facts.corporate_governance = fin.corporate_governance;

        facts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_thresholds_are_exhaustive() {
        assert_eq!(Tier::for_score(0), Tier::Bronze);
        assert_eq!(Tier::for_score(250), Tier::Bronze);
        assert_eq!(Tier::for_score(251), Tier::Silver);
        assert_eq!(Tier::for_score(500), Tier::Silver);
        assert_eq!(Tier::for_score(501), Tier::Gold);
        assert_eq!(Tier::for_score(750), Tier::Gold);
        assert_eq!(Tier::for_score(751), Tier::Diamond);
        assert_eq!(Tier::for_score(1000), Tier::Diamond);
    }

    #[test]
    fn merge_prefers_operations_name_over_target() {
        let mut dossier = Dossier::new("acme agro", "");
        dossier.operations.group_name = "Grupo Acme Agro SA".to_string();
        assert_eq!(dossier.merge_facts().group_name, "Grupo Acme Agro SA");

        dossier.operations.group_name.clear();
        assert_eq!(dossier.merge_facts().group_name, "acme agro");
    }

    #[test]
    fn merge_is_additive_across_sources() {
        let mut dossier = Dossier::new("x", "");
        dossier.registry = Some(RegistryRecord {
            capital: 1_000_000.0,
            main_cnae: "0111".to_string(),
            ..Default::default()
        });
        dossier.operations.hectares = 5000;
        dossier.finance.estimated_capital = 2_000_000.0;

        let facts = dossier.merge_facts();
        // Registry capital and agent estimate coexist; neither clobbers the other.
        assert_eq!(facts.registry_capital, 1_000_000.0);
        assert_eq!(facts.estimated_capital, 2_000_000.0);
        assert_eq!(facts.capital(), 2_000_000.0);
        assert_eq!(facts.hectares, 5000);
    }
}
