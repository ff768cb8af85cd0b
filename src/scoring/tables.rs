//! Lookup tables for the four scoring pillars
//!
//! Each table is a monotonic step function over strictly increasing
//! breakpoints: the highest threshold not exceeding the value wins, and
//! every lookup returns the label explaining which threshold was hit.

use crate::models::{FactSet, VerticalIntegration};

/// Pillar maxima. Theoretical total: 1000.
pub const MUSCLE_MAX: u32 = 400;
pub const COMPLEXITY_MAX: u32 = 250;
pub const PEOPLE_MAX: u32 = 200;
pub const MOMENTUM_MAX: u32 = 150;

/// Declared/estimated capital (BRL) → points, max 200.
pub(crate) fn capital_points(capital: f64) -> (u32, String) {
    if capital >= 200_000_000.0 {
        (200, "Capital ≥ R$200M → large-cap corporation".into())
    } else if capital >= 100_000_000.0 {
        (180, "Capital ≥ R$100M → large company".into())
    } else if capital >= 50_000_000.0 {
        (150, "Capital ≥ R$50M → consolidated company".into())
    } else if capital >= 20_000_000.0 {
        (120, "Capital ≥ R$20M → upper mid-size".into())
    } else if capital >= 10_000_000.0 {
        (100, "Capital ≥ R$10M → mid-size company".into())
    } else if capital >= 5_000_000.0 {
        (70, "Capital ≥ R$5M → robust SME".into())
    } else if capital >= 1_000_000.0 {
        (50, "Capital ≥ R$1M → SME".into())
    } else if capital >= 500_000.0 {
        (30, "Capital ≥ R$500k → small company".into())
    } else {
        (10, "Capital < R$500k → micro company".into())
    }
}

/// Land area (hectares) → points, max 200.
pub(crate) fn hectare_points(hectares: u64) -> (u32, String) {
    if hectares >= 100_000 {
        (200, format!("{hectares} ha → mega operation"))
    } else if hectares >= 50_000 {
        (180, format!("{hectares} ha → giant operation"))
    } else if hectares >= 20_000 {
        (150, format!("{hectares} ha → large producer"))
    } else if hectares >= 10_000 {
        (130, format!("{hectares} ha → consolidated producer"))
    } else if hectares >= 5_000 {
        (100, format!("{hectares} ha → upper mid-size"))
    } else if hectares >= 3_000 {
        (80, format!("{hectares} ha → mid-size producer"))
    } else if hectares >= 1_000 {
        (50, format!("{hectares} ha → small-to-mid producer"))
    } else if hectares >= 500 {
        (30, format!("{hectares} ha → small producer"))
    } else if hectares > 0 {
        (10, format!("{hectares} ha → micro producer"))
    } else {
        (0, "No land-area data".into())
    }
}

/// Keyword score per crop, by operational complexity. Matching is substring
/// over the lowercased crop list, so "algod" covers algodão/algodoeira.
const CROP_SCORES: &[(&str, u32)] = &[
    ("cana", 150),
    ("usina", 150),
    ("semente", 140),
    ("algod", 130),
    ("café", 120),
    ("cafe", 120),
    ("alho", 120),
    ("batata", 110),
    ("hf", 110),
    ("hortifruti", 110),
    ("pecuária", 100),
    ("pecuaria", 100),
    ("gado", 100),
    ("boi", 100),
    ("laranja", 100),
    ("citrus", 100),
    ("soja", 80),
    ("milho", 80),
    ("trigo", 70),
    ("feijão", 60),
    ("feijao", 60),
    ("arroz", 60),
];

const CROP_DEFAULT: u32 = 50;
const CROP_MAX: u32 = 150;

/// Crop list → complexity points, max 150.
///
/// Takes the MAXIMUM matched keyword score across all crops (not a sum),
/// then applies a diversification bonus, clipped to the crop maximum.
/// An absent crop list yields the default mid score, never zero.
pub(crate) fn crop_points(crops: &[String]) -> (u32, String) {
    if crops.is_empty() {
        return (CROP_DEFAULT, "Crops not identified → default score".into());
    }

    let haystack = crops.join(" ").to_lowercase();
    let mut best = CROP_DEFAULT;
    let mut best_label = "Generic crops".to_string();

    for (keyword, score) in CROP_SCORES {
        if haystack.contains(keyword) && *score > best {
            best = *score;
            best_label = format!("Crop detected: {keyword}");
        }
    }

    let distinct: std::collections::HashSet<&String> = crops.iter().collect();
    if distinct.len() >= 4 {
        best = (best + 30).min(CROP_MAX);
        best_label.push_str(&format!(" + {} crops (diversified)", distinct.len()));
    } else if distinct.len() >= 2 {
        best = (best + 15).min(CROP_MAX);
        best_label.push_str(&format!(" + {} crops", distinct.len()));
    }

    (best, best_label)
}

const VERTICAL_MAX: u32 = 100;

/// Vertical-integration flags → points, max 100.
pub(crate) fn vertical_points(vert: &VerticalIntegration) -> (u32, String) {
    let mut pts = 0;
    let mut labels = Vec::new();

    if vert.agro_industry {
        pts += 40;
        labels.push("agro-industry");
    }
    if vert.mill {
        pts += 40;
        labels.push("mill");
    }
    if vert.slaughterhouse {
        pts += 35;
        labels.push("slaughterhouse");
    }
    if vert.seed_plant {
        pts += 30;
        labels.push("seed plant");
    }
    if vert.silos {
        pts += 25;
        labels.push("silos");
    }
    if vert.cotton_gin {
        pts += 25;
        labels.push("cotton gin");
    }
    if vert.feed_factory {
        pts += 20;
        labels.push("feed factory");
    }

    let pts = pts.min(VERTICAL_MAX);
    let label = if labels.is_empty() {
        "Not vertically integrated".to_string()
    } else {
        labels.join(", ")
    };
    (pts, label)
}

/// Employee count → points, max 200.
pub(crate) fn employee_points(employees: u32) -> (u32, String) {
    if employees >= 1000 {
        (200, format!("{employees} employees → massive operation"))
    } else if employees >= 500 {
        (150, format!("{employees} employees → major employer"))
    } else if employees >= 200 {
        (120, format!("{employees} employees → upper mid-size"))
    } else if employees >= 100 {
        (90, format!("{employees} employees → mid-size"))
    } else if employees >= 50 {
        (60, format!("{employees} employees → small-to-mid"))
    } else if employees >= 20 {
        (30, format!("{employees} employees → small"))
    } else if employees > 0 {
        (15, format!("{employees} employees → micro"))
    } else {
        (0, "No workforce data".into())
    }
}

/// Governance/technology/legal-structure signals → points, capped at 150.
/// Each matched signal contributes a fixed value.
pub(crate) fn momentum_points(facts: &FactSet) -> (u32, String) {
    let mut pts = 0;
    let mut labels: Vec<String> = Vec::new();

    let financial_text = format!(
        "{} {} {}",
        facts.financial_movements.join(" "),
        facts.fiagro_funds.join(" "),
        facts.cra_issues.join(" ")
    )
    .to_lowercase();

    if financial_text.contains("fiagro") {
        pts += 40;
        labels.push("Fiagro detected".into());
    }
    if financial_text.contains("cra") {
        pts += 35;
        labels.push("CRA issued".into());
    }
    if financial_text.contains("auditoria") || facts.corporate_governance {
        pts += 30;
        labels.push("Corporate governance".into());
    }
    let partner_text = format!("{} {}", financial_text, facts.financial_partners.join(" ")).to_lowercase();
    if ["xp", "suno", "valora", "itaú", "itau", "btg"]
        .iter()
        .any(|p| partner_text.contains(p))
    {
        pts += 25;
        labels.push("Relevant financial partner".into());
    }

    let tech_text = facts.technologies.join(" ").to_lowercase();
    if ["erp", "sap", "totvs", "senior"].iter().any(|t| tech_text.contains(t)) {
        pts += 20;
        labels.push("ERP/management system".into());
    }
    if ["agricultura de precisão", "drone", "telemetria", "iot"]
        .iter()
        .any(|t| tech_text.contains(t))
    {
        pts += 15;
        labels.push("Ag-tech".into());
    }

    let legal = facts.legal_nature.to_lowercase();
    if legal.contains("s.a.") || legal.contains("sociedade anônima") || legal.contains("sociedade anonima") {
        pts += 25;
        labels.push("S.A. (implied governance)".into());
    }

    if facts.shareholder_count >= 5 {
        pts += 15;
        labels.push(format!("Board with {} shareholders", facts.shareholder_count));
    }

    let pts = pts.min(MOMENTUM_MAX);
    let label = if labels.is_empty() {
        "No governance signals".to_string()
    } else {
        labels.join("; ")
    };
    (pts, label)
}
