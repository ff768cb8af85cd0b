//! Text (terminal) reporter with colors and formatting

use crate::models::{Dossier, Tier};
use anyhow::Result;

/// Tier colors (ANSI escape codes)
fn tier_color(tier: Tier) -> &'static str {
    match tier {
        Tier::Diamond => "\x1b[96m", // Light cyan
        Tier::Gold => "\x1b[33m",    // Yellow
        Tier::Silver => "\x1b[37m",  // White
        Tier::Bronze => "\x1b[31m",  // Red
    }
}

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";

fn pillar_bar(value: u32, max: u32) -> String {
    const WIDTH: usize = 20;
    let filled = if max == 0 {
        0
    } else {
        (value as usize * WIDTH) / max as usize
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(WIDTH - filled))
}

/// Render dossier as formatted terminal output
pub fn render(dossier: &Dossier) -> Result<String> {
    let mut out = String::new();
    let facts = &dossier.facts;
    let score = &dossier.score;
    let tier_c = tier_color(score.tier);

    // Header
    let name = if facts.group_name.trim().is_empty() {
        dossier.target.as_str()
    } else {
        facts.group_name.as_str()
    };
    out.push_str(&format!("\n{BOLD}Agroscout Dossier: {name}{RESET}\n"));
    out.push_str(&format!("{DIM}──────────────────────────────────────{RESET}\n"));
    out.push_str(&format!(
        "Score: {BOLD}{}/1000{RESET}  Tier: {tier_c}{BOLD}{}{RESET}",
        score.score, score.tier
    ));
    if score.inferred {
        out.push_str(&format!("  {DIM}(includes inferred data){RESET}"));
    }
    out.push('\n');
    if !dossier.cnpj.is_empty() {
        out.push_str(&format!(
            "CNPJ: {}",
            crate::registry::format_cnpj(&dossier.cnpj)
        ));
        if let Some(reg) = &dossier.registry {
            out.push_str(&format!("  {DIM}{}{RESET}", reg.legal_name));
        }
        out.push('\n');
    }
    out.push('\n');

    // Pillars
    out.push_str(&format!("{BOLD}PILLARS{RESET}\n"));
    let b = &score.breakdown;
    out.push_str(&format!(
        "  Muscle      {} {:>3}/400\n",
        pillar_bar(b.muscle, 400),
        b.muscle
    ));
    out.push_str(&format!(
        "  Complexity  {} {:>3}/250\n",
        pillar_bar(b.complexity, 250),
        b.complexity
    ));
    out.push_str(&format!(
        "  People      {} {:>3}/200\n",
        pillar_bar(b.people, 200),
        b.people
    ));
    out.push_str(&format!(
        "  Momentum    {} {:>3}/150\n\n",
        pillar_bar(b.momentum, 150),
        b.momentum
    ));

    // Key facts
    out.push_str(&format!("{BOLD}KEY FACTS{RESET}\n"));
    out.push_str(&format!("  Land area: {} ha\n", facts.hectares));
    if !facts.crops.is_empty() {
        out.push_str(&format!("  Crops: {}\n", facts.crops.join(", ")));
    }
    if facts.capital() > 0.0 {
        out.push_str(&format!("  Capital: R${:.1}M\n", facts.capital() / 1e6));
    }
    if facts.employees > 0 {
        out.push_str(&format!("  Employees: {}\n", facts.employees));
    }
    if !facts.regions.is_empty() {
        out.push_str(&format!("  Regions: {}\n", facts.regions.join(", ")));
    }
    if facts.vertical.any() {
        out.push_str("  Vertically integrated operation\n");
    }
    if !facts.financial_movements.is_empty() {
        out.push_str(&format!(
            "  Financial movements: {}\n",
            facts.financial_movements.len()
        ));
    }
    out.push('\n');

    // Score justifications
    out.push_str(&format!("{BOLD}SCORE RATIONALE{RESET}\n"));
    for j in &score.justifications {
        out.push_str(&format!("  {DIM}-{RESET} {j}\n"));
    }
    out.push('\n');

    // Narrative sections
    for section in &dossier.sections {
        out.push_str(&format!("{BOLD}{}{RESET}\n", section.title.to_uppercase()));
        out.push_str(&section.body);
        out.push_str("\n\n");
    }

    // Quality gate
    if let Some(quality) = &dossier.quality {
        out.push_str(&format!(
            "{BOLD}QUALITY GATE{RESET}  {} ({:.0}%)\n",
            quality.level, quality.score_pct
        ));
        for check in &quality.checks {
            let mark = if check.passed {
                format!("{GREEN}✓{RESET}")
            } else {
                format!("{RED}✗{RESET}")
            };
            out.push_str(&format!("  {mark} {} — {}\n", check.criterion, check.note));
        }
        if !quality.recommendations.is_empty() {
            out.push_str(&format!("\n{BOLD}RECOMMENDATIONS{RESET}\n"));
            for rec in &quality.recommendations {
                out.push_str(&format!("  - {rec}\n"));
            }
        }
        out.push('\n');
    }

    if !dossier.generated_at.is_empty() {
        out.push_str(&format!(
            "{DIM}Generated {} in {:.1}s via {}{RESET}\n",
            dossier.generated_at, dossier.elapsed_seconds, dossier.model_used
        ));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreBreakdown;

    #[test]
    fn test_pillar_bar_bounds() {
        assert_eq!(pillar_bar(0, 400).chars().filter(|c| *c == '█').count(), 0);
        assert_eq!(pillar_bar(400, 400).chars().filter(|c| *c == '█').count(), 20);
        assert_eq!(pillar_bar(200, 400).chars().filter(|c| *c == '█').count(), 10);
    }

    #[test]
    fn test_render_contains_score_and_tier() {
        let mut dossier = Dossier::new("grupo x", "12345678000100");
        dossier.score.score = 445;
        dossier.score.tier = crate::models::Tier::Silver;
        dossier.score.breakdown = ScoreBreakdown {
            muscle: 280,
            complexity: 135,
            people: 30,
            momentum: 0,
        };
        let out = render(&dossier).unwrap();
        assert!(out.contains("445/1000"));
        assert!(out.contains("SILVER"));
        assert!(out.contains("12.345.678/0001-00"));
    }
}
