//! Markdown reporter - shareable briefing document

use crate::models::Dossier;
use anyhow::Result;

/// Render dossier as GitHub-flavored Markdown.
pub fn render(dossier: &Dossier) -> Result<String> {
    let facts = &dossier.facts;
    let score = &dossier.score;
    let mut out = String::new();

    let name = if facts.group_name.is_empty() {
        &dossier.target
    } else {
        &facts.group_name
    };

    out.push_str(&format!("# Dossier: {name}\n\n"));
    out.push_str(&format!(
        "**Score:** {}/1000 — {}\n\n",
        score.score, score.tier
    ));
    if !dossier.generated_at.is_empty() {
        out.push_str(&format!("**Generated:** {}\n\n", dossier.generated_at));
    }
    out.push_str("---\n\n");

    // Pillar table
    out.push_str("| Pillar | Points | Max |\n|---|---|---|\n");
    let b = &score.breakdown;
    out.push_str(&format!("| Muscle | {} | 400 |\n", b.muscle));
    out.push_str(&format!("| Complexity | {} | 250 |\n", b.complexity));
    out.push_str(&format!("| People | {} | 200 |\n", b.people));
    out.push_str(&format!("| Momentum | {} | 150 |\n\n", b.momentum));

    if score.inferred {
        out.push_str("> Some figures were estimated by market heuristics.\n\n");
    }

    for j in &score.justifications {
        out.push_str(&format!("- {j}\n"));
    }
    out.push('\n');

    // Narrative
    for section in &dossier.sections {
        out.push_str(&format!("## {}\n\n{}\n\n---\n\n", section.title, section.body));
    }

    // Financial movements
    if !facts.financial_movements.is_empty() {
        out.push_str("## Financial Movements\n\n");
        for movement in &facts.financial_movements {
            out.push_str(&format!("- {movement}\n"));
        }
        out.push('\n');
    }

    // Quality gate
    if let Some(quality) = &dossier.quality {
        out.push_str(&format!(
            "## Quality Gate — {} ({:.0}%)\n\n",
            quality.level, quality.score_pct
        ));
        for check in &quality.checks {
            let mark = if check.passed { "x" } else { " " };
            out.push_str(&format!("- [{mark}] {} — {}\n", check.criterion, check.note));
        }
        if !quality.recommendations.is_empty() {
            out.push_str("\n**Recommendations:**\n\n");
            for rec in &quality.recommendations {
                out.push_str(&format!("- {rec}\n"));
            }
        }
        out.push('\n');
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisSection;

    #[test]
    fn test_markdown_has_title_and_sections() {
        let mut dossier = Dossier::new("grupo x", "");
        dossier.facts.group_name = "Grupo X Agro".to_string();
        dossier.score.score = 445;
        dossier.sections.push(AnalysisSection {
            title: "Profile and Market".to_string(),
            body: "A serious operation.".to_string(),
        });

        let out = render(&dossier).unwrap();
        assert!(out.starts_with("# Dossier: Grupo X Agro"));
        assert!(out.contains("445/1000"));
        assert!(out.contains("## Profile and Market"));
    }
}
