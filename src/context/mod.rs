//! Static market-knowledge tables
//!
//! Feeds the agents' prompts with sector and regional context at zero API
//! cost. Keyed by CNAE prefix (activity classification) and UF (state code).
//! Portuguese keywords are intentional: they match the language of the data
//! sources the agents read.

/// Sector profile keyed by CNAE prefix.
pub struct SectorProfile {
    pub sector: &'static str,
    pub pains: &'static [&'static str],
    pub product_modules: &'static [&'static str],
}

/// Regional profile keyed by UF.
pub struct RegionProfile {
    pub name: &'static str,
    pub profile: &'static str,
    pub challenges: &'static str,
    pub erp_rivals: &'static [&'static str],
}

const GRAIN: SectorProfile = SectorProfile {
    sector: "Grãos (Soja, Milho, Trigo)",
    pains: &[
        "Gestão de múltiplas safras simultâneas (safra/safrinha)",
        "Controle de insumos com custos voláteis (fertilizantes, sementes, defensivos)",
        "Rastreabilidade exigida por tradings",
        "Gestão de armazenagem e frete; logística de escoamento é gargalo",
        "Conciliação de contratos de hedge/barter",
    ],
    product_modules: &["ERP Gestão Agrícola", "WMS (Armazéns)", "Financeiro", "BI Agrícola"],
};

const SUGARCANE: SectorProfile = SectorProfile {
    sector: "Cana-de-Açúcar / Sucroenergético",
    pains: &[
        "Controle de CTT (Corte, Transporte, Transbordo); mais de 40% do custo",
        "Gestão de moagem e produção de açúcar/etanol/energia",
        "RenovaBio: controle de CBIOs obrigatório",
        "Manutenção pesada: colhedoras, treminhões, caldeiras",
        "Safra emprega 3x mais que entressafra",
    ],
    product_modules: &["ERP Industrial", "Manutenção de Ativos", "RH/DP", "Gestão Agrícola"],
};

const COTTON: SectorProfile = SectorProfile {
    sector: "Algodão / Fibras",
    pains: &[
        "Beneficiamento: controle de algodoeira (pluma, caroço, fibrilha)",
        "Rastreabilidade ABR (Algodão Brasileiro Responsável)",
        "Gestão de classificação HVI por fardo",
        "Controle de irrigação com custo energético alto",
    ],
    product_modules: &["ERP Gestão Agrícola", "WMS", "Qualidade", "Manutenção"],
};

const HORTICULTURE: SectorProfile = SectorProfile {
    sector: "HF / Culturas Especiais",
    pains: &[
        "Perecibilidade: janela de colheita/venda muito curta",
        "Rastreabilidade de alimentos exigida por redes de varejo",
        "Gestão de câmaras frias e packing houses",
        "Mão de obra sazonal massiva e compliance trabalhista",
    ],
    product_modules: &["ERP Gestão Agrícola", "RH/DP", "WMS", "Qualidade"],
};

const LIVESTOCK: SectorProfile = SectorProfile {
    sector: "Pecuária de Corte / Leite",
    pains: &[
        "Rastreabilidade individual (GTA, SISBOV, exportação)",
        "Gestão nutricional: confinamento, suplementação, dieta",
        "Controle reprodutivo: IATF, estação de monta, genética",
        "Frigoríficos: controle de abate e rendimento de carcaça",
    ],
    product_modules: &["ERP Pecuária", "Gestão de Rebanho", "Manutenção", "Financeiro"],
};

const GENERIC_AGRO: SectorProfile = SectorProfile {
    sector: "Agronegócio Geral",
    pains: &[
        "Dificuldade de integrar operações de campo com o administrativo",
        "Planilhas substituindo ERP; risco operacional e fiscal",
        "Gestão de frota própria e manutenção de máquinas",
        "Compliance fiscal rural: Funrural, ICMS diferido, REINF",
        "Falta de visibilidade de custos reais por talhão/safra",
    ],
    product_modules: &["ERP Gestão Agrícola", "Financeiro", "RH/DP", "BI"],
};

/// Resolve a sector profile from a CNAE code. Falls back to the generic
/// agro profile when the prefix is unknown or empty.
pub fn sector_for_cnae(cnae: &str) -> &'static SectorProfile {
    let digits: String = cnae.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.get(..4) {
        Some("0111") | Some("0112") | Some("0114") => &GRAIN,
        Some("0113") => &SUGARCANE,
        Some("0115") => &COTTON,
        Some("0119") | Some("0121") | Some("0131") => &HORTICULTURE,
        Some("0151") | Some("0152") | Some("0153") => &LIVESTOCK,
        _ => &GENERIC_AGRO,
    }
}

const REGIONS: &[(&str, RegionProfile)] = &[
    (
        "MT",
        RegionProfile {
            name: "Mato Grosso",
            profile: "Maior produtor de grãos do Brasil. Operações gigantes (10k-100k+ ha), alta mecanização.",
            challenges: "Logística de escoamento (BR-163), armazenagem, distância dos portos.",
            erp_rivals: &["TOTVS Agro", "SAP Rural", "Datacoper", "Siagri"],
        },
    ),
    (
        "GO",
        RegionProfile {
            name: "Goiás",
            profile: "Forte em grãos, cana e pecuária. Muitas usinas sucroenergéticas.",
            challenges: "Diversificação de culturas, irrigação por pivô, gestão de usinas.",
            erp_rivals: &["TOTVS", "Siagri", "Datacoper"],
        },
    ),
    (
        "SP",
        RegionProfile {
            name: "São Paulo",
            profile: "Capital do sucroenergético. Também forte em HF, citricultura e café.",
            challenges: "Custo de terra alto, pressão urbana, compliance ambiental rigoroso.",
            erp_rivals: &["SAP", "TOTVS", "Oracle"],
        },
    ),
    (
        "PR",
        RegionProfile {
            name: "Paraná",
            profile: "Diversificado: grãos, frango, suínos, cooperativas fortes.",
            challenges: "Integração cooperativa-cooperado, gestão multisite, logística portuária.",
            erp_rivals: &["TOTVS"],
        },
    ),
    (
        "MS",
        RegionProfile {
            name: "Mato Grosso do Sul",
            profile: "Pecuária forte, grãos e celulose. Crescimento rápido.",
            challenges: "Fronteira agrícola em expansão, pecuária e lavoura integradas.",
            erp_rivals: &["TOTVS", "Siagri"],
        },
    ),
    (
        "BA",
        RegionProfile {
            name: "Bahia (Oeste)",
            profile: "Polo MATOPIBA: soja, algodão e milho irrigado em larga escala.",
            challenges: "Logística para portos do Nordeste, irrigação, expansão de área.",
            erp_rivals: &["TOTVS Agro", "Siagri"],
        },
    ),
];

/// Resolve a regional profile from a UF code.
pub fn region_for_uf(uf: &str) -> Option<&'static RegionProfile> {
    let uf = uf.trim().to_uppercase();
    REGIONS.iter().find(|(code, _)| *code == uf).map(|(_, p)| p)
}

/// Build the enrichment block appended to collection prompts.
/// Empty inputs yield an empty string rather than a generic filler.
pub fn prompt_context(cnae: &str, uf: &str) -> String {
    let mut parts = Vec::new();

    if !cnae.is_empty() {
        let sector = sector_for_cnae(cnae);
        parts.push(format!(
            "SETOR ({}): dores típicas: {}.",
            sector.sector,
            sector.pains.join("; ")
        ));
    }

    if let Some(region) = region_for_uf(uf) {
        parts.push(format!(
            "REGIÃO ({}): {} Desafios: {} ERPs concorrentes comuns: {}.",
            region.name,
            region.profile,
            region.challenges,
            region.erp_rivals.join(", ")
        ));
    }

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cnae_prefix_resolution() {
        assert_eq!(sector_for_cnae("0113-1/00").sector, SUGARCANE.sector);
        assert_eq!(sector_for_cnae("0111").sector, GRAIN.sector);
        assert_eq!(sector_for_cnae("9999").sector, GENERIC_AGRO.sector);
        assert_eq!(sector_for_cnae("").sector, GENERIC_AGRO.sector);
    }

    #[test]
    fn test_region_lookup() {
        assert!(region_for_uf("mt").is_some());
        assert!(region_for_uf("MT").is_some());
        assert!(region_for_uf("XX").is_none());
    }

    #[test]
    fn test_prompt_context_is_empty_for_unknown_target() {
        assert!(prompt_context("", "").is_empty());
        let ctx = prompt_context("0113", "SP");
        assert!(ctx.contains("Sucroenergético"));
        assert!(ctx.contains("São Paulo"));
    }
}
