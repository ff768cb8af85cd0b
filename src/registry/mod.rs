//! Public company-registry lookup (CNPJ)
//!
//! BrasilAPI is the primary provider, ReceitaWS the fallback. Transient
//! network failures are retried with exponential backoff at this boundary
//! only; a definitive not-found answer is never retried. Lookups are cached
//! for 24h through the shared two-tier cache.

use crate::cache::TieredCache;
use crate::limiter::{CallGate, GateError, Priority};
use crate::models::{RegistryRecord, Shareholder};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const BRASILAPI_URL: &str = "https://brasilapi.com.br/api/cnpj/v1";
const RECEITAWS_URL: &str = "https://receitaws.com.br/v1/cnpj";
const LOOKUP_CACHE_NS: &str = "registry";
const LOOKUP_CACHE_TTL: Duration = Duration::from_secs(86_400);

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("invalid CNPJ: {0}")]
    InvalidCnpj(String),

    #[error("CNPJ {0} not found in the registry")]
    NotFound(String),

    #[error("registry request failed: {0}")]
    Transport(String),

    #[error("registry error: HTTP {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("failed to parse registry response: {0}")]
    ParseError(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

// ==================== CNPJ helpers ====================

fn non_digit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\D").expect("static regex"))
}

/// Strip formatting, keeping digits only.
pub fn strip_cnpj(cnpj: &str) -> String {
    non_digit_re().replace_all(cnpj.trim(), "").to_string()
}

/// Format as XX.XXX.XXX/XXXX-XX when the input has 14 digits.
pub fn format_cnpj(cnpj: &str) -> String {
    let digits = strip_cnpj(cnpj);
    if digits.len() == 14 {
        format!(
            "{}.{}.{}/{}-{}",
            &digits[..2],
            &digits[2..5],
            &digits[5..8],
            &digits[8..12],
            &digits[12..]
        )
    } else {
        digits
    }
}

/// Basic validity: 14 digits, not all the same digit.
pub fn is_valid_cnpj(cnpj: &str) -> bool {
    let digits = strip_cnpj(cnpj);
    if digits.len() != 14 {
        return false;
    }
    let first = digits.as_bytes()[0];
    !digits.bytes().all(|b| b == first)
}

/// Scrape the first CNPJ-shaped token out of free text.
pub fn find_cnpj_in_text(text: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"\d{2}\.?\d{3}\.?\d{3}/?\d{4}-?\d{2}").expect("static regex")
    });
    re.find(text).map(|m| strip_cnpj(m.as_str()))
}

// ==================== provider response types ====================

#[derive(Deserialize)]
struct BrasilApiShareholder {
    #[serde(default)]
    nome_socio: String,
    #[serde(default)]
    qualificacao_socio: String,
    #[serde(default)]
    data_entrada_sociedade: String,
    #[serde(default)]
    cnpj_cpf_do_socio: String,
    #[serde(default)]
    faixa_etaria: String,
}

#[derive(Deserialize)]
struct BrasilApiCnae {
    #[serde(default)]
    codigo: Option<u64>,
    #[serde(default)]
    descricao: String,
}

#[derive(Deserialize)]
struct BrasilApiResponse {
    #[serde(default)]
    cnpj: String,
    #[serde(default)]
    razao_social: String,
    #[serde(default)]
    nome_fantasia: String,
    #[serde(default)]
    descricao_situacao_cadastral: String,
    #[serde(default)]
    data_inicio_atividade: String,
    #[serde(default)]
    descricao_natureza_juridica: String,
    #[serde(default)]
    capital_social: f64,
    #[serde(default)]
    descricao_porte: String,
    #[serde(default)]
    cnae_fiscal: Option<u64>,
    #[serde(default)]
    cnae_fiscal_descricao: String,
    #[serde(default)]
    cnaes_secundarios: Vec<BrasilApiCnae>,
    #[serde(default)]
    municipio: String,
    #[serde(default)]
    uf: String,
    #[serde(default)]
    ddd_telefone_1: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    qsa: Vec<BrasilApiShareholder>,
}

#[derive(Deserialize)]
struct ReceitaWsActivity {
    #[serde(default)]
    code: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ReceitaWsResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    nome: String,
    #[serde(default)]
    fantasia: String,
    #[serde(default)]
    situacao: String,
    #[serde(default)]
    abertura: String,
    #[serde(default)]
    natureza_juridica: String,
    #[serde(default)]
    capital_social: String,
    #[serde(default)]
    atividade_principal: Vec<ReceitaWsActivity>,
    #[serde(default)]
    municipio: String,
    #[serde(default)]
    uf: String,
}

// ==================== client ====================

/// Sync registry client with retry, backoff and provider fallback.
pub struct RegistryClient {
    agent: ureq::Agent,
    brasilapi_url: String,
    receitaws_url: String,
    /// Base backoff; doubled per attempt.
    backoff: Duration,
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryClient {
    pub fn new() -> Self {
        let agent = ureq::config::Config::builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(15)))
            .build()
            .new_agent();
        Self {
            agent,
            brasilapi_url: BRASILAPI_URL.to_string(),
            receitaws_url: RECEITAWS_URL.to_string(),
            backoff: Duration::from_secs(2),
        }
    }

    /// Override provider endpoints (tests point these at a local stub).
    pub fn with_endpoints(mut self, brasilapi: impl Into<String>, receitaws: impl Into<String>) -> Self {
        self.brasilapi_url = brasilapi.into();
        self.receitaws_url = receitaws.into();
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Look up a CNPJ: BrasilAPI first, ReceitaWS on transient failure.
    /// NotFound from the primary is definitive and not retried anywhere.
    pub fn lookup(&self, cnpj: &str) -> RegistryResult<RegistryRecord> {
        let digits = strip_cnpj(cnpj);
        if !is_valid_cnpj(&digits) {
            return Err(RegistryError::InvalidCnpj(cnpj.to_string()));
        }

        match self.fetch_brasilapi(&digits) {
            Ok(record) => Ok(record),
            Err(RegistryError::NotFound(c)) => Err(RegistryError::NotFound(c)),
            Err(e) => {
                warn!("BrasilAPI lookup failed ({e}); falling back to ReceitaWS");
                self.fetch_receitaws(&digits)
            }
        }
    }

    /// Cache-wrapped, rate-gated lookup (24h TTL). The network call passes
    /// through the shared gate like every other external call; a cache hit
    /// spends no token. Errors are not cached.
    pub fn lookup_cached(
        &self,
        cache: &TieredCache,
        gate: &CallGate,
        gate_timeout: Duration,
        cnpj: &str,
    ) -> RegistryResult<RegistryRecord> {
        let digits = strip_cnpj(cnpj);
        let params = json!({ "cnpj": digits });

        if let Some(record) = cache.get_as::<RegistryRecord>(LOOKUP_CACHE_NS, &params) {
            debug!("registry cache hit for {digits}");
            return Ok(record);
        }

        let record = gate
            .execute(Priority::High, gate_timeout, || self.lookup(&digits))
            .map_err(|e| match e {
                GateError::AcquireTimeout { timeout } => RegistryError::Transport(format!(
                    "rate limit: no token within {timeout:?}"
                )),
                GateError::Action(inner) => inner,
            })?;

        if let Ok(value) = serde_json::to_value(&record) {
            cache.set(LOOKUP_CACHE_NS, &params, value, Some(LOOKUP_CACHE_TTL));
        }
        Ok(record)
    }

    fn fetch_brasilapi(&self, digits: &str) -> RegistryResult<RegistryRecord> {
        let url = format!("{}/{}", self.brasilapi_url, digits);
        let raw = self.get_with_retry(&url, 3, digits)?;
        let parsed: BrasilApiResponse =
            serde_json::from_str(&raw).map_err(|e| RegistryError::ParseError(e.to_string()))?;
        Ok(Self::from_brasilapi(parsed))
    }

    fn fetch_receitaws(&self, digits: &str) -> RegistryResult<RegistryRecord> {
        let url = format!("{}/{}", self.receitaws_url, digits);
        let raw = self.get_with_retry(&url, 2, digits)?;
        let parsed: ReceitaWsResponse =
            serde_json::from_str(&raw).map_err(|e| RegistryError::ParseError(e.to_string()))?;

        // ReceitaWS reports not-found as a 200 with status=ERROR.
        if parsed.status.eq_ignore_ascii_case("error") {
            if parsed.message.to_lowercase().contains("não encontrado") {
                return Err(RegistryError::NotFound(digits.to_string()));
            }
            return Err(RegistryError::ApiError {
                status: 200,
                message: parsed.message,
            });
        }

        Ok(Self::from_receitaws(digits, parsed))
    }

    /// GET with bounded retries. 404 is definitive; 429 sleeps before the
    /// next attempt; other failures back off exponentially.
    fn get_with_retry(&self, url: &str, attempts: u32, digits: &str) -> RegistryResult<String> {
        let mut last_err = RegistryError::Transport("no attempt made".to_string());

        for attempt in 0..attempts {
            if attempt > 0 {
                let wait = self.backoff * 2u32.pow(attempt - 1);
                debug!("registry retry {attempt} for {digits} after {wait:?}");
                std::thread::sleep(wait);
            }

            let response = match self
                .agent
                .get(url)
                .header("Accept", "application/json")
                .call()
            {
                Ok(r) => r,
                Err(e) => {
                    last_err = RegistryError::Transport(e.to_string());
                    continue;
                }
            };

            let status = response.status().as_u16();
            match status {
                200 => {
                    return response
                        .into_body()
                        .read_to_string()
                        .map_err(|e| RegistryError::ParseError(e.to_string()));
                }
                404 => return Err(RegistryError::NotFound(digits.to_string())),
                429 => {
                    // Provider-side rate limit: wait out the window, then retry.
                    std::thread::sleep(Duration::from_secs(5));
                    last_err = RegistryError::ApiError {
                        status,
                        message: "rate limited".to_string(),
                    };
                }
                _ => {
                    let message = response.into_body().read_to_string().unwrap_or_default();
                    last_err = RegistryError::ApiError { status, message };
                }
            }
        }

        Err(last_err)
    }

    fn from_brasilapi(raw: BrasilApiResponse) -> RegistryRecord {
        let shareholders = raw
            .qsa
            .into_iter()
            .map(|s| Shareholder {
                name: s.nome_socio,
                role: s.qualificacao_socio,
                joined: s.data_entrada_sociedade,
                document: s.cnpj_cpf_do_socio,
                age_bracket: s.faixa_etaria,
            })
            .collect();

        let secondary_cnaes = raw
            .cnaes_secundarios
            .into_iter()
            .filter_map(|c| c.codigo.map(|code| format!("{} - {}", code, c.descricao)))
            .collect();

        RegistryRecord {
            cnpj: raw.cnpj,
            legal_name: raw.razao_social,
            trade_name: raw.nome_fantasia,
            registration_status: raw.descricao_situacao_cadastral,
            opened: raw.data_inicio_atividade,
            legal_nature: raw.descricao_natureza_juridica,
            capital: raw.capital_social,
            company_size: raw.descricao_porte,
            main_cnae: raw.cnae_fiscal.map(|c| c.to_string()).unwrap_or_default(),
            cnae_description: raw.cnae_fiscal_descricao,
            secondary_cnaes,
            municipality: raw.municipio,
            state: raw.uf,
            phone: raw.ddd_telefone_1,
            email: raw.email.unwrap_or_default(),
            shareholders,
            source: "brasilapi".to_string(),
            fetched_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn from_receitaws(digits: &str, raw: ReceitaWsResponse) -> RegistryRecord {
        // ReceitaWS formats capital as "1.234.567,89".
        let capital = raw
            .capital_social
            .replace('.', "")
            .replace(',', ".")
            .parse::<f64>()
            .unwrap_or(0.0);

        let (main_cnae, cnae_description) = raw
            .atividade_principal
            .into_iter()
            .next()
            .map(|a| (a.code, a.text))
            .unwrap_or_default();

        RegistryRecord {
            cnpj: digits.to_string(),
            legal_name: raw.nome,
            trade_name: raw.fantasia,
            registration_status: raw.situacao,
            opened: raw.abertura,
            legal_nature: raw.natureza_juridica,
            capital,
            main_cnae,
            cnae_description,
            municipality: raw.municipio,
            state: raw.uf,
            source: "receitaws".to_string(),
            fetched_at: chrono::Utc::now().to_rfc3339(),
            ..Default::default()
        }
    }
}
