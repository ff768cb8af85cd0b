//! Agroscout - agribusiness prospecting dossiers
//!
//! Investigates a target company/economic group through the public company
//! registry (CNPJ) and LLM search agents, then aggregates the findings into
//! a scored dossier: a deterministic four-pillar account score, a narrative
//! briefing, and a quality report.
//!
//! The hard core is the request-governed execution layer and the scoring
//! engine: a token-bucket call gate serializing every outbound API call, a
//! two-tier (memory + persistent) response cache, and a pure scoring
//! function with heuristic gap-filling.

pub mod agents;
pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod limiter;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod quality;
pub mod registry;
pub mod reporters;
pub mod scoring;
