//! Deterministic account scoring
//!
//! Maps a merged [`crate::models::FactSet`] to a four-pillar score with
//! human-readable justifications. Missing facts are filled by market
//! heuristics before the pillar lookups run; imputation is a pure
//! transformation and never overwrites observed values.

mod engine;
mod impute;
mod tables;

pub use engine::score;
pub use impute::impute;
pub use tables::{COMPLEXITY_MAX, MOMENTUM_MAX, MUSCLE_MAX, PEOPLE_MAX};
