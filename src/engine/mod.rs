//! Recommendation engine: filter, score, tie-break, explain.
//!
//! Pure and synchronous. Given the same profile, catalog and config it always
//! returns the same ranking.

pub mod explain;
pub mod filter;
mod rank;
pub mod scorer;

use serde::{Deserialize, Serialize};

pub use rank::recommend;

/// Share of the Euclidean similarity in the blended score; the rest is cosine.
pub const DEFAULT_EUCLIDEAN_BLEND: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate_id: String,
    pub name: String,
    pub brand: String,
    pub price: f64,
    /// Blended similarity in [0, 1].
    pub match_score: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    CatalogEmpty,
    NoSurvivors,
}

impl EmptyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            EmptyReason::CatalogEmpty => "catalog_empty",
            EmptyReason::NoSurvivors => "no_survivors",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Ranked(Vec<ScoredCandidate>),
    Empty(EmptyReason),
}

impl Recommendation {
    pub fn candidates(&self) -> &[ScoredCandidate] {
        match self {
            Recommendation::Ranked(list) => list,
            Recommendation::Empty(_) => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates().is_empty()
    }
}
