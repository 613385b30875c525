use super::types::Candidate;

/// Read-only source of candidates. Assumed static for one recommendation call;
/// refresh cadence belongs to the implementor.
pub trait CatalogProvider: Send + Sync {
    fn list_candidates(&self) -> Vec<Candidate>;
}

/// Fixed in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    candidates: Vec<Candidate>,
}

impl StaticCatalog {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl CatalogProvider for StaticCatalog {
    fn list_candidates(&self) -> Vec<Candidate> {
        self.candidates.clone()
    }
}

/// Lowest and highest price in the catalog, used to ground model prompts.
pub fn price_range(candidates: &[Candidate]) -> Option<(f64, f64)> {
    candidates.iter().fold(None, |acc, c| match acc {
        None => Some((c.price, c.price)),
        Some((lo, hi)) => Some((lo.min(c.price), hi.max(c.price))),
    })
}
