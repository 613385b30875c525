use crate::analyzer::keywords::canonical_brand;
use crate::analyzer::{DemandProfile, Strictness};
use crate::catalog::Candidate;

/// A candidate that passed the hard constraints, with its soft budget multiplier.
#[derive(Debug, Clone, Copy)]
pub struct Survivor<'a> {
    pub candidate: &'a Candidate,
    /// In [0, 1]; 1 inside the budget band.
    pub penalty: f64,
}

/// Multiplier for a price outside a flexible band. Monotonically non-increasing in distance.
pub fn flexible_penalty(relative_distance: f64, slope: f64) -> f64 {
    1.0 - (slope * relative_distance.max(0.0)).min(1.0)
}

fn avoided(profile: &DemandProfile, candidate: &Candidate) -> bool {
    let Some(brand) = canonical_brand(&candidate.brand) else {
        return false;
    };
    profile.avoided_brands().any(|a| a == brand)
}

pub fn filter_candidates<'a>(profile: &DemandProfile, candidates: &'a [Candidate], slope: f64) -> Vec<Survivor<'a>> {
    candidates
        .iter()
        .filter(|c| !avoided(profile, c))
        .filter_map(|candidate| {
            let penalty = match profile.budget_value() {
                None => 1.0,
                Some(budget) => match budget.strictness {
                    Strictness::Unconstrained => 1.0,
                    Strictness::Strict if budget.contains(candidate.price) => 1.0,
                    Strictness::Strict => return None,
                    Strictness::Flexible => flexible_penalty(budget.relative_distance(candidate.price), slope),
                },
            };
            Some(Survivor { candidate, penalty })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Budget, PreferenceTag};
    use crate::catalog::sample_catalog;

    #[test]
    fn strict_budget_drops_outside() {
        let catalog = sample_catalog();
        let mut profile = DemandProfile::new();
        profile.set_budget(Budget::between(3000.0, 4000.0, Strictness::Strict), 0.6);

        let survivors = filter_candidates(&profile, &catalog, 2.0);
        assert!(!survivors.is_empty());
        assert!(survivors.iter().all(|s| (3000.0..=4000.0).contains(&s.candidate.price)));
    }

    #[test]
    fn flexible_budget_keeps_with_penalty() {
        let catalog = sample_catalog();
        let mut profile = DemandProfile::new();
        profile.set_budget(Budget::around(4000.0, 0.15), 0.6);

        let survivors = filter_candidates(&profile, &catalog, 2.0);
        assert_eq!(survivors.len(), catalog.len());
        let pro = survivors.iter().find(|s| s.candidate.id == "iphone-14-pro").unwrap();
        let x13 = survivors.iter().find(|s| s.candidate.id == "xiaomi-13").unwrap();
        assert!(pro.penalty < x13.penalty);
        assert_eq!(x13.penalty, 1.0);
    }

    #[test]
    fn avoided_brand_is_dropped() {
        let catalog = sample_catalog();
        let mut profile = DemandProfile::new();
        profile.preferences.insert(PreferenceTag::AvoidsBrand("apple".into()));
        let survivors = filter_candidates(&profile, &catalog, 2.0);
        assert!(survivors.iter().all(|s| s.candidate.brand != "Apple"));
        assert_eq!(survivors.len(), catalog.len() - 2);
    }

    #[test]
    fn penalty_is_monotonic() {
        let mut last = 1.0;
        for step in 0..20 {
            let p = flexible_penalty(step as f64 * 0.05, 2.0);
            assert!(p <= last);
            assert!((0.0..=1.0).contains(&p));
            last = p;
        }
    }
}
