use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

use super::explain::explain;
use super::filter::{filter_candidates, Survivor};
use super::scorer::similarity;
use super::{EmptyReason, Recommendation, ScoredCandidate};
use crate::analyzer::{DemandProfile, DimensionWeights};
use crate::catalog::Candidate;
use crate::config::EngineConfig;
use crate::error::EngineError;

fn validate_weights(weights: &DimensionWeights) -> Result<(), EngineError> {
    for (d, w) in weights.iter() {
        if !w.is_finite() || w < 0.0 {
            return Err(EngineError::InvalidWeight { dimension: d.key(), value: w });
        }
    }
    Ok(())
}

fn validate_candidates(candidates: &[Candidate]) -> Result<(), EngineError> {
    let mut seen = HashSet::with_capacity(candidates.len());
    for c in candidates {
        let invalid = |reason: String| EngineError::InvalidCandidate { id: c.id.clone(), reason };
        if let Some((d, v)) = c.scores.iter().find(|(_, v)| !v.is_finite() || !(0.0..=1.0).contains(v)) {
            return Err(invalid(format!("{} score {} is outside [0, 1]", d, v)));
        }
        if !c.price.is_finite() || c.price < 0.0 {
            return Err(invalid(format!("price {} is not a valid amount", c.price)));
        }
        if !c.rating.is_finite() {
            return Err(invalid("rating is not a number".to_string()));
        }
        if !seen.insert(c.id.as_str()) {
            return Err(EngineError::DuplicateCandidate(c.id.clone()));
        }
    }
    Ok(())
}

struct Ranked<'a> {
    candidate: &'a Candidate,
    score: f64,
}

/// Rating desc, popularity desc, id asc.
fn tie_order(a: &Ranked<'_>, b: &Ranked<'_>) -> Ordering {
    b.candidate
        .rating
        .total_cmp(&a.candidate.rating)
        .then_with(|| b.candidate.popularity.cmp(&a.candidate.popularity))
        .then_with(|| a.candidate.id.cmp(&b.candidate.id))
}

/// Score desc, then `tie_order`. Total over ranked entries.
fn rank_order(a: &Ranked<'_>, b: &Ranked<'_>) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| tie_order(a, b))
}

/// Sorts by score, then treats every run within `epsilon` of its leader as one
/// tie group ordered by `tie_order`. Members report the group's lowest score,
/// so the output stays sorted by `match_score`.
fn order_ranked(ranked: &mut [Ranked<'_>], epsilon: f64) {
    ranked.sort_by(rank_order);
    let mut start = 0;
    while start < ranked.len() {
        let leader = ranked[start].score;
        let end = ranked[start..]
            .iter()
            .position(|r| leader - r.score > epsilon)
            .map_or(ranked.len(), |offset| start + offset);
        let group = &mut ranked[start..end];
        let lowest = group.iter().map(|r| r.score).fold(leader, f64::min);
        group.sort_by(tie_order);
        for entry in group.iter_mut() {
            entry.score = lowest;
        }
        start = end;
    }
}

fn score_survivor<'a>(survivor: Survivor<'a>, weights: &DimensionWeights, config: &EngineConfig) -> Ranked<'a> {
    let raw = similarity(weights, &survivor.candidate.scores, config.euclidean_blend) * survivor.penalty;
    Ranked {
        candidate: survivor.candidate,
        score: raw.clamp(0.0, 1.0),
    }
}

/// Ranks `candidates` against `profile`. Returns at most `top_k` entries, never padded.
pub fn recommend(
    profile: &DemandProfile,
    candidates: &[Candidate],
    top_k: usize,
    config: &EngineConfig,
) -> Result<Recommendation, EngineError> {
    if top_k == 0 {
        return Err(EngineError::InvalidTopK);
    }
    let weights = &profile.dimension_weights;
    validate_weights(weights)?;
    validate_candidates(candidates)?;

    if candidates.is_empty() {
        return Ok(Recommendation::Empty(EmptyReason::CatalogEmpty));
    }

    let survivors = filter_candidates(profile, candidates, config.flexible_penalty_slope);
    if survivors.is_empty() {
        debug!(catalog = candidates.len(), "no candidate survived filtering");
        return Ok(Recommendation::Empty(EmptyReason::NoSurvivors));
    }

    let mut ranked: Vec<Ranked<'_>> = survivors
        .into_iter()
        .map(|s| score_survivor(s, weights, config))
        .collect();
    order_ranked(&mut ranked, config.tie_epsilon);
    ranked.truncate(top_k);

    let scored = ranked
        .into_iter()
        .map(|r| ScoredCandidate {
            candidate_id: r.candidate.id.clone(),
            name: r.candidate.name.clone(),
            brand: r.candidate.brand.clone(),
            price: r.candidate.price,
            match_score: r.score,
            reasons: explain(profile, r.candidate),
        })
        .collect::<Vec<_>>();
    debug!(
        returned = scored.len(),
        top = ?scored.first().map(|s| s.candidate_id.as_str()),
        "ranking complete"
    );
    Ok(Recommendation::Ranked(scored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Budget, Strictness, DEFAULT_WEIGHT_FLOOR};
    use crate::catalog::{sample_catalog, Dimension, DimensionScores};

    fn candidate(id: &str, scores: [f64; 6], rating: f64, popularity: u64) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: id.to_uppercase(),
            brand: "Acme".to_string(),
            price: 1000.0,
            scores: DimensionScores::new(scores),
            popularity,
            rating,
            highlights: Vec::new(),
            specs: None,
        }
    }

    fn camera_profile() -> DemandProfile {
        let mut profile = DemandProfile::new();
        profile.set_signal(Dimension::Camera, 3.0, 0.6);
        profile.refreshed(DEFAULT_WEIGHT_FLOOR)
    }

    #[test]
    fn zero_top_k_is_an_error() {
        let result = recommend(&DemandProfile::new(), &sample_catalog(), 0, &EngineConfig::default());
        assert_eq!(result, Err(EngineError::InvalidTopK));
    }

    #[test]
    fn empty_catalog_and_no_survivors_are_distinct() {
        let config = EngineConfig::default();
        assert_eq!(
            recommend(&DemandProfile::new(), &[], 3, &config),
            Ok(Recommendation::Empty(EmptyReason::CatalogEmpty))
        );

        let mut profile = DemandProfile::new();
        profile.set_budget(Budget::at_most(500.0), 0.6);
        assert_eq!(
            recommend(&profile, &sample_catalog(), 3, &config),
            Ok(Recommendation::Empty(EmptyReason::NoSurvivors))
        );
    }

    #[test]
    fn fewer_survivors_than_k_is_not_padded() {
        let mut profile = camera_profile();
        profile.set_budget(Budget::between(2000.0, 2400.0, Strictness::Strict), 0.6);
        let result = recommend(&profile, &sample_catalog(), 3, &EngineConfig::default()).unwrap();
        assert_eq!(result.candidates().len(), 1);
        assert_eq!(result.candidates()[0].candidate_id, "vivo-s17");
    }

    #[test]
    fn ties_break_by_rating_then_popularity_then_id() {
        let scores = [0.5; 6];
        let catalog = vec![
            candidate("c", scores, 4.0, 10),
            candidate("b", scores, 4.5, 5),
            candidate("a", scores, 4.0, 10),
            candidate("d", scores, 4.0, 20),
        ];
        let result = recommend(&DemandProfile::new(), &catalog, 4, &EngineConfig::default()).unwrap();
        let ids: Vec<&str> = result.candidates().iter().map(|c| c.candidate_id.as_str()).collect();
        assert_eq!(ids, ["b", "d", "a", "c"]);
    }

    #[test]
    fn near_equal_scores_tie_across_rounding_edges() {
        let edge = candidate("edge", [0.5; 6], 4.0, 10);
        let below = candidate("below", [0.5; 6], 4.8, 10);
        let behind = candidate("behind", [0.5; 6], 5.0, 99);
        let mut ranked = vec![
            Ranked { candidate: &edge, score: 0.50001 },
            Ranked { candidate: &behind, score: 0.4 },
            Ranked { candidate: &below, score: 0.49999 },
        ];

        order_ranked(&mut ranked, 1e-4);

        let ids: Vec<&str> = ranked.iter().map(|r| r.candidate.id.as_str()).collect();
        assert_eq!(ids, ["below", "edge", "behind"]);
        assert_eq!(ranked[0].score, ranked[1].score);
        assert_eq!(ranked[2].score, 0.4);
    }

    #[test]
    fn tie_groups_are_bounded_by_the_leader() {
        let a = candidate("a", [0.5; 6], 3.0, 1);
        let b = candidate("b", [0.5; 6], 4.0, 1);
        let c = candidate("c", [0.5; 6], 5.0, 1);
        // b is within epsilon of a, c only of b
        let mut ranked = vec![
            Ranked { candidate: &a, score: 0.6 },
            Ranked { candidate: &b, score: 0.59994 },
            Ranked { candidate: &c, score: 0.59988 },
        ];

        order_ranked(&mut ranked, 1e-4);

        let ids: Vec<&str> = ranked.iter().map(|r| r.candidate.id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let config = EngineConfig::default();
        let dup = vec![candidate("x", [0.5; 6], 4.0, 1), candidate("x", [0.5; 6], 4.0, 1)];
        assert_eq!(
            recommend(&DemandProfile::new(), &dup, 3, &config),
            Err(EngineError::DuplicateCandidate("x".into()))
        );

        let bad = vec![candidate("y", [1.5, 0.5, 0.5, 0.5, 0.5, 0.5], 4.0, 1)];
        assert!(matches!(
            recommend(&DemandProfile::new(), &bad, 3, &config),
            Err(EngineError::InvalidCandidate { .. })
        ));

        let mut profile = DemandProfile::new();
        profile.dimension_weights = DimensionWeights([f64::NAN, 0.2, 0.2, 0.2, 0.2, 0.2]);
        assert!(matches!(
            recommend(&profile, &sample_catalog(), 3, &config),
            Err(EngineError::InvalidWeight { dimension: "performance", .. })
        ));
    }

    #[test]
    fn camera_weight_favours_camera_leader() {
        let catalog = vec![
            candidate("shooter", [0.5, 0.95, 0.5, 0.5, 0.5, 0.5], 4.0, 1),
            candidate("racer", [0.95, 0.4, 0.5, 0.5, 0.5, 0.5], 4.9, 100),
        ];
        let result = recommend(&camera_profile(), &catalog, 2, &EngineConfig::default()).unwrap();
        let top = &result.candidates()[0];
        assert_eq!(top.candidate_id, "shooter");
        assert!(top.reasons[0].contains("camera"));
        assert!(result.candidates()[0].match_score > result.candidates()[1].match_score);
    }
}
