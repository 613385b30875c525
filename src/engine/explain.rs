use crate::analyzer::keywords::{canonical_brand, canonical_feature};
use crate::analyzer::{DemandProfile, DimensionWeights, PreferenceTag};
use crate::catalog::{Candidate, Dimension, DimensionScores};

pub const MAX_REASONS: usize = 3;

fn grade(score: f64) -> &'static str {
    if score >= 0.8 {
        "excellent"
    } else if score >= 0.6 {
        "good"
    } else {
        "decent"
    }
}

/// Top dimensions by contribution `w_d * c_d`, ties in dimension order.
pub fn reasons(weights: &DimensionWeights, scores: &DimensionScores) -> Vec<String> {
    let mut contributions: Vec<(Dimension, f64)> = Dimension::ALL
        .into_iter()
        .map(|d| (d, weights.get(d) * scores.get(d)))
        .collect();
    contributions.sort_by(|a, b| b.1.total_cmp(&a.1));

    contributions
        .into_iter()
        .take(MAX_REASONS)
        .map(|(d, _)| {
            let score = scores.get(d);
            format!("{} {} ({:.2})", grade(score), d.label(), score)
        })
        .collect()
}

/// Liked brands and requested features the candidate actually has.
pub fn preference_reasons(profile: &DemandProfile, candidate: &Candidate) -> Vec<String> {
    let brand = canonical_brand(&candidate.brand);
    let features: Vec<String> = candidate.highlights.iter().filter_map(|h| canonical_feature(h)).collect();

    profile
        .preferences
        .iter()
        .filter_map(|tag| match tag {
            PreferenceTag::LikesBrand(b) if brand.as_deref() == Some(b.as_str()) => {
                Some(format!("{}, a brand you like", candidate.brand))
            }
            PreferenceTag::Feature(f) if features.contains(f) => Some(format!("has {}", f.replace('_', " "))),
            _ => None,
        })
        .collect()
}

/// The strongest dimension, then matched preferences, then further dimensions.
pub fn explain(profile: &DemandProfile, candidate: &Candidate) -> Vec<String> {
    let mut dimensions = reasons(&profile.dimension_weights, &candidate.scores).into_iter();
    let mut out: Vec<String> = dimensions.next().into_iter().collect();
    out.extend(preference_reasons(profile, candidate));
    out.extend(dimensions);
    out.truncate(MAX_REASONS);
    out
}
