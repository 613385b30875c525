//! Similarity between a demand profile's weights and a candidate's scores.
//!
//! The ideal candidate scores `w_d / max(w)` on every dimension, so the most
//! wanted dimension must be perfect and the rest proportionally good. Only
//! shortfalls below the ideal count as distance: exceeding it is never a fault.

use crate::analyzer::DimensionWeights;
use crate::catalog::{DimensionScores, DIMENSION_COUNT};

pub fn ideal_vector(weights: &DimensionWeights) -> [f64; DIMENSION_COUNT] {
    let max = weights.max();
    let mut ideal = [0.0; DIMENSION_COUNT];
    if max > 0.0 {
        for (slot, w) in ideal.iter_mut().zip(weights.0.iter()) {
            *slot = w / max;
        }
    }
    ideal
}

/// `sqrt(sum w_d * max(0, ideal_d - c_d)^2)`.
pub fn shortfall_distance(weights: &DimensionWeights, ideal: &[f64; DIMENSION_COUNT], scores: &DimensionScores) -> f64 {
    weights
        .0
        .iter()
        .zip(ideal.iter())
        .zip(scores.0.iter())
        .map(|((w, i), c)| w * (i - c).max(0.0).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Cosine similarity. Zero when either vector is zero.
pub fn cosine(weights: &DimensionWeights, scores: &DimensionScores) -> f64 {
    let dot: f64 = weights.0.iter().zip(scores.0.iter()).map(|(w, c)| w * c).sum();
    let norm_w = weights.0.iter().map(|w| w * w).sum::<f64>().sqrt();
    let norm_c = scores.0.iter().map(|c| c * c).sum::<f64>().sqrt();
    if norm_w == 0.0 || norm_c == 0.0 {
        return 0.0;
    }
    dot / (norm_w * norm_c)
}

/// Blended similarity in [0, 1], before any budget penalty.
pub fn similarity(weights: &DimensionWeights, scores: &DimensionScores, euclidean_blend: f64) -> f64 {
    let ideal = ideal_vector(weights);
    let euclid = 1.0 / (1.0 + shortfall_distance(weights, &ideal, scores));
    let blended = euclidean_blend * euclid + (1.0 - euclidean_blend) * cosine(weights, scores);
    blended.clamp(0.0, 1.0)
}
