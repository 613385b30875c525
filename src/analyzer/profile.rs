use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::catalog::{Dimension, DIMENSION_COUNT};

pub const DEFAULT_WEIGHT_FLOOR: f64 = 0.02;

/// A value together with the confidence of the extraction that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tracked<T> {
    pub value: T,
    pub confidence: f64,
}

impl<T> Tracked<T> {
    pub fn new(value: T, confidence: f64) -> Self {
        Self { value, confidence: confidence.clamp(0.0, 1.0) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    Strict,
    Flexible,
    Unconstrained,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub strictness: Strictness,
}

impl Budget {
    pub fn between(min: f64, max: f64, strictness: Strictness) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self { min: Some(min), max: Some(max), strictness }
    }

    pub fn at_most(max: f64) -> Self {
        Self { min: None, max: Some(max), strictness: Strictness::Strict }
    }

    pub fn at_least(min: f64) -> Self {
        Self { min: Some(min), max: None, strictness: Strictness::Strict }
    }

    /// Flexible band of +/- `band` around `target`.
    pub fn around(target: f64, band: f64) -> Self {
        Self {
            min: Some((target * (1.0 - band)).round()),
            max: Some((target * (1.0 + band)).round()),
            strictness: Strictness::Flexible,
        }
    }

    pub fn unconstrained() -> Self {
        Self { min: None, max: None, strictness: Strictness::Unconstrained }
    }

    pub fn contains(&self, price: f64) -> bool {
        self.min.map_or(true, |min| price >= min) && self.max.map_or(true, |max| price <= max)
    }

    /// Distance outside the band relative to the violated bound. Zero inside.
    pub fn relative_distance(&self, price: f64) -> f64 {
        if let Some(min) = self.min {
            if price < min && min > 0.0 {
                return (min - price) / min;
            }
        }
        if let Some(max) = self.max {
            if price > max && max > 0.0 {
                return (price - max) / max;
            }
        }
        0.0
    }

    pub fn describe(&self) -> String {
        match (self.strictness, self.min, self.max) {
            (Strictness::Unconstrained, _, _) => "no fixed budget".to_string(),
            (_, Some(min), Some(max)) => format!("¥{:.0}-¥{:.0}", min, max),
            (_, None, Some(max)) => format!("under ¥{:.0}", max),
            (_, Some(min), None) => format!("above ¥{:.0}", min),
            (_, None, None) => "an open budget".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PreferenceTag {
    LikesBrand(String),
    AvoidsBrand(String),
    Feature(String),
}

impl PreferenceTag {
    /// The brand tag with the opposite polarity. Features have none and map to themselves.
    pub fn opposite(&self) -> PreferenceTag {
        match self {
            PreferenceTag::LikesBrand(b) => PreferenceTag::AvoidsBrand(b.clone()),
            PreferenceTag::AvoidsBrand(b) => PreferenceTag::LikesBrand(b.clone()),
            PreferenceTag::Feature(f) => PreferenceTag::Feature(f.clone()),
        }
    }
}

/// Normalized dimension weights. Strictly positive, summing to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionWeights(pub [f64; DIMENSION_COUNT]);

impl Default for DimensionWeights {
    fn default() -> Self {
        Self([1.0 / DIMENSION_COUNT as f64; DIMENSION_COUNT])
    }
}

impl DimensionWeights {
    pub fn get(&self, dimension: Dimension) -> f64 {
        self.0[dimension.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ALL.into_iter().map(move |d| (d, self.get(d)))
    }

    pub fn max(&self) -> f64 {
        self.0.iter().copied().fold(0.0, f64::max)
    }

    /// Raw signals to weights: signalled dimensions share `1 - floor * unset`
    /// in proportion to their signal, unset dimensions get `floor`.
    pub fn from_signals(signals: &[Option<Tracked<f64>>; DIMENSION_COUNT], floor: f64) -> Self {
        let total: f64 = signals.iter().flatten().map(|s| s.value.max(0.0)).sum();
        if total <= 0.0 {
            return Self::default();
        }

        let unset = signals
            .iter()
            .filter(|s| s.map_or(true, |s| s.value <= 0.0))
            .count();
        let share = 1.0 - floor * unset as f64;

        let mut weights = [0.0; DIMENSION_COUNT];
        for (i, signal) in signals.iter().enumerate() {
            weights[i] = match signal {
                Some(s) if s.value > 0.0 => share * s.value / total,
                _ => floor,
            };
        }
        Self(weights)
    }
}

/// Accumulated understanding of one user's needs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DemandProfile {
    pub budget: Option<Tracked<Budget>>,
    /// Raw weight signal per dimension, indexed by `Dimension::index`.
    pub signals: [Option<Tracked<f64>>; DIMENSION_COUNT],
    /// Derived from `signals` by `refresh`.
    pub dimension_weights: DimensionWeights,
    pub preferences: BTreeSet<PreferenceTag>,
    /// Derived completeness/certainty estimate in [0, 1].
    pub confidence: f64,
}

impl DemandProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self, dimension: Dimension) -> Option<Tracked<f64>> {
        self.signals[dimension.index()]
    }

    pub fn set_signal(&mut self, dimension: Dimension, value: f64, confidence: f64) {
        self.signals[dimension.index()] = Some(Tracked::new(value, confidence));
    }

    pub fn set_budget(&mut self, budget: Budget, confidence: f64) {
        self.budget = Some(Tracked::new(budget, confidence));
    }

    pub fn budget_value(&self) -> Option<&Budget> {
        self.budget.as_ref().map(|b| &b.value)
    }

    pub fn signalled_dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        Dimension::ALL
            .into_iter()
            .filter(move |d| self.signal(*d).map_or(false, |s| s.value > 0.0))
    }

    /// Per-dimension certainty: the confidence behind its signal, 0 when unset.
    pub fn certainty(&self, dimension: Dimension) -> f64 {
        self.signal(dimension).map_or(0.0, |s| s.confidence)
    }

    pub fn avoided_brands(&self) -> impl Iterator<Item = &str> {
        self.preferences.iter().filter_map(|p| match p {
            PreferenceTag::AvoidsBrand(b) => Some(b.as_str()),
            _ => None,
        })
    }

    pub fn is_blank(&self) -> bool {
        self.budget.is_none() && self.signalled_dimensions().next().is_none() && self.preferences.is_empty()
    }

    /// True when `other` carries requirement information this profile lacks or disagrees on.
    pub fn differs_in_requirements(&self, other: &DemandProfile) -> bool {
        self.budget.map(|b| b.value) != other.budget.map(|b| b.value)
            || self.signals.iter().map(|s| s.map(|s| s.value)).ne(other.signals.iter().map(|s| s.map(|s| s.value)))
            || self.preferences != other.preferences
    }

    pub fn refreshed(mut self, floor: f64) -> Self {
        self.refresh(floor);
        self
    }

    /// Recomputes the derived fields (`dimension_weights`, `confidence`).
    pub fn refresh(&mut self, floor: f64) {
        self.dimension_weights = DimensionWeights::from_signals(&self.signals, floor);
        self.confidence = self.compute_confidence();
    }

    fn compute_confidence(&self) -> f64 {
        let signalled: Vec<f64> = self
            .signals
            .iter()
            .flatten()
            .filter(|s| s.value > 0.0)
            .map(|s| s.confidence)
            .collect();

        let budget_known = if self.budget.is_some() { 1.0 } else { 0.0 };
        let coverage = (signalled.len() as f64 / 2.0).min(1.0);
        let completeness = 0.5 * budget_known + 0.5 * coverage;

        let mut field_confidences = signalled;
        if let Some(b) = &self.budget {
            field_confidences.push(b.confidence);
        }
        let certainty = if field_confidences.is_empty() {
            0.0
        } else {
            field_confidences.iter().sum::<f64>() / field_confidences.len() as f64
        };

        (completeness * (0.5 + 0.5 * certainty)).clamp(0.0, 1.0)
    }
}

fn pick<T: Copy>(prior: Option<Tracked<T>>, incoming: Option<Tracked<T>>) -> Option<Tracked<T>> {
    match (prior, incoming) {
        (None, incoming) => incoming,
        (prior, None) => prior,
        (Some(p), Some(i)) => {
            if i.confidence >= p.confidence {
                Some(i)
            } else {
                Some(p)
            }
        }
    }
}

/// Signals for one dimension accumulate: equal confidence keeps the stronger value,
/// only a strictly more confident extraction replaces it.
fn pick_signal(prior: Option<Tracked<f64>>, incoming: Option<Tracked<f64>>) -> Option<Tracked<f64>> {
    match (prior, incoming) {
        (Some(p), Some(i)) if i.confidence == p.confidence => Some(Tracked::new(p.value.max(i.value), p.confidence)),
        (Some(p), Some(i)) if i.confidence > p.confidence => Some(i),
        (Some(p), Some(_)) => Some(p),
        (prior, incoming) => prior.or(incoming),
    }
}

/// Monotonic merge. Unset never clears. The budget moves to the incoming value
/// when it is at least as confident; signals follow `pick_signal`.
pub fn merge(prior: &DemandProfile, incoming: &DemandProfile, floor: f64) -> DemandProfile {
    let mut signals = prior.signals;
    for (slot, new) in signals.iter_mut().zip(incoming.signals.iter()) {
        *slot = pick_signal(*slot, *new);
    }

    let mut preferences = prior.preferences.clone();
    for tag in &incoming.preferences {
        preferences.remove(&tag.opposite());
        preferences.insert(tag.clone());
    }

    DemandProfile {
        budget: pick(prior.budget, incoming.budget),
        signals,
        dimension_weights: DimensionWeights::default(),
        preferences,
        confidence: 0.0,
    }
    .refreshed(floor)
}
