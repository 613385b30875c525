use serde::{Deserialize, Serialize};
use std::fmt;

/// The six fixed preference dimensions, in vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Performance,
    Camera,
    Battery,
    Portability,
    /// Price sensitivity. Candidate score is value for money: cheaper scores higher.
    Price,
    Appearance,
}

pub const DIMENSION_COUNT: usize = 6;

impl Dimension {
    pub const ALL: [Dimension; DIMENSION_COUNT] = [
        Dimension::Performance,
        Dimension::Camera,
        Dimension::Battery,
        Dimension::Portability,
        Dimension::Price,
        Dimension::Appearance,
    ];

    pub fn index(self) -> usize {
        match self {
            Dimension::Performance => 0,
            Dimension::Camera => 1,
            Dimension::Battery => 2,
            Dimension::Portability => 3,
            Dimension::Price => 4,
            Dimension::Appearance => 5,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Dimension::Performance => "performance",
            Dimension::Camera => "camera",
            Dimension::Battery => "battery",
            Dimension::Portability => "portability",
            Dimension::Price => "price",
            Dimension::Appearance => "appearance",
        }
    }

    /// Human label used in reasons and prompts.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Performance => "performance",
            Dimension::Camera => "camera",
            Dimension::Battery => "battery life",
            Dimension::Portability => "portability",
            Dimension::Price => "value for money",
            Dimension::Appearance => "design",
        }
    }

    pub fn from_key(key: &str) -> Option<Dimension> {
        let key = key.trim().to_ascii_lowercase();
        Dimension::ALL.into_iter().find(|d| d.key() == key).or(match key.as_str() {
            "price_sensitivity" | "value" | "budget" => Some(Dimension::Price),
            "design" | "aesthetics" | "looks" => Some(Dimension::Appearance),
            "endurance" => Some(Dimension::Battery),
            "photography" | "photo" => Some(Dimension::Camera),
            "gaming" | "speed" => Some(Dimension::Performance),
            "weight" | "size" => Some(Dimension::Portability),
            _ => None,
        })
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One value per dimension, indexed by `Dimension::index`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionScores(pub [f64; DIMENSION_COUNT]);

impl DimensionScores {
    pub fn new(values: [f64; DIMENSION_COUNT]) -> Self {
        Self(values)
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        self.0[dimension.index()]
    }

    pub fn set(&mut self, dimension: Dimension, value: f64) {
        self.0[dimension.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ALL.into_iter().map(move |d| (d, self.get(d)))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Raw hardware facts, kept for comparison prose only. Never used in scoring.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceSpecs {
    pub cpu: String,
    pub ram_gb: u32,
    pub storage_gb: u32,
    pub screen_inch: f64,
    pub camera_mp: u32,
    pub battery_mah: u32,
    pub weight_g: u32,
}

/// One catalog device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub price: f64,
    /// Normalized per-dimension scores, each in [0, 1].
    pub scores: DimensionScores,
    /// Sales volume. Tie-breaker only.
    pub popularity: u64,
    /// Average review rating, 0-5. Tie-breaker only.
    pub rating: f64,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub specs: Option<DeviceSpecs>,
}
