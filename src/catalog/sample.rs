use super::types::{Candidate, DeviceSpecs, Dimension, DimensionScores};

/// Raw phone facts before normalization.
#[derive(Debug, Clone)]
pub struct PhoneSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub brand: &'static str,
    pub cpu: &'static str,
    pub ram_gb: u32,
    pub storage_gb: u32,
    pub screen_inch: f64,
    pub camera_mp: u32,
    pub battery_mah: u32,
    pub weight_g: u32,
    pub price: f64,
    /// Sensor and optics quality in [0, 1], beyond the megapixel count.
    pub camera_tier: f64,
    /// Build and finish quality in [0, 1].
    pub design_tier: f64,
    pub highlights: &'static [&'static str],
    pub rating: f64,
    pub sales: u64,
}

// Normalization ranges (min, max) per raw parameter.
const RAM_GB: (f64, f64) = (4.0, 16.0);
const STORAGE_GB: (f64, f64) = (64.0, 1024.0);
const SCREEN_INCH: (f64, f64) = (5.0, 7.0);
const CAMERA_MP: (f64, f64) = (8.0, 200.0);
const BATTERY_MAH: (f64, f64) = (2000.0, 6000.0);
const WEIGHT_G: (f64, f64) = (120.0, 250.0);
const PRICE: (f64, f64) = (1000.0, 15000.0);

const DEFAULT_CPU_SCORE: f64 = 0.7;

fn normalize(value: f64, (min, max): (f64, f64)) -> f64 {
    if max <= min {
        return 0.5;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

fn cpu_score(cpu: &str) -> f64 {
    match cpu {
        "A16" => 0.98,
        "A15" | "Snapdragon 8 Gen2" => 0.95,
        "Dimensity 9200" => 0.93,
        "Snapdragon 8+ Gen1" | "A14" => 0.90,
        "Dimensity 9000" => 0.88,
        "Kirin 9000S" | "Kirin 9000" => 0.87,
        "Snapdragon 8 Gen1" | "A13" => 0.85,
        "Dimensity 8200" => 0.83,
        "Snapdragon 7+ Gen2" => 0.80,
        "Snapdragon 7 Gen1" => 0.75,
        "Snapdragon 778G" => 0.72,
        _ => DEFAULT_CPU_SCORE,
    }
}

impl PhoneSpec {
    fn highlight_bonus(&self, bonuses: &[(&str, f64)]) -> f64 {
        bonuses
            .iter()
            .filter(|(tag, _)| self.highlights.iter().any(|h| h == tag))
            .map(|(_, bonus)| bonus)
            .sum()
    }

    /// Projects raw specs onto the six-dimension score vector.
    pub fn scores(&self) -> DimensionScores {
        let mut scores = DimensionScores::default();

        let performance = cpu_score(self.cpu) * 0.5
            + normalize(self.ram_gb as f64, RAM_GB) * 0.3
            + normalize(self.storage_gb as f64, STORAGE_GB) * 0.2;
        scores.set(Dimension::Performance, performance);

        let camera = normalize(self.camera_mp as f64, CAMERA_MP) * 0.3
            + self.camera_tier * 0.5
            + self.highlight_bonus(&[("photography", 0.15), ("video", 0.1)]);
        scores.set(Dimension::Camera, camera);
        scores.set(Dimension::Battery, normalize(self.battery_mah as f64, BATTERY_MAH));

        // Light is better; mid-sized screens are best.
        let lightness = 1.0 - normalize(self.weight_g as f64, WEIGHT_G);
        let screen_fit = 1.0 - (normalize(self.screen_inch, SCREEN_INCH) - 0.5).abs();
        scores.set(Dimension::Portability, lightness * 0.6 + screen_fit * 0.4);

        scores.set(Dimension::Price, 1.0 - normalize(self.price, PRICE));

        let appearance = self.design_tier * 0.8 + self.highlight_bonus(&[("design", 0.15), ("slim", 0.1)]);
        scores.set(Dimension::Appearance, appearance);

        for d in Dimension::ALL {
            scores.set(d, scores.get(d).clamp(0.0, 1.0));
        }
        scores
    }

    pub fn to_candidate(&self) -> Candidate {
        Candidate {
            id: self.id.to_string(),
            name: self.name.to_string(),
            brand: self.brand.to_string(),
            price: self.price,
            scores: self.scores(),
            popularity: self.sales,
            rating: self.rating,
            highlights: self.highlights.iter().map(|h| h.to_string()).collect(),
            specs: Some(DeviceSpecs {
                cpu: self.cpu.to_string(),
                ram_gb: self.ram_gb,
                storage_gb: self.storage_gb,
                screen_inch: self.screen_inch,
                camera_mp: self.camera_mp,
                battery_mah: self.battery_mah,
                weight_g: self.weight_g,
            }),
        }
    }
}

pub const SAMPLE_PHONES: &[PhoneSpec] = &[
    PhoneSpec { id: "xiaomi-13", name: "Xiaomi 13", brand: "Xiaomi", cpu: "Snapdragon 8 Gen2", ram_gb: 12, storage_gb: 256, screen_inch: 6.36, camera_mp: 50, battery_mah: 4500, weight_g: 189, price: 3999.0, camera_tier: 0.7, design_tier: 0.75, highlights: &["slim", "fast", "fast charging"], rating: 4.7, sales: 12000 },
    PhoneSpec { id: "iphone-14", name: "iPhone 14", brand: "Apple", cpu: "A15", ram_gb: 6, storage_gb: 128, screen_inch: 6.1, camera_mp: 12, battery_mah: 3279, weight_g: 172, price: 5999.0, camera_tier: 0.7, design_tier: 0.85, highlights: &["video", "smooth system", "brand"], rating: 4.8, sales: 20000 },
    PhoneSpec { id: "huawei-p60", name: "Huawei P60", brand: "Huawei", cpu: "Snapdragon 8+ Gen1", ram_gb: 8, storage_gb: 256, screen_inch: 6.67, camera_mp: 48, battery_mah: 4815, weight_g: 197, price: 4999.0, camera_tier: 0.9, design_tier: 0.85, highlights: &["photography", "battery", "fast charging"], rating: 4.6, sales: 15000 },
    PhoneSpec { id: "oppo-find-x6", name: "OPPO Find X6", brand: "OPPO", cpu: "Dimensity 9200", ram_gb: 12, storage_gb: 256, screen_inch: 6.74, camera_mp: 50, battery_mah: 4800, weight_g: 207, price: 4499.0, camera_tier: 0.85, design_tier: 0.75, highlights: &["video", "fast charging", "large screen"], rating: 4.5, sales: 8000 },
    PhoneSpec { id: "vivo-x90", name: "vivo X90", brand: "vivo", cpu: "Dimensity 9200", ram_gb: 8, storage_gb: 128, screen_inch: 6.78, camera_mp: 50, battery_mah: 4810, weight_g: 200, price: 3999.0, camera_tier: 0.85, design_tier: 0.7, highlights: &["photography", "fast charging", "large screen"], rating: 4.4, sales: 10000 },
    PhoneSpec { id: "oneplus-11", name: "OnePlus 11", brand: "OnePlus", cpu: "Snapdragon 8 Gen2", ram_gb: 16, storage_gb: 256, screen_inch: 6.7, camera_mp: 50, battery_mah: 5000, weight_g: 205, price: 3999.0, camera_tier: 0.6, design_tier: 0.6, highlights: &["performance", "fast charging", "large memory"], rating: 4.6, sales: 6000 },
    PhoneSpec { id: "redmi-k60", name: "Redmi K60", brand: "Xiaomi", cpu: "Snapdragon 8+ Gen1", ram_gb: 12, storage_gb: 256, screen_inch: 6.67, camera_mp: 64, battery_mah: 5500, weight_g: 204, price: 2499.0, camera_tier: 0.5, design_tier: 0.5, highlights: &["value", "battery", "fast charging"], rating: 4.3, sales: 18000 },
    PhoneSpec { id: "iphone-14-pro", name: "iPhone 14 Pro", brand: "Apple", cpu: "A16", ram_gb: 6, storage_gb: 128, screen_inch: 6.1, camera_mp: 48, battery_mah: 3200, weight_g: 206, price: 7999.0, camera_tier: 0.85, design_tier: 0.9, highlights: &["video", "performance", "brand"], rating: 4.9, sales: 25000 },
    PhoneSpec { id: "xiaomi-13-ultra", name: "Xiaomi 13 Ultra", brand: "Xiaomi", cpu: "Snapdragon 8 Gen2", ram_gb: 16, storage_gb: 512, screen_inch: 6.73, camera_mp: 50, battery_mah: 5000, weight_g: 227, price: 5999.0, camera_tier: 0.95, design_tier: 0.8, highlights: &["video", "performance", "large storage"], rating: 4.7, sales: 5000 },
    PhoneSpec { id: "huawei-mate-60", name: "Huawei Mate 60", brand: "Huawei", cpu: "Kirin 9000S", ram_gb: 12, storage_gb: 256, screen_inch: 6.69, camera_mp: 50, battery_mah: 4750, weight_g: 209, price: 6999.0, camera_tier: 0.85, design_tier: 0.8, highlights: &["photography", "battery", "brand", "signal"], rating: 4.8, sales: 12000 },
    PhoneSpec { id: "oppo-reno-10", name: "OPPO Reno 10", brand: "OPPO", cpu: "Snapdragon 778G", ram_gb: 8, storage_gb: 128, screen_inch: 6.7, camera_mp: 64, battery_mah: 4600, weight_g: 180, price: 2499.0, camera_tier: 0.55, design_tier: 0.7, highlights: &["slim", "photography", "value"], rating: 4.2, sales: 15000 },
    PhoneSpec { id: "vivo-s17", name: "vivo S17", brand: "vivo", cpu: "Snapdragon 778G", ram_gb: 8, storage_gb: 128, screen_inch: 6.78, camera_mp: 50, battery_mah: 4600, weight_g: 186, price: 2299.0, camera_tier: 0.5, design_tier: 0.8, highlights: &["slim", "photography", "design"], rating: 4.3, sales: 12000 },
];

/// The built-in demo catalog.
pub fn sample_catalog() -> Vec<Candidate> {
    SAMPLE_PHONES.iter().map(PhoneSpec::to_candidate).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sample_scores_are_normalized() {
        for candidate in sample_catalog() {
            for (d, v) in candidate.scores.iter() {
                assert!((0.0..=1.0).contains(&v), "{} {} = {}", candidate.id, d, v);
            }
        }
    }

    #[test]
    fn sample_ids_are_unique() {
        let catalog = sample_catalog();
        let ids: HashSet<_> = catalog.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len());
        assert_eq!(catalog.len(), 12);
    }

    #[test]
    fn camera_score_looks_past_megapixels() {
        let catalog = sample_catalog();
        let camera = |id: &str| catalog.iter().find(|c| c.id == id).unwrap().scores.get(Dimension::Camera);
        // All three carry a 50 MP main sensor
        assert!(camera("vivo-x90") > camera("xiaomi-13"));
        assert!(camera("xiaomi-13") > camera("oneplus-11"));
        // 64 MP alone does not beat better optics
        assert!(camera("huawei-p60") > camera("redmi-k60"));
    }

    #[test]
    fn appearance_ignores_rating_and_sales() {
        let phone = &SAMPLE_PHONES[0];
        let popular = PhoneSpec { rating: 5.0, sales: 50_000, ..phone.clone() };
        assert_eq!(
            phone.scores().get(Dimension::Appearance),
            popular.scores().get(Dimension::Appearance)
        );

        let catalog = sample_catalog();
        let design = |id: &str| catalog.iter().find(|c| c.id == id).unwrap().scores.get(Dimension::Appearance);
        assert!(design("vivo-s17") > design("redmi-k60"));
    }

    #[test]
    fn cheaper_phone_scores_higher_on_value() {
        let catalog = sample_catalog();
        let by_id = |id: &str| catalog.iter().find(|c| c.id == id).unwrap().scores.get(Dimension::Price);
        assert!(by_id("vivo-s17") > by_id("iphone-14-pro"));
    }
}
