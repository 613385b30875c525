use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use super::profile::PreferenceTag;
use crate::catalog::{Dimension, DIMENSION_COUNT};

struct Family {
    dimension: Dimension,
    terms: &'static [&'static str],
}

// ASCII terms match as word prefixes ("photo" hits "photos"), CJK terms as substrings.
// No term of a family may contain another term of the same family.
const FAMILIES: &[Family] = &[
    Family {
        dimension: Dimension::Performance,
        terms: &[
            "performance", "gaming", "game", "speed", "smooth", "snappy", "processor", "cpu", "chip",
            "snapdragon", "powerful", "lag", "multitask", "性能", "速度", "流畅", "游戏", "电竞", "王者",
            "吃鸡", "原神", "处理器", "骁龙", "天玑", "麒麟", "不卡",
        ],
    },
    Family {
        dimension: Dimension::Camera,
        terms: &[
            "camera", "photo", "pics", "picture", "selfie", "video", "vlog", "zoom", "lens", "night mode",
            "portrait", "拍照", "摄影", "相机", "摄像", "夜景", "人像", "视频", "录像", "影像", "自拍", "像素",
        ],
    },
    Family {
        dimension: Dimension::Battery,
        terms: &[
            "battery", "charging", "endurance", "lasts", "all day", "all-day", "screen time", "续航", "电池",
            "充电", "快充", "省电", "待机", "耐用",
        ],
    },
    Family {
        dimension: Dimension::Portability,
        terms: &[
            "light", "thin", "slim", "compact", "portable", "pocket", "one hand", "one-hand", "small",
            "轻", "薄", "便携", "小巧", "单手", "小屏",
        ],
    },
    Family {
        dimension: Dimension::Price,
        terms: &[
            "cheap", "affordable", "value for money", "bang for", "inexpensive", "budget-friendly",
            "economical", "便宜", "性价比", "实惠", "划算", "经济",
        ],
    },
    Family {
        dimension: Dimension::Appearance,
        terms: &[
            "design", "looks", "good-looking", "good looking", "beautiful", "pretty", "stylish", "color",
            "colour", "aesthetic", "elegant", "颜值", "外观", "好看", "漂亮", "时尚", "设计",
        ],
    },
];

/// Canonical brand key and the aliases that mention it.
const BRANDS: &[(&str, &[&str])] = &[
    ("apple", &["apple", "iphone", "苹果"]),
    ("huawei", &["huawei", "华为"]),
    ("xiaomi", &["xiaomi", "redmi", "小米", "红米"]),
    ("oppo", &["oppo"]),
    ("vivo", &["vivo"]),
    ("oneplus", &["oneplus", "one plus", "一加"]),
    ("samsung", &["samsung", "galaxy", "三星"]),
    ("honor", &["honor", "荣耀"]),
    ("google", &["google", "pixel", "谷歌"]),
];

const FEATURES: &[(&str, &[&str])] = &[
    ("fast_charging", &["fast charg", "quick charg", "快充", "闪充"]),
    ("wireless_charging", &["wireless charg", "无线充"]),
    ("5g", &["5g"]),
    ("large_screen", &["large screen", "big screen", "大屏"]),
    ("small_screen", &["small screen", "小屏"]),
    ("high_refresh", &["high refresh", "120hz", "144hz", "高刷"]),
    ("stylus", &["stylus", "手写笔", "触控笔"]),
    ("waterproof", &["waterproof", "water resistant", "ip68", "防水"]),
];

static CLAUSE_BREAK: Lazy<Regex> =
    Lazy::new(|| compile(r"[.,;!?\n，。；！？、]|\bbut\b|但是|不过"));
static PRIORITY: Lazy<Regex> = Lazy::new(|| {
    compile(r"\b(?:most important|mainly|mostly|priority|prioriti[sz]e|above all|must|especially|first and foremost)\b|最|主要|优先|重要|重点|特别")
});
static INDIFFERENT: Lazy<Regex> = Lazy::new(|| {
    compile(r"don'?t care (?:about|for)|doesn'?t matter|not important|not needed|不在乎|无所谓|不重要|不需要|不关心")
});
static NEGATION: Lazy<Regex> = Lazy::new(|| {
    compile(r"\b(?:no|not|don'?t|never|avoid|hate|dislike|except|without)\b|不要|不想|不喜欢|不考虑|除了|别")
});

fn compile(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){}", pattern)).unwrap_or_else(|e| panic!("invalid keyword pattern: {}", e))
}

/// Occurrences of `term` in a lowercased clause.
fn count_term(clause: &str, term: &str) -> usize {
    if !term.is_ascii() {
        return clause.matches(term).count();
    }
    clause
        .match_indices(term)
        .filter(|(at, _)| {
            clause[..*at]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric() || !c.is_ascii())
        })
        .count()
}

fn mentions(clause: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| count_term(clause, t) > 0)
}

fn canonical(name: &str, table: &[(&'static str, &[&str])]) -> Option<String> {
    let lowered = name.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    let known = table
        .iter()
        .find(|(key, aliases)| *key == lowered || mentions(&lowered, aliases))
        .map(|(key, _)| key.to_string());
    Some(known.unwrap_or_else(|| lowered.replace([' ', '-'], "_")))
}

/// Maps a free-form brand name onto the key used in preference tags.
pub fn canonical_brand(name: &str) -> Option<String> {
    canonical(name, BRANDS)
}

pub fn canonical_feature(name: &str) -> Option<String> {
    canonical(name, FEATURES)
}

/// What the keyword tier found in one message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordScan {
    /// Raw signal per dimension, indexed by `Dimension::index`.
    pub signals: [f64; DIMENSION_COUNT],
    pub preferences: BTreeSet<PreferenceTag>,
}

impl KeywordScan {
    pub fn signal(&self, dimension: Dimension) -> f64 {
        self.signals[dimension.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.signals.iter().all(|s| *s <= 0.0) && self.preferences.is_empty()
    }
}

pub fn scan(text: &str) -> KeywordScan {
    let lowered = text.to_lowercase().replace("anything but", "anything except");
    let mut result = KeywordScan::default();

    for clause in CLAUSE_BREAK.split(&lowered) {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }
        let negated = NEGATION.is_match(clause);

        if !INDIFFERENT.is_match(clause) {
            let boost = if PRIORITY.is_match(clause) { 2.0 } else { 1.0 };
            for family in FAMILIES {
                let hits: usize = family.terms.iter().map(|t| count_term(clause, t)).sum();
                result.signals[family.dimension.index()] += hits as f64 * boost;
            }
        }

        for (brand, aliases) in BRANDS {
            if mentions(clause, aliases) {
                let tag = if negated {
                    PreferenceTag::AvoidsBrand(brand.to_string())
                } else {
                    PreferenceTag::LikesBrand(brand.to_string())
                };
                result.preferences.remove(&tag.opposite());
                result.preferences.insert(tag);
            }
        }

        if !negated {
            for (feature, aliases) in FEATURES {
                if mentions(clause, aliases) {
                    result.preferences.insert(PreferenceTag::Feature(feature.to_string()));
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_hits_add_signal() {
        let scan = scan("I mostly take photos at night, and the battery must last");
        assert_eq!(scan.signal(Dimension::Camera), 2.0);
        assert_eq!(scan.signal(Dimension::Battery), 2.0);
        assert_eq!(scan.signal(Dimension::Performance), 0.0);
    }

    #[test]
    fn priority_marker_boosts_same_clause_only() {
        let scan = scan("拍照最重要，续航也要好");
        assert_eq!(scan.signal(Dimension::Camera), 2.0);
        assert_eq!(scan.signal(Dimension::Battery), 1.0);
    }

    #[test]
    fn word_prefix_matching() {
        assert!(scan("I'm looking for a phone").is_empty());
        assert_eq!(scan("breakfast").signal(Dimension::Performance), 0.0);
        assert_eq!(scan("great photography").signal(Dimension::Camera), 1.0);
    }

    #[test]
    fn indifference_gives_no_signal() {
        let scan = scan("I don't care about the camera");
        assert_eq!(scan.signal(Dimension::Camera), 0.0);
    }

    #[test]
    fn brands_liked_and_avoided() {
        let scan = scan("no Apple please, I like Huawei");
        assert!(scan.preferences.contains(&PreferenceTag::AvoidsBrand("apple".into())));
        assert!(scan.preferences.contains(&PreferenceTag::LikesBrand("huawei".into())));

        let zh = super::scan("不要苹果");
        assert!(zh.preferences.contains(&PreferenceTag::AvoidsBrand("apple".into())));
    }

    #[test]
    fn canonical_names() {
        assert_eq!(canonical_brand("iPhone").as_deref(), Some("apple"));
        assert_eq!(canonical_brand(" Nothing Phone ").as_deref(), Some("nothing_phone"));
        assert_eq!(canonical_feature("Fast Charging").as_deref(), Some("fast_charging"));
        assert_eq!(canonical_brand("  "), None);
    }

    #[test]
    fn feature_tags() {
        let scan = scan("needs fast charging and 5G");
        assert!(scan.preferences.contains(&PreferenceTag::Feature("fast_charging".into())));
        assert!(scan.preferences.contains(&PreferenceTag::Feature("5g".into())));
        assert_eq!(scan.signal(Dimension::Performance), 0.0);
        assert_eq!(scan.signal(Dimension::Battery), 1.0);
    }
}
