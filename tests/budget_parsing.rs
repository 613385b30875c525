use device_advisor::analyzer::{parse_budget, DemandAnalyzer, Strictness};
use device_advisor::config::AnalyzerConfig;
use device_advisor::services::llm::OfflineGateway;
use std::sync::Arc;

const BAND: f64 = 0.15;

#[test]
fn test_dash_range_is_strict() {
    let budget = parse_budget("3000-4000", BAND).unwrap();
    assert_eq!((budget.min, budget.max), (Some(3000.0), Some(4000.0)));
    assert_eq!(budget.strictness, Strictness::Strict);
}

#[test]
fn test_upper_bound_only() {
    for text in ["under 10000", "10000以下", "no more than 10k"] {
        let budget = parse_budget(text, BAND).unwrap_or_else(|| panic!("no budget in {:?}", text));
        assert_eq!(budget.min, None, "{}", text);
        assert_eq!(budget.max, Some(10000.0), "{}", text);
    }
}

#[test]
fn test_lone_amount_is_a_band() {
    let budget = parse_budget("5000", BAND).unwrap();
    assert_eq!(budget.strictness, Strictness::Flexible);
    assert!(budget.min.unwrap() < 5000.0 && budget.max.unwrap() > 5000.0);
    assert!(budget.contains(5000.0));
}

#[test]
fn test_wan_suffix_scales() {
    let budget = parse_budget("1万以内", BAND).unwrap();
    assert_eq!(budget.max, Some(10000.0));
}

#[test]
fn test_rule_tier_reads_budget_and_priorities() {
    let analyzer = DemandAnalyzer::new(AnalyzerConfig::default(), Arc::new(OfflineGateway));

    let profile = analyzer.rule_profile("预算3000到4000，主要拍照");

    let budget = profile.budget_value().unwrap();
    assert_eq!((budget.min, budget.max), (Some(3000.0), Some(4000.0)));
    assert!(profile.signalled_dimensions().any(|d| d.key() == "camera"));
    assert!((profile.confidence - 0.6).abs() < 1e-9);
}
