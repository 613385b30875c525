mod common;

use common::offline_controller;
use device_advisor::analyzer::{merge, Budget, DemandAnalyzer, DemandProfile, Strictness, DEFAULT_WEIGHT_FLOOR};
use device_advisor::catalog::{sample_catalog, Dimension};
use device_advisor::config::{AnalyzerConfig, EngineConfig};
use device_advisor::dialogue::ActionKind;
use device_advisor::engine::recommend;
use device_advisor::services::llm::OfflineGateway;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn arb_profile() -> impl Strategy<Value = DemandProfile> {
    let signal = proptest::option::of((0.01f64..5.0, 0.1f64..1.0));
    (
        proptest::collection::vec(signal, 6),
        proptest::option::of((1000.0f64..5000.0, 0.0f64..3000.0, 0usize..3, 0.1f64..1.0)),
    )
        .prop_map(|(signals, budget)| {
            let mut profile = DemandProfile::new();
            for (d, s) in Dimension::ALL.into_iter().zip(signals) {
                if let Some((value, confidence)) = s {
                    profile.set_signal(d, value, confidence);
                }
            }
            if let Some((lo, width, strictness, confidence)) = budget {
                let strictness = [Strictness::Strict, Strictness::Flexible, Strictness::Unconstrained][strictness];
                let budget = match strictness {
                    Strictness::Unconstrained => Budget::unconstrained(),
                    s => Budget::between(lo, lo + width, s),
                };
                profile.set_budget(budget, confidence);
            }
            profile.refreshed(DEFAULT_WEIGHT_FLOOR)
        })
}

const MESSAGES: &[&str] = &[
    "hmm",
    "hi",
    "I like taking photos",
    "around 3000",
    "gaming matters most",
    "compare them",
    "show me other options",
    "no apple please",
    "battery life is important",
    "不在乎外观",
];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ranking_is_sorted_bounded_and_short(profile in arb_profile(), top_k in 1usize..15) {
        let result = recommend(&profile, &sample_catalog(), top_k, &EngineConfig::default()).unwrap();
        let ranked = result.candidates();

        prop_assert!(ranked.len() <= top_k);
        for item in ranked {
            prop_assert!((0.0..=1.0).contains(&item.match_score));
        }
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].match_score >= pair[1].match_score);
        }
        let ids: HashSet<&str> = ranked.iter().map(|r| r.candidate_id.as_str()).collect();
        prop_assert_eq!(ids.len(), ranked.len());
    }

    #[test]
    fn merge_never_lowers_field_confidence(prior in arb_profile(), incoming in arb_profile()) {
        let merged = merge(&prior, &incoming, DEFAULT_WEIGHT_FLOOR);

        for d in Dimension::ALL {
            if let Some(p) = prior.signal(d) {
                let m = merged.signal(d).unwrap();
                prop_assert!(m.confidence >= p.confidence);
            }
        }
        if let Some(p) = prior.budget {
            prop_assert!(merged.budget.unwrap().confidence >= p.confidence);
        }
        let sum: f64 = merged.dimension_weights.iter().map(|(_, w)| w).sum();
        prop_assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn merging_the_same_turn_twice_changes_nothing(prior in arb_profile(), index in 0usize..10) {
        let analyzer = DemandAnalyzer::new(AnalyzerConfig::default(), Arc::new(OfflineGateway));
        let turn = analyzer.rule_profile(MESSAGES[index]);

        let once = merge(&prior, &turn, DEFAULT_WEIGHT_FLOOR);
        let twice = merge(&once, &turn, DEFAULT_WEIGHT_FLOOR);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn no_question_is_asked_twice(script in proptest::collection::vec(0usize..10, 1..16)) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let kinds = runtime.block_on(async {
            let controller = offline_controller();
            let mut kinds = Vec::new();
            for index in script {
                let response = controller.handle_turn("p", MESSAGES[index]).await;
                if response.action == ActionKind::Clarify {
                    kinds.push(response.question_kind.unwrap());
                }
            }
            kinds
        });

        let unique: HashSet<_> = kinds.iter().collect();
        prop_assert_eq!(unique.len(), kinds.len());
    }
}
