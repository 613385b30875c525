//! Deterministic wording plus the prompts that ask the model to improve on it.
//! Model output is only used after passing the sanitizers below.

use super::state::QuestionKind;
use crate::analyzer::DemandProfile;
use crate::catalog::{Candidate, DeviceSpecs, Dimension};
use crate::engine::{EmptyReason, ScoredCandidate};

pub const MAX_QUESTION_CHARS: usize = 300;
pub const MAX_PROSE_CHARS: usize = 1500;

pub fn clarify_question(kind: QuestionKind) -> String {
    match kind {
        QuestionKind::Budget => "What budget do you have in mind, for example 3000-4000?".to_string(),
        QuestionKind::UsageScenario => {
            "What will you mostly use the phone for: gaming, photos, work, or a bit of everything?".to_string()
        }
        QuestionKind::PriceSensitivity => {
            "How much does value for money matter to you compared with getting the best device?".to_string()
        }
        other => {
            let label = other.dimension().map_or("this", Dimension::label);
            format!("How important is {} to you, on a scale from 'nice to have' to 'must have'?", label)
        }
    }
}

pub fn clarify_prompt(kind: QuestionKind, profile: &DemandProfile, context: &str) -> String {
    let known = profile
        .budget_value()
        .map(|b| format!("Their budget is {}.", b.describe()))
        .unwrap_or_default();
    format!(
        "You are a friendly phone shopping assistant.\n{}{}\n\
         Ask the user one short, natural question about their {}. Reply with the question only.",
        context,
        known,
        kind.topic()
    )
}

fn strip_quotes(text: &str) -> &str {
    text.trim().trim_matches(|c| matches!(c, '"' | '\'' | '“' | '”' | '「' | '」')).trim()
}

/// Single paragraph, unquoted, non-empty, bounded. Rejects rather than truncating.
pub fn sanitize_question(raw: &str) -> Option<String> {
    let paragraph = strip_quotes(raw).split("\n\n").next()?;
    let single = paragraph.split_whitespace().collect::<Vec<_>>().join(" ");
    let single = strip_quotes(&single).to_string();
    if single.is_empty() || single.chars().count() > MAX_QUESTION_CHARS {
        return None;
    }
    Some(single)
}

pub fn sanitize_prose(raw: &str) -> Option<String> {
    let text = strip_quotes(raw);
    if text.is_empty() || text.chars().count() > MAX_PROSE_CHARS {
        return None;
    }
    Some(text.to_string())
}

pub fn recommendation_message(ranked: &[ScoredCandidate], profile: &DemandProfile, more: bool) -> String {
    let mut out = String::new();
    let intro = if more { "Here are some other options" } else { "Here is what I'd suggest" };
    match profile.budget_value() {
        Some(budget) => out.push_str(&format!("{} for {}:\n", intro, budget.describe())),
        None => out.push_str(&format!("{}:\n", intro)),
    }
    for (rank, c) in ranked.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} ({}), ¥{:.0}, match {:.0}%: {}\n",
            rank + 1,
            c.name,
            c.brand,
            c.price,
            c.match_score * 100.0,
            c.reasons.join(", ")
        ));
    }
    out.push_str("Ask me to compare them or to show other options.");
    out
}

pub fn recommend_prompt(ranked: &[ScoredCandidate], profile: &DemandProfile) -> String {
    let list: Vec<String> = ranked
        .iter()
        .map(|c| format!("- {} ({}), ¥{:.0}: {}", c.name, c.brand, c.price, c.reasons.join(", ")))
        .collect();
    let budget = profile.budget_value().map(|b| b.describe()).unwrap_or_else(|| "not given".into());
    format!(
        "You are a friendly phone shopping assistant. The user's budget is {}.\n\
         Present these phones in this exact order, briefly explaining why each fits:\n{}\n\
         Do not mention any other phone.",
        budget,
        list.join("\n")
    )
}

pub fn empty_message(reason: EmptyReason, profile: &DemandProfile) -> String {
    match reason {
        EmptyReason::CatalogEmpty => "I don't have any phones to recommend right now. Please try again later.".to_string(),
        EmptyReason::NoSurvivors => match profile.budget_value() {
            Some(budget) => format!(
                "Nothing in the catalog matches {} with your other requirements. \
                 Could you loosen the budget or drop a brand restriction?",
                budget.describe()
            ),
            None => "Nothing in the catalog matches your requirements. Could you loosen some of them?".to_string(),
        },
    }
}

type SpecRow = (&'static str, fn(&DeviceSpecs) -> String);

fn chip(s: &DeviceSpecs) -> String {
    s.cpu.clone()
}

fn memory(s: &DeviceSpecs) -> String {
    format!("{}GB+{}GB", s.ram_gb, s.storage_gb)
}

fn screen(s: &DeviceSpecs) -> String {
    format!("{:.2}\"", s.screen_inch)
}

fn main_camera(s: &DeviceSpecs) -> String {
    format!("{}MP", s.camera_mp)
}

fn battery(s: &DeviceSpecs) -> String {
    format!("{}mAh", s.battery_mah)
}

fn weight(s: &DeviceSpecs) -> String {
    format!("{}g", s.weight_g)
}

const SPEC_ROWS: &[SpecRow] = &[
    ("chip", chip),
    ("memory", memory),
    ("screen", screen),
    ("main camera", main_camera),
    ("battery", battery),
    ("weight", weight),
];

fn highlights_of(candidate: &Candidate) -> String {
    if candidate.highlights.is_empty() {
        "none listed".to_string()
    } else {
        candidate.highlights.join(", ")
    }
}

pub fn comparison_message(entries: &[&Candidate]) -> String {
    if entries.len() < 2 {
        return "I need at least two phones to compare. Ask me for recommendations first.".to_string();
    }
    let names: Vec<&str> = entries.iter().map(|c| c.name.as_str()).collect();
    let mut out = format!("Comparing {}:\n", names.join(" vs "));
    for d in Dimension::ALL {
        let best = entries
            .iter()
            .max_by(|a, b| a.scores.get(d).total_cmp(&b.scores.get(d)))
            .map(|c| c.name.as_str())
            .unwrap_or_default();
        let row: Vec<String> = entries
            .iter()
            .map(|c| format!("{} {:.2}", c.name, c.scores.get(d)))
            .collect();
        out.push_str(&format!("- {}: {} (best: {})\n", d.label(), row.join(", "), best));
    }
    if entries.iter().any(|c| c.specs.is_some()) {
        for (label, render) in SPEC_ROWS {
            let row: Vec<String> = entries
                .iter()
                .map(|c| format!("{} {}", c.name, c.specs.as_ref().map_or_else(|| "n/a".to_string(), *render)))
                .collect();
            out.push_str(&format!("- {}: {}\n", label, row.join(", ")));
        }
    }
    let highlights: Vec<String> = entries.iter().map(|c| format!("{} ({})", c.name, highlights_of(c))).collect();
    out.push_str(&format!("- highlights: {}\n", highlights.join("; ")));
    let prices: Vec<String> = entries.iter().map(|c| format!("{} ¥{:.0}", c.name, c.price)).collect();
    out.push_str(&format!("- price: {}", prices.join(", ")));
    out
}

pub fn compare_prompt(entries: &[&Candidate]) -> String {
    let rows: Vec<String> = entries
        .iter()
        .map(|c| {
            let scores: Vec<String> = c.scores.iter().map(|(d, v)| format!("{} {:.2}", d.label(), v)).collect();
            let mut row = format!("- {} (¥{:.0}): {}", c.name, c.price, scores.join(", "));
            if let Some(specs) = &c.specs {
                let facts: Vec<String> = SPEC_ROWS
                    .iter()
                    .map(|(label, render)| format!("{} {}", label, render(specs)))
                    .collect();
                row.push_str(&format!("; specs: {}", facts.join(", ")));
            }
            row.push_str(&format!("; highlights: {}", highlights_of(c)));
            row
        })
        .collect();
    format!(
        "You are a friendly phone shopping assistant. Compare these phones dimension by dimension \
         and say which suits whom. Scores are 0-1, higher is better.\n{}",
        rows.join("\n")
    )
}

pub fn chat_reply() -> String {
    "Hi! I can help you pick a phone. Tell me your budget and what matters most to you.".to_string()
}

pub fn chat_prompt(text: &str) -> String {
    format!(
        "You are a friendly phone shopping assistant. Reply briefly to the user and steer \
         back to finding them a phone.\nUser: {}",
        text
    )
}

pub fn apology() -> String {
    "Sorry, something went wrong while ranking phones. Could you rephrase what you're looking for?".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Budget;

    #[test]
    fn every_kind_has_a_question() {
        for kind in QuestionKind::ALL {
            let q = clarify_question(kind);
            assert!(q.ends_with('?'), "{:?}: {}", kind, q);
            assert!(q.chars().count() <= MAX_QUESTION_CHARS);
        }
    }

    #[test]
    fn question_sanitizer() {
        assert_eq!(sanitize_question("  \"What's your budget?\"  ").as_deref(), Some("What's your budget?"));
        assert_eq!(
            sanitize_question("What do you\nusually do?\n\nExtra notes here").as_deref(),
            Some("What do you usually do?")
        );
        assert_eq!(sanitize_question("   "), None);
        assert_eq!(sanitize_question(&"a".repeat(301)), None);
    }

    #[test]
    fn comparison_shows_specs_and_highlights() {
        let catalog = crate::catalog::sample_catalog();
        let entries: Vec<&Candidate> = catalog.iter().filter(|c| c.id == "xiaomi-13" || c.id == "vivo-x90").collect();

        let message = comparison_message(&entries);
        assert!(message.starts_with("Comparing Xiaomi 13 vs vivo X90"));
        assert!(message.contains("- battery: Xiaomi 13 4500mAh, vivo X90 4810mAh"), "{}", message);
        assert!(message.contains("Snapdragon 8 Gen2"));
        assert!(message.contains("12GB+256GB"));
        assert!(message.contains("vivo X90 (photography, fast charging, large screen)"));

        let prompt = compare_prompt(&entries);
        assert!(prompt.contains("4810mAh"));
        assert!(prompt.contains("highlights: slim, fast, fast charging"));
    }

    #[test]
    fn comparison_without_specs_still_lists_highlights() {
        let mut a = crate::catalog::sample_catalog().remove(0);
        let mut b = a.clone();
        a.specs = None;
        b.specs = None;
        b.id = "other".into();
        b.name = "Other".into();
        b.highlights.clear();

        let message = comparison_message(&[&a, &b]);
        assert!(!message.contains("mAh"));
        assert!(message.contains("Other (none listed)"));
    }

    #[test]
    fn empty_message_names_budget() {
        let mut profile = DemandProfile::new();
        profile.set_budget(Budget::at_most(500.0), 0.6);
        let message = empty_message(EmptyReason::NoSurvivors, &profile);
        assert!(message.contains("under ¥500"));
        assert!(message.contains("loosen"));
    }
}
