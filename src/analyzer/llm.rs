//! Model-assisted extraction: prompt rendering and defensive parsing of the reply.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;

use super::keywords::{canonical_brand, canonical_feature};
use super::profile::{Budget, DemandProfile, PreferenceTag, Strictness};
use crate::catalog::{Dimension, DIMENSION_COUNT};
use crate::dialogue::{QuestionKind, UserIntent};
use crate::error::GatewayError;

const MAX_PRIORITY: f64 = 10.0;
const MIN_MODEL_PRICE: f64 = 100.0;

/// Bounded view of the conversation given to the model.
#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    pub recent_user_messages: Vec<String>,
    pub asked: Vec<QuestionKind>,
    pub catalog_price_range: Option<(f64, f64)>,
}

impl ConversationContext {
    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.recent_user_messages.is_empty() {
            out.push_str("Earlier user messages:\n");
            for message in &self.recent_user_messages {
                out.push_str("- ");
                out.push_str(message);
                out.push('\n');
            }
        }
        if !self.asked.is_empty() {
            let topics: Vec<&str> = self.asked.iter().map(|k| k.topic()).collect();
            out.push_str(&format!("Already asked about: {}\n", topics.join(", ")));
        }
        if let Some((lo, hi)) = self.catalog_price_range {
            out.push_str(&format!("Catalog prices range from {:.0} to {:.0}.\n", lo, hi));
        }
        out
    }
}

pub fn build_extraction_prompt(text: &str, context: &ConversationContext) -> String {
    let dimensions: Vec<&str> = Dimension::ALL.iter().map(|d| d.key()).collect();
    format!(
        "You extract phone shopping requirements from a conversation.\n\
         {context}\
         Current user message: {text}\n\n\
         Reply with one JSON object and nothing else, using only these fields:\n\
         {{\"budget\": {{\"min\": number|null, \"max\": number|null, \"strictness\": \"strict\"|\"flexible\"|\"unconstrained\"}},\n\
          \"priorities\": {{<dimension>: 0-10}} where dimension is one of {dims},\n\
          \"brands_liked\": [string], \"brands_avoided\": [string], \"features\": [string],\n\
          \"intent\": \"demand\"|\"compare\"|\"more_options\"|\"chat\",\n\
          \"confidence\": 0-1}}\n\
         Omit anything the user did not say.",
        context = context.render(),
        text = text,
        dims = dimensions.join(", "),
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBudget {
    min: Option<Value>,
    max: Option<Value>,
    strictness: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawExtraction {
    budget: Option<Value>,
    priorities: Option<Value>,
    brands_liked: Option<Value>,
    brands_avoided: Option<Value>,
    features: Option<Value>,
    intent: Option<Value>,
    confidence: Option<Value>,
}

/// Usable content of one model reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelExtraction {
    pub budget: Option<Budget>,
    /// Priority mapped into [0, 1], indexed by `Dimension::index`.
    pub priorities: [Option<f64>; DIMENSION_COUNT],
    pub preferences: BTreeSet<PreferenceTag>,
    pub intent: Option<UserIntent>,
    pub reported_confidence: Option<f64>,
}

impl ModelExtraction {
    fn is_empty(&self) -> bool {
        self.budget.is_none()
            && self.priorities.iter().all(Option::is_none)
            && self.preferences.is_empty()
            && self.intent.is_none()
    }

    /// Profile fields tagged with the tier confidence. Derived fields are left for the merge.
    pub fn to_profile(&self, confidence: f64) -> DemandProfile {
        let mut profile = DemandProfile::new();
        if let Some(budget) = self.budget {
            profile.set_budget(budget, confidence);
        }
        for d in Dimension::ALL {
            if let Some(p) = self.priorities[d.index()] {
                profile.set_signal(d, p, confidence);
            }
        }
        profile.preferences = self.preferences.clone();
        profile
    }
}

/// Non-negative finite number, also accepted as a numeric string.
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (n.is_finite() && n >= 0.0).then_some(n)
}

fn strings(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    }
}

fn parse_strictness(raw: &str) -> Option<Strictness> {
    match raw.trim().to_lowercase().as_str() {
        "strict" | "hard" | "严格" => Some(Strictness::Strict),
        "flexible" | "soft" | "灵活" => Some(Strictness::Flexible),
        "unconstrained" | "none" | "any" | "不限" => Some(Strictness::Unconstrained),
        _ => None,
    }
}

fn parse_intent(raw: &str) -> Option<UserIntent> {
    match raw.trim().to_lowercase().as_str() {
        "demand" => Some(UserIntent::Demand),
        "compare" | "comparison" => Some(UserIntent::Compare),
        "more_options" | "more" | "other_options" => Some(UserIntent::MoreOptions),
        "chat" | "smalltalk" | "greeting" => Some(UserIntent::Chat),
        _ => None,
    }
}

fn convert_budget(value: &Value) -> Option<Budget> {
    let raw: RawBudget = serde_json::from_value(value.clone()).ok()?;
    let plausible = |v: &Option<Value>| v.as_ref().and_then(number).filter(|n| *n >= MIN_MODEL_PRICE);
    let strictness = raw
        .strictness
        .as_deref()
        .and_then(parse_strictness)
        .unwrap_or(Strictness::Flexible);
    if strictness == Strictness::Unconstrained {
        return Some(Budget::unconstrained());
    }
    match (plausible(&raw.min), plausible(&raw.max)) {
        (Some(lo), Some(hi)) => Some(Budget::between(lo, hi, strictness)),
        (None, None) => None,
        (min, max) => Some(Budget { min, max, strictness }),
    }
}

/// Parses a model reply. Anything outside the outermost `{...}` is ignored and a
/// reply without a single usable field is `Malformed`.
pub fn parse_extraction(response: &str) -> Result<ModelExtraction, GatewayError> {
    let start = response.find('{');
    let end = response.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &response[s..=e],
        _ => return Err(GatewayError::Malformed("no JSON object in reply".into())),
    };
    let raw: RawExtraction =
        serde_json::from_str(json).map_err(|e| GatewayError::Malformed(e.to_string()))?;

    let mut extraction = ModelExtraction {
        budget: raw.budget.as_ref().and_then(convert_budget),
        intent: raw.intent.as_ref().and_then(Value::as_str).and_then(parse_intent),
        reported_confidence: raw.confidence.as_ref().and_then(number).map(|c| c.min(1.0)),
        ..ModelExtraction::default()
    };

    for (key, value) in raw.priorities.iter().filter_map(Value::as_object).flatten() {
        let (Some(dimension), Some(priority)) = (Dimension::from_key(key), number(value)) else {
            continue;
        };
        let priority = priority.min(MAX_PRIORITY);
        if priority > 0.0 {
            extraction.priorities[dimension.index()] = Some(priority / MAX_PRIORITY);
        }
    }

    for brand in raw.brands_avoided.iter().flat_map(strings).filter_map(|b| canonical_brand(&b)) {
        extraction.preferences.insert(PreferenceTag::AvoidsBrand(brand));
    }
    for brand in raw.brands_liked.iter().flat_map(strings).filter_map(|b| canonical_brand(&b)) {
        // A brand both liked and avoided in one reply is dropped.
        let liked = PreferenceTag::LikesBrand(brand);
        if !extraction.preferences.remove(&liked.opposite()) {
            extraction.preferences.insert(liked);
        }
    }
    for feature in raw.features.iter().flat_map(strings).filter_map(|f| canonical_feature(&f)) {
        extraction.preferences.insert(PreferenceTag::Feature(feature));
    }

    if extraction.is_empty() {
        return Err(GatewayError::Malformed("reply carried no usable field".into()));
    }
    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_wrapped_in_prose() {
        let reply = r#"Sure! Here you go:
        {"budget": {"min": 3000, "max": 4000, "strictness": "strict"},
         "priorities": {"camera": 9, "battery": "4"},
         "brands_avoided": ["iPhone"], "intent": "demand", "confidence": 0.9}
        Hope that helps."#;
        let extraction = parse_extraction(reply).unwrap();
        let budget = extraction.budget.unwrap();
        assert_eq!((budget.min, budget.max), (Some(3000.0), Some(4000.0)));
        assert_eq!(budget.strictness, Strictness::Strict);
        assert_eq!(extraction.priorities[Dimension::Camera.index()], Some(0.9));
        assert_eq!(extraction.priorities[Dimension::Battery.index()], Some(0.4));
        assert!(extraction.preferences.contains(&PreferenceTag::AvoidsBrand("apple".into())));
        assert_eq!(extraction.intent, Some(UserIntent::Demand));
        assert_eq!(extraction.reported_confidence, Some(0.9));
    }

    #[test]
    fn out_of_range_values_are_sanitized() {
        let reply = r#"{"priorities": {"performance": 42, "camera": -3, "unknown": 5},
                        "budget": {"min": -100, "max": null}}"#;
        let extraction = parse_extraction(reply).unwrap();
        assert_eq!(extraction.priorities[Dimension::Performance.index()], Some(1.0));
        assert_eq!(extraction.priorities[Dimension::Camera.index()], None);
        assert_eq!(extraction.budget, None);
    }

    #[test]
    fn useless_or_broken_replies_are_malformed() {
        assert!(matches!(parse_extraction("I cannot help with that"), Err(GatewayError::Malformed(_))));
        assert!(matches!(parse_extraction("{\"budget\": "), Err(GatewayError::Malformed(_))));
        assert!(matches!(parse_extraction("{\"mood\": \"happy\"}"), Err(GatewayError::Malformed(_))));
    }

    #[test]
    fn context_renders_recent_messages() {
        let context = ConversationContext {
            recent_user_messages: vec!["hi".into(), "I like photos".into()],
            asked: vec![QuestionKind::Budget],
            catalog_price_range: Some((2299.0, 7999.0)),
        };
        let rendered = context.render();
        assert!(rendered.contains("- I like photos"));
        assert!(rendered.contains("Already asked about: budget"));
        assert!(rendered.contains("2299 to 7999"));
    }
}
