use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::budget::parse_budget;
use super::keywords;
use super::llm::{build_extraction_prompt, parse_extraction, ConversationContext, ModelExtraction};
use super::profile::{merge, DemandProfile};
use crate::catalog::Dimension;
use crate::config::AnalyzerConfig;
use crate::dialogue::UserIntent;
use crate::error::{DegradeCause, GatewayError};
use crate::services::llm::LanguageModelGateway;

/// Result of analyzing one user message against the accumulated profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Prior merged with everything extracted from this message.
    pub profile: DemandProfile,
    /// Confidence of the best tier that produced fields this turn, 0 when nothing was found.
    pub extraction_confidence: f64,
    pub degraded: bool,
    pub degraded_cause: Option<DegradeCause>,
    /// The merged profile differs from the prior in budget, signals or preferences.
    pub changed: bool,
    /// This message, on its own, carried demand information.
    pub carried_demand: bool,
    pub intent_hint: Option<UserIntent>,
}

/// Keyword hits to a signal on the same [0, 1] scale as model priorities
/// (`priority / 10`). A prioritized clause counts each hit twice.
fn signal_level(hits: f64) -> f64 {
    if hits >= 3.0 {
        1.0
    } else if hits >= 2.0 {
        0.8
    } else if hits > 0.0 {
        0.5
    } else {
        0.0
    }
}

pub struct DemandAnalyzer {
    config: AnalyzerConfig,
    gateway: Arc<dyn LanguageModelGateway>,
}

impl DemandAnalyzer {
    pub fn new(config: AnalyzerConfig, gateway: Arc<dyn LanguageModelGateway>) -> Self {
        Self { config, gateway }
    }

    /// Deterministic keyword and budget extraction. Never fails.
    pub fn rule_profile(&self, text: &str) -> DemandProfile {
        let confidence = self.config.rule_confidence;
        let mut profile = DemandProfile::new();

        if let Some(budget) = parse_budget(text, self.config.approximate_band) {
            profile.set_budget(budget, confidence);
        }

        let scan = keywords::scan(text);
        for d in Dimension::ALL {
            let signal = signal_level(scan.signal(d));
            if signal > 0.0 {
                profile.set_signal(d, signal, confidence);
            }
        }
        profile.preferences = scan.preferences;
        profile.refreshed(self.config.weight_floor)
    }

    fn model_confidence(&self, extraction: &ModelExtraction) -> f64 {
        let ceiling = self.config.llm_confidence;
        extraction
            .reported_confidence
            .map_or(ceiling, |reported| reported.min(ceiling))
            .max(self.config.rule_confidence)
    }

    async fn model_extraction(
        &self,
        text: &str,
        context: &ConversationContext,
        timeout: Duration,
    ) -> Result<ModelExtraction, GatewayError> {
        if timeout.is_zero() {
            return Err(GatewayError::Timeout(0));
        }
        let prompt = build_extraction_prompt(text, context);
        let reply = tokio::time::timeout(timeout, self.gateway.complete(&prompt, timeout))
            .await
            .map_err(|_| GatewayError::Timeout(timeout.as_millis() as u64))??;
        parse_extraction(&reply)
    }

    /// Runs the rule tier, then the model tier within `timeout`, and merges both into `prior`.
    /// Gateway trouble only ever degrades the result.
    pub async fn analyze(
        &self,
        text: &str,
        prior: &DemandProfile,
        context: &ConversationContext,
        timeout: Duration,
    ) -> Analysis {
        let floor = self.config.weight_floor;
        let rules = self.rule_profile(text);
        let rule_found = !rules.is_blank();

        let (turn, extraction_confidence, intent_hint, degraded_cause) =
            match self.model_extraction(text, context, timeout).await {
                Ok(extraction) => {
                    let confidence = self.model_confidence(&extraction);
                    let model = extraction.to_profile(confidence);
                    let found = !model.is_blank() || rule_found;
                    debug!(confidence, intent = ?extraction.intent, "model extraction accepted");
                    (
                        merge(&rules, &model, floor),
                        if found { confidence } else { 0.0 },
                        extraction.intent,
                        None,
                    )
                }
                Err(e) => {
                    warn!(cause = e.cause().as_str(), "model extraction degraded: {}", e);
                    let confidence = if rule_found { self.config.rule_confidence } else { 0.0 };
                    (rules, confidence, None, Some(e.cause()))
                }
            };

        let carried_demand = !turn.is_blank();
        let profile = merge(prior, &turn, floor);
        let changed = profile.differs_in_requirements(prior);
        debug!(
            carried_demand,
            changed,
            confidence = profile.confidence,
            "demand analysis complete"
        );

        Analysis {
            profile,
            extraction_confidence,
            degraded: degraded_cause.is_some(),
            degraded_cause,
            changed,
            carried_demand,
            intent_hint,
        }
    }
}
