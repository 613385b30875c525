use serde::{Deserialize, Serialize};

use crate::dialogue::{DialogueState, QuestionKind};
use crate::engine::EmptyReason;
use crate::error::DegradeCause;

// Allowed: enums, counts, durations.
// Forbidden: user text, model replies, budgets, brand names.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    GatewayDegraded {
        stage: GatewayStage,
        cause: DegradeCause,
    },

    ClarificationAsked {
        kind: QuestionKind,
    },

    RecommendationEmitted {
        count: usize,
    },

    ComparisonEmitted {
        count: usize,
    },

    EmptyResult {
        reason: EmptyReason,
    },

    StateTransition {
        from: DialogueState,
        to: DialogueState,
    },

    TurnCompleted {
        elapsed_ms: u64,
    },
}

/// Which model call fell back to the deterministic path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayStage {
    Extraction,
    Clarification,
    Recommendation,
    Comparison,
    Chat,
}
