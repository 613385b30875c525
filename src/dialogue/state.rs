use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::analyzer::DemandProfile;
use crate::catalog::Dimension;

/// Where a conversation stands. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    #[default]
    Collecting,
    /// A clarification question is outstanding.
    Clarifying,
    /// Enough is known; a recommendation is due.
    Ready,
    Recommending,
    Comparing,
}

impl DialogueState {
    pub fn as_str(self) -> &'static str {
        match self {
            DialogueState::Collecting => "collecting",
            DialogueState::Clarifying => "clarifying",
            DialogueState::Ready => "ready",
            DialogueState::Recommending => "recommending",
            DialogueState::Comparing => "comparing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Budget,
    UsageScenario,
    PerformancePriority,
    CameraPriority,
    BatteryPriority,
    PortabilityPriority,
    PriceSensitivity,
    AppearancePriority,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 8] = [
        QuestionKind::Budget,
        QuestionKind::UsageScenario,
        QuestionKind::PerformancePriority,
        QuestionKind::CameraPriority,
        QuestionKind::BatteryPriority,
        QuestionKind::PortabilityPriority,
        QuestionKind::PriceSensitivity,
        QuestionKind::AppearancePriority,
    ];

    pub fn for_dimension(dimension: Dimension) -> QuestionKind {
        match dimension {
            Dimension::Performance => QuestionKind::PerformancePriority,
            Dimension::Camera => QuestionKind::CameraPriority,
            Dimension::Battery => QuestionKind::BatteryPriority,
            Dimension::Portability => QuestionKind::PortabilityPriority,
            Dimension::Price => QuestionKind::PriceSensitivity,
            Dimension::Appearance => QuestionKind::AppearancePriority,
        }
    }

    pub fn dimension(self) -> Option<Dimension> {
        match self {
            QuestionKind::Budget | QuestionKind::UsageScenario => None,
            QuestionKind::PerformancePriority => Some(Dimension::Performance),
            QuestionKind::CameraPriority => Some(Dimension::Camera),
            QuestionKind::BatteryPriority => Some(Dimension::Battery),
            QuestionKind::PortabilityPriority => Some(Dimension::Portability),
            QuestionKind::PriceSensitivity => Some(Dimension::Price),
            QuestionKind::AppearancePriority => Some(Dimension::Appearance),
        }
    }

    pub fn topic(self) -> &'static str {
        match self {
            QuestionKind::Budget => "budget",
            QuestionKind::UsageScenario => "usage scenario",
            other => other.dimension().map_or("preferences", Dimension::label),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// Turns kept per session. Older turns are dropped first.
pub const MAX_HISTORY: usize = 50;

/// Everything the controller remembers about one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub state: DialogueState,
    pub profile: DemandProfile,
    /// Question kinds already asked. A kind is never asked twice.
    pub asked: BTreeSet<QuestionKind>,
    /// The newest `MAX_HISTORY` turns.
    pub history: Vec<Turn>,
    pub turn_count: u64,
    /// Candidate ids of the most recent recommendation, best first.
    pub last_recommended: Vec<String>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: DialogueState::default(),
            profile: DemandProfile::new(),
            asked: BTreeSet::new(),
            history: Vec::new(),
            turn_count: 0,
            last_recommended: Vec::new(),
        }
    }

    /// The last `window` user messages, oldest first.
    pub fn recent_user_messages(&self, window: usize) -> Vec<String> {
        let mut recent: Vec<String> = self
            .history
            .iter()
            .rev()
            .filter(|t| t.speaker == Speaker::User)
            .take(window)
            .map(|t| t.text.clone())
            .collect();
        recent.reverse();
        recent
    }

    pub fn record(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.history.push(Turn { speaker, text: text.into() });
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }
    }
}
