use std::collections::BTreeSet;

use super::intent::UserIntent;
use super::state::{DialogueState, QuestionKind, Session};
use crate::analyzer::DemandProfile;
use crate::catalog::Dimension;
use crate::config::DialogueConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DialoguePolicy {
    pub recommend_threshold: f64,
}

impl Default for DialoguePolicy {
    fn default() -> Self {
        Self::from(&DialogueConfig::default())
    }
}

impl From<&DialogueConfig> for DialoguePolicy {
    fn from(config: &DialogueConfig) -> Self {
        Self { recommend_threshold: config.recommend_threshold }
    }
}

/// Requests that drive the dialogue state machine.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// The analyzer finished with the current user message.
    Analyzed {
        profile: DemandProfile,
        intent: UserIntent,
        changed: bool,
    },
}

/// What the controller must do next. Decided here, executed there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Clarify(QuestionKind),
    Recommend { exclude_previous: bool },
    Compare,
    Chat,
}

/// The most informative question not yet asked, if any remains.
pub fn next_question(profile: &DemandProfile, asked: &BTreeSet<QuestionKind>) -> Option<QuestionKind> {
    if profile.budget.is_none() && !asked.contains(&QuestionKind::Budget) {
        return Some(QuestionKind::Budget);
    }
    if profile.signalled_dimensions().next().is_none() && !asked.contains(&QuestionKind::UsageScenario) {
        return Some(QuestionKind::UsageScenario);
    }

    let mut best: Option<(QuestionKind, f64)> = None;
    for d in Dimension::ALL {
        let kind = QuestionKind::for_dimension(d);
        if asked.contains(&kind) {
            continue;
        }
        let gain = profile.dimension_weights.get(d) * (1.0 - profile.certainty(d));
        // Strictly greater keeps the earlier dimension on ties.
        if best.map_or(true, |(_, g)| gain > g) {
            best = Some((kind, gain));
        }
    }
    best.map(|(kind, _)| kind)
}

/// Pure function: (session, event) -> (session, action).
///
/// Never asks the same kind twice; once every kind has been asked it
/// recommends with whatever confidence it has.
pub fn transition(session: Session, event: TurnEvent, policy: &DialoguePolicy) -> (Session, Action) {
    use DialogueState::*;

    let TurnEvent::Analyzed { profile, intent, changed } = event;
    let mut session = session;
    session.profile = profile;

    // New requirements invalidate a shown ranking or comparison.
    if changed && matches!(session.state, Recommending | Comparing) {
        session.state = Collecting;
    }

    match intent {
        UserIntent::Chat if !changed => return (session, Action::Chat),
        UserIntent::Compare => {
            session.state = Comparing;
            return (session, Action::Compare);
        }
        UserIntent::MoreOptions if !session.last_recommended.is_empty() => {
            session.state = Ready;
            return (session, Action::Recommend { exclude_previous: true });
        }
        _ => {}
    }

    if session.profile.confidence >= policy.recommend_threshold {
        session.state = Ready;
        return (session, Action::Recommend { exclude_previous: false });
    }

    match next_question(&session.profile, &session.asked) {
        Some(kind) => {
            session.asked.insert(kind);
            session.state = Clarifying;
            (session, Action::Clarify(kind))
        }
        None => {
            session.state = Ready;
            (session, Action::Recommend { exclude_previous: false })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Budget, DEFAULT_WEIGHT_FLOOR};

    fn analyzed(profile: DemandProfile, intent: UserIntent, changed: bool) -> TurnEvent {
        TurnEvent::Analyzed { profile, intent, changed }
    }

    fn confident_profile() -> DemandProfile {
        let mut profile = DemandProfile::new();
        profile.set_budget(Budget::between(3000.0, 4000.0, crate::analyzer::Strictness::Strict), 0.85);
        profile.set_signal(Dimension::Camera, 1.0, 0.85);
        profile.set_signal(Dimension::Battery, 1.0, 0.85);
        profile.refreshed(DEFAULT_WEIGHT_FLOOR)
    }

    #[test]
    fn blank_profile_asks_budget_first() {
        let (session, action) = transition(
            Session::new("s"),
            analyzed(DemandProfile::new(), UserIntent::Demand, false),
            &DialoguePolicy::default(),
        );
        assert_eq!(action, Action::Clarify(QuestionKind::Budget));
        assert_eq!(session.state, DialogueState::Clarifying);
        assert!(session.asked.contains(&QuestionKind::Budget));
    }

    #[test]
    fn budget_known_asks_usage_then_weightiest_dimension() {
        let mut profile = DemandProfile::new();
        profile.set_budget(Budget::at_most(4000.0), 0.6);
        let profile = profile.refreshed(DEFAULT_WEIGHT_FLOOR);
        let (session, action) = transition(
            Session::new("s"),
            analyzed(profile.clone(), UserIntent::Demand, true),
            &DialoguePolicy::default(),
        );
        assert_eq!(action, Action::Clarify(QuestionKind::UsageScenario));

        let mut with_signal = profile;
        with_signal.set_signal(Dimension::Battery, 2.0, 0.6);
        let with_signal = with_signal.refreshed(DEFAULT_WEIGHT_FLOOR);
        let (_, action) = transition(session, analyzed(with_signal, UserIntent::Demand, true), &DialoguePolicy::default());
        assert_eq!(action, Action::Clarify(QuestionKind::BatteryPriority));
    }

    #[test]
    fn confident_profile_recommends() {
        let (session, action) = transition(
            Session::new("s"),
            analyzed(confident_profile(), UserIntent::Demand, true),
            &DialoguePolicy::default(),
        );
        assert_eq!(action, Action::Recommend { exclude_previous: false });
        assert_eq!(session.state, DialogueState::Ready);
    }

    #[test]
    fn exhausted_questions_force_recommendation() {
        let mut session = Session::new("s");
        session.asked = QuestionKind::ALL.into_iter().collect();
        let (session, action) =
            transition(session, analyzed(DemandProfile::new(), UserIntent::Demand, false), &DialoguePolicy::default());
        assert_eq!(action, Action::Recommend { exclude_previous: false });
        assert_eq!(session.state, DialogueState::Ready);
    }

    #[test]
    fn changed_requirements_leave_recommending() {
        let mut session = Session::new("s");
        session.state = DialogueState::Recommending;
        let (session, action) =
            transition(session, analyzed(DemandProfile::new(), UserIntent::Demand, true), &DialoguePolicy::default());
        assert_eq!(session.state, DialogueState::Clarifying);
        assert_eq!(action, Action::Clarify(QuestionKind::Budget));
    }

    #[test]
    fn chat_keeps_state_and_compare_switches() {
        let mut session = Session::new("s");
        session.state = DialogueState::Recommending;
        let (session, action) =
            transition(session, analyzed(DemandProfile::new(), UserIntent::Chat, false), &DialoguePolicy::default());
        assert_eq!(action, Action::Chat);
        assert_eq!(session.state, DialogueState::Recommending);

        let (session, action) =
            transition(session, analyzed(DemandProfile::new(), UserIntent::Compare, false), &DialoguePolicy::default());
        assert_eq!(action, Action::Compare);
        assert_eq!(session.state, DialogueState::Comparing);
    }

    #[test]
    fn more_options_excludes_previous() {
        let mut session = Session::new("s");
        session.state = DialogueState::Recommending;
        session.last_recommended = vec!["xiaomi-13".into()];
        let (_, action) =
            transition(session, analyzed(DemandProfile::new(), UserIntent::MoreOptions, false), &DialoguePolicy::default());
        assert_eq!(action, Action::Recommend { exclude_previous: true });
    }
}
