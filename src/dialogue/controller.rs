use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use super::intent::classify;
use super::state::{DialogueState, QuestionKind, Session, Speaker};
use super::store::{InMemorySessionStore, SessionStore};
use super::templates;
use super::transition::{transition, Action, DialoguePolicy, TurnEvent};
use crate::analyzer::{ConversationContext, DemandAnalyzer, DemandProfile};
use crate::catalog::{price_range, sample_catalog, Candidate, CatalogProvider, StaticCatalog};
use crate::config::AdvisorConfig;
use crate::engine::{recommend, EmptyReason, Recommendation, ScoredCandidate};
use crate::error::{DegradeCause, GatewayError};
use crate::services::llm::{build_gateway, LanguageModelGateway};
use crate::telemetry::{GatewayStage, TelemetryEvent, TelemetryRecorder, TelemetrySnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Clarify,
    Recommend,
    Compare,
    Chat,
}

impl From<&Action> for ActionKind {
    fn from(action: &Action) -> Self {
        match action {
            Action::Clarify(_) => ActionKind::Clarify,
            Action::Recommend { .. } => ActionKind::Recommend,
            Action::Compare => ActionKind::Compare,
            Action::Chat => ActionKind::Chat,
        }
    }
}

/// What one user turn produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResponse {
    pub session_id: String,
    /// 1-based turn number within the session.
    pub turn: u64,
    pub state: DialogueState,
    pub action: ActionKind,
    pub message: String,
    pub question_kind: Option<QuestionKind>,
    pub recommendations: Vec<ScoredCandidate>,
    /// At least one model call fell back to the deterministic path.
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub turns: u64,
    pub asked_count: usize,
    pub state: DialogueState,
    pub confidence: f64,
}

/// Outcome of executing an action, before it is written back to the session.
struct Executed {
    message: String,
    recommendations: Vec<ScoredCandidate>,
    degraded: bool,
}

/// Drives conversations. Shareable across tasks; per-session ordering is the caller's job.
pub struct DialogueController {
    config: AdvisorConfig,
    policy: DialoguePolicy,
    analyzer: DemandAnalyzer,
    gateway: Arc<dyn LanguageModelGateway>,
    catalog: Arc<dyn CatalogProvider>,
    store: Arc<dyn SessionStore>,
    telemetry: Mutex<TelemetryRecorder>,
}

impl DialogueController {
    pub fn new(
        config: AdvisorConfig,
        gateway: Arc<dyn LanguageModelGateway>,
        catalog: Arc<dyn CatalogProvider>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            policy: DialoguePolicy::from(&config.dialogue),
            analyzer: DemandAnalyzer::new(config.analyzer.clone(), gateway.clone()),
            config,
            gateway,
            catalog,
            store,
            telemetry: Mutex::new(TelemetryRecorder::new()),
        }
    }

    /// Gateway from config, the built-in sample catalog and an in-memory store.
    pub fn with_defaults(config: AdvisorConfig) -> Self {
        let gateway = build_gateway(&config.gateway);
        Self::new(
            config,
            gateway,
            Arc::new(StaticCatalog::new(sample_catalog())),
            Arc::new(InMemorySessionStore::new()),
        )
    }

    pub fn telemetry_snapshot(&self) -> TelemetrySnapshot {
        self.telemetry.lock().snapshot()
    }

    pub fn session_summary(&self, session_id: &str) -> Option<SessionSummary> {
        self.store.load(session_id).map(|s| SessionSummary {
            turns: s.turn_count,
            asked_count: s.asked.len(),
            state: s.state,
            confidence: s.profile.confidence,
        })
    }

    fn record(&self, event: TelemetryEvent) {
        self.telemetry.lock().record(event);
    }

    fn degrade(&self, stage: GatewayStage, cause: DegradeCause) {
        self.record(TelemetryEvent::GatewayDegraded { stage, cause });
    }

    /// Time left for one model call: the gateway timeout, capped by what remains of the turn.
    fn call_budget(&self, deadline: Instant) -> Duration {
        self.config
            .gateway
            .timeout()
            .min(deadline.saturating_duration_since(Instant::now()))
    }

    /// One bounded model call whose reply must pass `sanitize`.
    async fn phrase(
        &self,
        stage: GatewayStage,
        prompt: String,
        deadline: Instant,
        sanitize: fn(&str) -> Option<String>,
    ) -> Result<String, DegradeCause> {
        let budget = self.call_budget(deadline);
        let reply = if budget.is_zero() {
            Err(GatewayError::Timeout(0))
        } else {
            tokio::time::timeout(budget, self.gateway.complete(&prompt, budget))
                .await
                .unwrap_or(Err(GatewayError::Timeout(budget.as_millis() as u64)))
        };

        let result = match reply {
            Ok(text) => sanitize(&text).ok_or_else(|| GatewayError::Malformed("reply rejected by sanitizer".into())),
            Err(e) => Err(e),
        };
        result.map_err(|e| {
            warn!(stage = ?stage, cause = e.cause().as_str(), "model phrasing degraded: {}", e);
            self.degrade(stage, e.cause());
            e.cause()
        })
    }

    pub async fn handle_turn(&self, session_id: &str, text: &str) -> TurnResponse {
        let started = Instant::now();
        let deadline = started + self.config.gateway.turn_timeout();

        let mut session = self.store.load(session_id).unwrap_or_else(|| Session::new(session_id));
        let candidates = self.catalog.list_candidates();
        let context = ConversationContext {
            recent_user_messages: session.recent_user_messages(self.config.dialogue.history_window),
            asked: session.asked.iter().copied().collect(),
            catalog_price_range: price_range(&candidates),
        };

        let analysis = self
            .analyzer
            .analyze(text, &session.profile, &context, self.call_budget(deadline))
            .await;
        if let Some(cause) = analysis.degraded_cause {
            self.degrade(GatewayStage::Extraction, cause);
        }
        let intent = classify(text, analysis.carried_demand, analysis.intent_hint);

        let from = session.state;
        session.record(Speaker::User, text);
        let event = TurnEvent::Analyzed {
            profile: analysis.profile,
            intent,
            changed: analysis.changed,
        };
        let (mut session, action) = transition(session, event, &self.policy);

        let executed = match action {
            Action::Clarify(kind) => self.clarify(kind, &session.profile, &context, deadline).await,
            Action::Recommend { exclude_previous } => {
                self.recommend(&mut session, &candidates, exclude_previous, deadline).await
            }
            Action::Compare => self.compare(&mut session, &candidates, deadline).await,
            Action::Chat => self.chat(text, deadline).await,
        };

        session.record(Speaker::Assistant, executed.message.clone());
        session.turn_count += 1;
        let response = TurnResponse {
            session_id: session.id.clone(),
            turn: session.turn_count,
            state: session.state,
            action: ActionKind::from(&action),
            message: executed.message,
            question_kind: match action {
                Action::Clarify(kind) => Some(kind),
                _ => None,
            },
            recommendations: executed.recommendations,
            degraded: analysis.degraded || executed.degraded,
        };
        self.store.save(session);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.record(TelemetryEvent::StateTransition { from, to: response.state });
        self.record(TelemetryEvent::TurnCompleted { elapsed_ms });
        info!(
            session = %response.session_id,
            turn = response.turn,
            state = response.state.as_str(),
            action = ?response.action,
            degraded = response.degraded,
            elapsed_ms,
            "turn handled"
        );
        response
    }

    async fn clarify(
        &self,
        kind: QuestionKind,
        profile: &DemandProfile,
        context: &ConversationContext,
        deadline: Instant,
    ) -> Executed {
        self.record(TelemetryEvent::ClarificationAsked { kind });
        let prompt = templates::clarify_prompt(kind, profile, &context.render());
        let phrased = self
            .phrase(GatewayStage::Clarification, prompt, deadline, templates::sanitize_question)
            .await;
        Executed {
            degraded: phrased.is_err(),
            message: phrased.unwrap_or_else(|_| templates::clarify_question(kind)),
            recommendations: Vec::new(),
        }
    }

    async fn recommend(
        &self,
        session: &mut Session,
        candidates: &[Candidate],
        exclude_previous: bool,
        deadline: Instant,
    ) -> Executed {
        let pool: Vec<Candidate> = if exclude_previous {
            candidates
                .iter()
                .filter(|c| !session.last_recommended.contains(&c.id))
                .cloned()
                .collect()
        } else {
            candidates.to_vec()
        };

        match recommend(&session.profile, &pool, self.config.engine.top_k, &self.config.engine) {
            Ok(Recommendation::Ranked(ranked)) => {
                self.record(TelemetryEvent::RecommendationEmitted { count: ranked.len() });
                session.state = DialogueState::Recommending;
                session.last_recommended = ranked.iter().map(|r| r.candidate_id.clone()).collect();

                let prompt = templates::recommend_prompt(&ranked, &session.profile);
                let phrased = self
                    .phrase(GatewayStage::Recommendation, prompt, deadline, templates::sanitize_prose)
                    .await;
                Executed {
                    degraded: phrased.is_err(),
                    message: phrased.unwrap_or_else(|_| {
                        templates::recommendation_message(&ranked, &session.profile, exclude_previous)
                    }),
                    recommendations: ranked,
                }
            }
            Ok(Recommendation::Empty(reason)) => {
                // Everything was shown already: the catalog itself is not empty.
                let reason = if exclude_previous && !candidates.is_empty() {
                    EmptyReason::NoSurvivors
                } else {
                    reason
                };
                self.record(TelemetryEvent::EmptyResult { reason });
                session.state = DialogueState::Collecting;
                Executed {
                    message: templates::empty_message(reason, &session.profile),
                    recommendations: Vec::new(),
                    degraded: false,
                }
            }
            Err(e) => {
                error!(session = %session.id, "recommendation engine rejected its input: {}", e);
                Executed {
                    message: templates::apology(),
                    recommendations: Vec::new(),
                    degraded: false,
                }
            }
        }
    }

    async fn compare(&self, session: &mut Session, candidates: &[Candidate], deadline: Instant) -> Executed {
        let pool: Vec<Candidate> = if session.last_recommended.is_empty() {
            candidates.to_vec()
        } else {
            candidates
                .iter()
                .filter(|c| session.last_recommended.contains(&c.id))
                .cloned()
                .collect()
        };

        let ranked = match recommend(&session.profile, &pool, self.config.dialogue.compare_count, &self.config.engine) {
            Ok(Recommendation::Ranked(ranked)) => ranked,
            Ok(Recommendation::Empty(reason)) => {
                self.record(TelemetryEvent::EmptyResult { reason });
                return Executed {
                    message: templates::empty_message(reason, &session.profile),
                    recommendations: Vec::new(),
                    degraded: false,
                };
            }
            Err(e) => {
                error!(session = %session.id, "comparison ranking rejected its input: {}", e);
                return Executed {
                    message: templates::apology(),
                    recommendations: Vec::new(),
                    degraded: false,
                };
            }
        };

        let entries: Vec<&Candidate> = ranked
            .iter()
            .filter_map(|r| pool.iter().find(|c| c.id == r.candidate_id))
            .collect();
        self.record(TelemetryEvent::ComparisonEmitted { count: entries.len() });

        if entries.len() < 2 {
            return Executed {
                message: templates::comparison_message(&entries),
                recommendations: ranked,
                degraded: false,
            };
        }

        let phrased = self
            .phrase(GatewayStage::Comparison, templates::compare_prompt(&entries), deadline, templates::sanitize_prose)
            .await;
        Executed {
            degraded: phrased.is_err(),
            message: phrased.unwrap_or_else(|_| templates::comparison_message(&entries)),
            recommendations: ranked,
        }
    }

    async fn chat(&self, text: &str, deadline: Instant) -> Executed {
        let phrased = self
            .phrase(GatewayStage::Chat, templates::chat_prompt(text), deadline, templates::sanitize_prose)
            .await;
        Executed {
            degraded: phrased.is_err(),
            message: phrased.unwrap_or_else(|_| templates::chat_reply()),
            recommendations: Vec::new(),
        }
    }
}
