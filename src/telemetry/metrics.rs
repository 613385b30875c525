use std::collections::{HashMap, VecDeque};
use serde::Serialize;

use super::event::{GatewayStage, TelemetryEvent};
use crate::error::DegradeCause;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub turn_stats: TurnStats,
    pub gateway_stats: GatewayStats,
    pub dialogue_stats: DialogueStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TurnStats {
    pub count: u64,
    pub total_ms: u64,
    pub avg_ms: f64,
    pub max_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GatewayStats {
    pub degraded: u64,
    pub by_stage: HashMap<GatewayStage, u64>,
    pub by_cause: HashMap<DegradeCause, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DialogueStats {
    pub clarifications: u64,
    pub recommendations: u64,
    pub comparisons: u64,
    pub empty_results: u64,
    pub transitions: u64,
    pub candidates_shown: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::GatewayDegraded { stage, cause } => {
                snap.gateway_stats.degraded += 1;
                *snap.gateway_stats.by_stage.entry(*stage).or_default() += 1;
                *snap.gateway_stats.by_cause.entry(*cause).or_default() += 1;
            }
            TelemetryEvent::ClarificationAsked { .. } => snap.dialogue_stats.clarifications += 1,
            TelemetryEvent::RecommendationEmitted { count } => {
                snap.dialogue_stats.recommendations += 1;
                snap.dialogue_stats.candidates_shown += *count as u64;
            }
            TelemetryEvent::ComparisonEmitted { .. } => snap.dialogue_stats.comparisons += 1,
            TelemetryEvent::EmptyResult { .. } => snap.dialogue_stats.empty_results += 1,
            TelemetryEvent::StateTransition { from, to } => {
                if from != to {
                    snap.dialogue_stats.transitions += 1;
                }
            }
            TelemetryEvent::TurnCompleted { elapsed_ms } => {
                snap.turn_stats.count += 1;
                snap.turn_stats.total_ms += elapsed_ms;
                snap.turn_stats.max_ms = snap.turn_stats.max_ms.max(*elapsed_ms);
            }
        }
    }

    if snap.turn_stats.count > 0 {
        snap.turn_stats.avg_ms = snap.turn_stats.total_ms as f64 / snap.turn_stats.count as f64;
    }

    snap
}
