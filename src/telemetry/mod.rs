//! Conversation telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a write-only side-effect layer. It is never read by the
//! analyzer, the engine or the dialogue transition.
//!
//! # PRIVACY INVARIANT
//! Events never contain user text, model output or profile values. Only
//! enums, counts and durations are allowed.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::{GatewayStage, TelemetryEvent};
pub use metrics::{compute_snapshot, TelemetrySnapshot};
pub use recorder::TelemetryRecorder;
