pub mod analyzer;
pub mod catalog;
pub mod config;
pub mod dialogue;
pub mod engine;
pub mod error;
pub mod services;
pub mod telemetry;

pub use config::AdvisorConfig;
pub use dialogue::{DialogueController, TurnResponse};
pub use engine::{recommend, Recommendation, ScoredCandidate};
pub use error::{ConfigError, EngineError, GatewayError};
