use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Contract faults raised by the recommendation engine.
/// A ranking is never produced from invalid input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("top_k must be at least 1")]
    InvalidTopK,
    #[error("weight for {dimension} is invalid: {value}")]
    InvalidWeight { dimension: &'static str, value: f64 },
    #[error("candidate {id} is invalid: {reason}")]
    InvalidCandidate { id: String, reason: String },
    #[error("candidate id {0} appears more than once")]
    DuplicateCandidate(String),
}

/// Failures of the language model gateway. All of them are recoverable:
/// callers fall back to the deterministic path.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway timed out after {0} ms")]
    Timeout(u64),
    #[error("gateway transport error: {0}")]
    Transport(String),
    #[error("gateway returned status {0}")]
    Status(u16),
    #[error("gateway returned malformed output: {0}")]
    Malformed(String),
    #[error("gateway unavailable")]
    Unavailable,
}

/// Content-free classification of a gateway failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeCause {
    Timeout,
    Transport,
    Status,
    Malformed,
    Unavailable,
}

impl DegradeCause {
    pub fn as_str(self) -> &'static str {
        match self {
            DegradeCause::Timeout => "timeout",
            DegradeCause::Transport => "transport",
            DegradeCause::Status => "status",
            DegradeCause::Malformed => "malformed",
            DegradeCause::Unavailable => "unavailable",
        }
    }
}

impl GatewayError {
    pub fn cause(&self) -> DegradeCause {
        match self {
            GatewayError::Timeout(_) => DegradeCause::Timeout,
            GatewayError::Transport(_) => DegradeCause::Transport,
            GatewayError::Status(_) => DegradeCause::Status,
            GatewayError::Malformed(_) => DegradeCause::Malformed,
            GatewayError::Unavailable => DegradeCause::Unavailable,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout(0)
        } else if e.is_decode() {
            GatewayError::Malformed(e.to_string())
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
