use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub engine: EngineConfig,
    pub analyzer: AnalyzerConfig,
    pub dialogue: DialogueConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub top_k: usize,
    /// Share of the distance-derived similarity in the blended score.
    /// The remainder goes to cosine similarity.
    pub euclidean_blend: f64,
    /// Scores closer than this are ordered by rating, then popularity.
    pub tie_epsilon: f64,
    /// Score reduction per unit of relative distance outside a flexible budget.
    pub flexible_penalty_slope: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            euclidean_blend: crate::engine::DEFAULT_EUCLIDEAN_BLEND,
            tie_epsilon: 1e-4,
            flexible_penalty_slope: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Confidence attached to fields set by the rule tier. Always below `llm_confidence`.
    pub rule_confidence: f64,
    /// Ceiling for fields set by the model tier.
    pub llm_confidence: f64,
    /// Weight given to dimensions nobody talked about.
    pub weight_floor: f64,
    /// Half-width of the band derived from an approximate amount ("around 5000").
    pub approximate_band: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            rule_confidence: 0.6,
            llm_confidence: 0.85,
            weight_floor: 0.02,
            approximate_band: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    pub recommend_threshold: f64,
    /// Number of recent user messages rendered into model prompts.
    pub history_window: usize,
    pub compare_count: usize,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            recommend_threshold: 0.7,
            history_window: 5,
            compare_count: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayKind {
    Offline,
    LlamaServer,
    ChatCompletions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub kind: GatewayKind,
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key, never the key itself.
    pub api_key_env: Option<String>,
    pub timeout_ms: u64,
    pub turn_timeout_ms: u64,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            kind: GatewayKind::Offline,
            base_url: "http://localhost:8080".to_string(),
            model: String::new(),
            api_key_env: None,
            timeout_ms: 3_000,
            turn_timeout_ms: 8_000,
            max_tokens: 512,
            temperature: 0.4,
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_ms)
    }

    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|key| !key.is_empty())
    }
}

impl AdvisorConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: AdvisorConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&raw)?;
        info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Environment overrides, applied after file loading.
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(kind) = std::env::var("ADVISOR_GATEWAY_KIND") {
            self.gateway.kind = match kind.trim().to_ascii_lowercase().as_str() {
                "offline" => GatewayKind::Offline,
                "llama_server" | "llama" => GatewayKind::LlamaServer,
                "chat_completions" | "openai" => GatewayKind::ChatCompletions,
                other => {
                    return Err(ConfigError::Invalid {
                        field: "gateway.kind",
                        reason: format!("unknown gateway kind '{}'", other),
                    })
                }
            };
        }
        if let Ok(url) = std::env::var("ADVISOR_GATEWAY_URL") {
            self.gateway.base_url = url;
        }
        if let Ok(model) = std::env::var("ADVISOR_MODEL") {
            self.gateway.model = model;
        }
        if let Ok(top_k) = std::env::var("ADVISOR_TOP_K") {
            self.engine.top_k = top_k.trim().parse().map_err(|_| ConfigError::Invalid {
                field: "engine.top_k",
                reason: format!("'{}' is not a number", top_k),
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = |field: &'static str, value: f64| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("{} is outside [0, 1]", value),
                })
            }
        };

        if self.engine.top_k == 0 {
            return Err(ConfigError::Invalid {
                field: "engine.top_k",
                reason: "must be at least 1".to_string(),
            });
        }
        unit("engine.euclidean_blend", self.engine.euclidean_blend)?;
        unit("engine.tie_epsilon", self.engine.tie_epsilon)?;
        if !(self.engine.flexible_penalty_slope >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "engine.flexible_penalty_slope",
                reason: "must be non-negative".to_string(),
            });
        }
        unit("analyzer.rule_confidence", self.analyzer.rule_confidence)?;
        unit("analyzer.llm_confidence", self.analyzer.llm_confidence)?;
        if self.analyzer.rule_confidence >= self.analyzer.llm_confidence {
            return Err(ConfigError::Invalid {
                field: "analyzer.rule_confidence",
                reason: "must stay below analyzer.llm_confidence".to_string(),
            });
        }
        if !(self.analyzer.weight_floor > 0.0 && self.analyzer.weight_floor < 1.0 / 6.0) {
            return Err(ConfigError::Invalid {
                field: "analyzer.weight_floor",
                reason: "must be in (0, 1/6)".to_string(),
            });
        }
        unit("analyzer.approximate_band", self.analyzer.approximate_band)?;
        unit("dialogue.recommend_threshold", self.dialogue.recommend_threshold)?;
        if self.dialogue.compare_count < 2 {
            return Err(ConfigError::Invalid {
                field: "dialogue.compare_count",
                reason: "a comparison needs at least 2 phones".to_string(),
            });
        }
        if self.gateway.timeout_ms == 0 || self.gateway.turn_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "gateway.timeout_ms",
                reason: "timeouts must be positive".to_string(),
            });
        }
        Ok(())
    }
}
