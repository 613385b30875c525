//! Language model gateways. Every call is advisory: callers treat any
//! `GatewayError` as "use the deterministic fallback".

mod client;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{GatewayConfig, GatewayKind};
use crate::error::GatewayError;

pub use client::{ChatCompletionsGateway, LlamaServerGateway};

/// Text in, text out. Implementations must honour `timeout` for the whole call.
#[async_trait]
pub trait LanguageModelGateway: Send + Sync {
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, GatewayError>;
}

/// Always unavailable. The analyzer and templates carry the whole conversation.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGateway;

#[async_trait]
impl LanguageModelGateway for OfflineGateway {
    async fn complete(&self, _prompt: &str, _timeout: Duration) -> Result<String, GatewayError> {
        Err(GatewayError::Unavailable)
    }
}

pub fn build_gateway(config: &GatewayConfig) -> Arc<dyn LanguageModelGateway> {
    info!(kind = ?config.kind, base_url = %config.base_url, "building language model gateway");
    match config.kind {
        GatewayKind::Offline => Arc::new(OfflineGateway),
        GatewayKind::LlamaServer => Arc::new(LlamaServerGateway::new(config)),
        GatewayKind::ChatCompletions => Arc::new(ChatCompletionsGateway::new(config)),
    }
}
