#![allow(dead_code)]

use async_trait::async_trait;
use device_advisor::catalog::{sample_catalog, Candidate, DimensionScores, StaticCatalog};
use device_advisor::config::AdvisorConfig;
use device_advisor::dialogue::{DialogueController, InMemorySessionStore};
use device_advisor::error::GatewayError;
use device_advisor::services::llm::{LanguageModelGateway, OfflineGateway};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Answers extraction prompts with `extraction` and everything else with `prose`.
pub struct ScriptedGateway {
    pub extraction: String,
    pub prose: String,
    pub calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(extraction: &str, prose: &str) -> Self {
        Self {
            extraction: extraction.to_string(),
            prose: prose.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LanguageModelGateway for ScriptedGateway {
    async fn complete(&self, prompt: &str, _timeout: Duration) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if prompt.starts_with("You extract") {
            Ok(self.extraction.clone())
        } else {
            Ok(self.prose.clone())
        }
    }
}

/// Never answers.
pub struct PendingGateway;

#[async_trait]
impl LanguageModelGateway for PendingGateway {
    async fn complete(&self, _prompt: &str, _timeout: Duration) -> Result<String, GatewayError> {
        std::future::pending::<()>().await;
        Err(GatewayError::Unavailable)
    }
}

pub fn controller_with(config: AdvisorConfig, gateway: Arc<dyn LanguageModelGateway>) -> DialogueController {
    DialogueController::new(
        config,
        gateway,
        Arc::new(StaticCatalog::new(sample_catalog())),
        Arc::new(InMemorySessionStore::new()),
    )
}

pub fn offline_controller() -> DialogueController {
    controller_with(AdvisorConfig::default(), Arc::new(OfflineGateway))
}

pub fn candidate(id: &str, brand: &str, price: f64, scores: [f64; 6], rating: f64, popularity: u64) -> Candidate {
    Candidate {
        id: id.to_string(),
        name: id.to_string(),
        brand: brand.to_string(),
        price,
        scores: DimensionScores::new(scores),
        popularity,
        rating,
        highlights: Vec::new(),
        specs: None,
    }
}
