use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::LanguageModelGateway;
use crate::config::GatewayConfig;
use crate::error::GatewayError;

fn http_client(config: &GatewayConfig) -> Client {
    Client::builder()
        .timeout(config.timeout()) // network-level ceiling; callers pass tighter per-call limits
        .build()
        .unwrap_or_default()
}

fn check_status(response: &reqwest::Response) -> Result<(), GatewayError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(GatewayError::Status(status.as_u16()))
    }
}

fn map_timeout(e: GatewayError, timeout: Duration) -> GatewayError {
    match e {
        GatewayError::Timeout(_) => GatewayError::Timeout(timeout.as_millis() as u64),
        other => other,
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    stream: bool,
    n_predict: usize,
    temperature: f32,
    stop: Vec<String>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    content: String,
}

/// llama.cpp `llama-server` one-shot `/completion` endpoint.
#[derive(Clone)]
pub struct LlamaServerGateway {
    client: Client,
    base_url: String,
    max_tokens: usize,
    temperature: f32,
}

impl LlamaServerGateway {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: http_client(config),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl LanguageModelGateway for LlamaServerGateway {
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, GatewayError> {
        let full_prompt = format!("User: {}\nAssistant:", prompt);
        let request_body = CompletionRequest {
            prompt: &full_prompt,
            stream: false,
            n_predict: self.max_tokens,
            temperature: self.temperature,
            stop: vec!["User:".to_string(), "System:".to_string()],
        };

        let response = self
            .client
            .post(format!("{}/completion", self.base_url))
            .timeout(timeout)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| map_timeout(e.into(), timeout))?;
        check_status(&response)?;

        let body: CompletionResponse = response.json().await.map_err(|e| map_timeout(e.into(), timeout))?;
        debug!(chars = body.content.len(), "llama-server completion received");
        Ok(body.content.trim().to_string())
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatCompletionsGateway {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_tokens: usize,
    temperature: f32,
}

impl ChatCompletionsGateway {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: http_client(config),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl LanguageModelGateway for ChatCompletionsGateway {
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, GatewayError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(timeout)
            .json(&request_body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| map_timeout(e.into(), timeout))?;
        check_status(&response)?;

        let body: ChatResponse = response.json().await.map_err(|e| map_timeout(e.into(), timeout))?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .ok_or_else(|| GatewayError::Malformed("no choices in reply".into()))
    }
}
