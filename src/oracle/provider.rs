//! Completion Providers
//!
//! The transport boundary behind the move oracle: an OpenAI-style
//! chat-completion endpoint asked, in plain language, to name a move.
//! Every failure here is recoverable by design; the oracle turns it into
//! a random fallback move and the match never notices.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::rng::DeterministicRng;
use crate::game::moves::Move;

/// Default completion endpoint (OpenRouter, OpenAI-compatible).
pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default completion model.
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";

/// Default request deadline. A hung request becomes a transport failure,
/// which becomes a fallback move.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Completion endpoint configuration.
#[derive(Clone, Debug)]
pub struct OracleConfig {
    /// Chat-completion endpoint URL.
    pub api_url: String,
    /// Bearer API key. Without one the binary uses the simulated provider.
    pub api_key: Option<String>,
    /// Model identifier sent with each request.
    pub model: String,
    /// Per-request deadline.
    pub request_timeout: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl OracleConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("ARENA_ORACLE_URL").unwrap_or(defaults.api_url),
            api_key: std::env::var("ARENA_ORACLE_KEY").ok().filter(|k| !k.is_empty()),
            model: std::env::var("ARENA_ORACLE_MODEL").unwrap_or(defaults.model),
            request_timeout: defaults.request_timeout,
        }
    }

    /// Whether an API key is available.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Completion failures. All of them are recoverable at the oracle.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// No API key configured.
    #[error("no API key configured")]
    NoApiKey,

    /// Transport-level failure (connect, TLS, deadline expiry).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Endpoint replied with a non-success status.
    #[error("completion endpoint returned status {0}")]
    BadStatus(u16),

    /// Response body carried no completion text.
    #[error("response body had no completion text")]
    MalformedBody,
}

/// The external text-completion capability.
///
/// Object-safe so the gateway can run against the HTTP endpoint, the
/// simulated provider, or a scripted one in tests.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Submit a prompt and return the raw completion text.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

// =============================================================================
// HTTP PROVIDER
// =============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatContent,
}

#[derive(Deserialize)]
struct ChatContent {
    content: String,
}

/// Chat-completion client over HTTPS.
pub struct HttpCompletionProvider {
    client: reqwest::Client,
    config: OracleConfig,
}

impl HttpCompletionProvider {
    /// Build a client with the configured request deadline.
    pub fn new(config: OracleConfig) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(CompletionError::NoApiKey)?;

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompletionError::BadStatus(status.as_u16()));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|_| CompletionError::MalformedBody)?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::MalformedBody)?;
        Ok(choice.message.content)
    }
}

// =============================================================================
// SIMULATED / SCRIPTED PROVIDERS
// =============================================================================

/// Stands in for the external service when no API key is configured:
/// replies with a uniformly random move name.
pub struct SimulatedProvider {
    rng: Mutex<DeterministicRng>,
}

impl SimulatedProvider {
    /// Create a simulated provider with a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(DeterministicRng::new(seed)),
        }
    }
}

#[async_trait]
impl CompletionProvider for SimulatedProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let chosen = *rng.choose(&Move::ALL).unwrap_or(&Move::Rock);
        Ok(chosen.name().to_string())
    }
}

/// Replays a fixed sequence of canned results, then fails.
///
/// For tests and demos that need exact control over replies and failure
/// injection.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
}

impl ScriptedProvider {
    /// Create a provider that yields `replies` in order.
    pub fn new(replies: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
        }
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        let mut replies = self.replies.lock().unwrap_or_else(PoisonError::into_inner);
        replies.pop_front().unwrap_or(Err(CompletionError::MalformedBody))
    }
}

// =============================================================================
// TESTS
// =============================================================================
