//! The LLM client contract agents reason through: `Think` for text
//! completion, `Embed` for the 1536-dim vectors memory entries carry.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm call timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("llm backend error: {0}")]
    Backend(String),
}

/// Implementations must be thread-safe (`Send + Sync`, shareable behind an
/// `Arc`) and must honor whatever timeout was configured at construction —
/// the trait itself carries no per-call deadline parameter, matching the
/// external LLM client contract.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn think(&self, prompt: &str, ctx: Option<Value>) -> Result<String, LlmError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;
}

/// Wraps an [`crate::ai::provider::LLMProvider`] as an [`LlmClient`]: the
/// bridge between the provider abstraction the teacher's desktop app used
/// for chat completions and the plain `think`/`embed` contract agent
/// runtimes call through.
///
/// `embed` has nothing to delegate to — no provider in `ai::provider`
/// exposes an embeddings endpoint — so it always returns
/// `LlmError::Backend`. Memory-similarity recall (`memory-vector` feature)
/// is therefore unavailable until a provider grows embedding support.
pub struct ProviderLlmClient {
    provider: std::sync::Arc<dyn crate::ai::provider::LLMProvider>,
    model: String,
    call_timeout: std::time::Duration,
}

impl ProviderLlmClient {
    pub fn new(
        provider: std::sync::Arc<dyn crate::ai::provider::LLMProvider>,
        model: impl Into<String>,
        call_timeout: std::time::Duration,
    ) -> Self {
        Self { provider, model: model.into(), call_timeout }
    }
}

#[async_trait]
impl LlmClient for ProviderLlmClient {
    async fn think(&self, prompt: &str, ctx: Option<Value>) -> Result<String, LlmError> {
        use crate::ai::types::{CompletionRequest, Message};

        let mut messages = Vec::new();
        if let Some(ctx) = ctx {
            messages.push(Message::system(ctx.to_string()));
        }
        messages.push(Message::user(prompt));
        let request = CompletionRequest::new(self.model.clone(), messages);

        match tokio::time::timeout(self.call_timeout, self.provider.complete(request)).await {
            Ok(Ok(response)) => Ok(response.content),
            Ok(Err(e)) => Err(LlmError::Backend(e)),
            Err(_) => Err(LlmError::Timeout(self.call_timeout)),
        }
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
        Err(LlmError::Backend("configured provider does not support embeddings".to_string()))
    }
}

#[cfg(test)]
pub(crate) mod test_double {
    use super::*;

    /// Deterministic stand-in used by the company module's own tests; real
    /// provider wiring lives outside this crate's scope.
    pub struct EchoLlmClient;

    #[async_trait]
    impl LlmClient for EchoLlmClient {
        async fn think(&self, prompt: &str, _ctx: Option<Value>) -> Result<String, LlmError> {
            Ok(format!("echo: {prompt}"))
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
            Ok(vec![0.0; 1536])
        }
    }
}
