/// Chat completion provider abstraction
///
/// The recommender talks to the hosted model only through this trait, so the
/// OpenRouter client can be swapped for another OpenAI-compatible endpoint or
/// a mock in tests.
use crate::{
    error::AppResult,
    models::{ChatCompletionRequest, ChatCompletionResponse},
};

pub mod openrouter;

pub use openrouter::OpenRouterProvider;

/// Trait for chat completion backends
///
/// Exactly one remote call per `complete`; no retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send one chat completion request and return the decoded response
    async fn complete(&self, request: ChatCompletionRequest) -> AppResult<ChatCompletionResponse>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
