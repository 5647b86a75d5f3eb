/// OpenRouter chat completion provider
///
/// Speaks the OpenAI-compatible `/chat/completions` endpoint with bearer
/// authentication.
use reqwest::Client as HttpClient;

use crate::{
    error::{AppError, AppResult},
    models::{ChatCompletionRequest, ChatCompletionResponse},
    services::providers::CompletionProvider,
};

#[derive(Clone)]
pub struct OpenRouterProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl OpenRouterProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_url)
    }
}

impl std::fmt::Debug for OpenRouterProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterProvider")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait::async_trait]
impl CompletionProvider for OpenRouterProvider {
    async fn complete(&self, request: ChatCompletionRequest) -> AppResult<ChatCompletionResponse> {
        tracing::info!(
            model = %request.model,
            provider = self.name(),
            "Sending chat completion request"
        );

        let response = self
            .http_client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OpenRouter API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        tracing::debug!(response = %response_text, "Raw OpenRouter API response");

        let completion: ChatCompletionResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                tracing::error!(
                    error = %e,
                    response = %response_text,
                    "Failed to deserialize OpenRouter response"
                );
                AppError::ExternalApi(format!("Failed to parse OpenRouter response: {}", e))
            })?;

        if let Some(error) = &completion.error {
            return Err(AppError::ExternalApi(format!(
                "OpenRouter API error: {}",
                error.message
            )));
        }

        Ok(completion)
    }

    fn name(&self) -> &'static str {
        "openrouter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatMessage;

    #[test]
    fn test_completions_url_strips_trailing_slash() {
        let provider =
            OpenRouterProvider::new("key".to_string(), "https://openrouter.ai/api/v1/".to_string());
        assert_eq!(
            provider.completions_url(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let provider = OpenRouterProvider::new(
            "sk-or-secret".to_string(),
            "https://openrouter.ai/api/v1".to_string(),
        );
        let rendered = format!("{:?}", provider);
        assert!(!rendered.contains("sk-or-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_http_client_error() {
        let provider =
            OpenRouterProvider::new("key".to_string(), "http://127.0.0.1:1/api/v1".to_string());
        let request = ChatCompletionRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage::user("hi")],
            temperature: 0.7,
            max_tokens: 10,
        };

        let result = provider.complete(request).await;
        assert!(matches!(result, Err(AppError::HttpClient(_))));
    }
}
