use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        recommendation::error_text, AnimeRecord, ChatCompletionRequest, ChatMessage,
        DebugSnapshot, Recommendation, RecommendationRequest, RequestSnapshot, ResponseSnapshot,
    },
    services::{
        prompt,
        providers::{CompletionProvider, OpenRouterProvider},
    },
    storage,
};

pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Picks the first non-blank credential
pub fn resolve_api_key(explicit: Option<String>, fallback: Option<String>) -> AppResult<String> {
    explicit
        .into_iter()
        .chain(fallback)
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
        .ok_or_else(|| {
            AppError::Configuration(format!(
                "OpenRouter API key is required. Set {} environment variable or pass it explicitly.",
                API_KEY_ENV
            ))
        })
}

/// Builds prompts from a loaded record set and asks the hosted model for picks
///
/// Holds the loaded records and the debug snapshot of the latest call. Every
/// failure after construction is returned as a value; the loaded records are
/// never touched by a failing call.
#[derive(Clone)]
pub struct Recommender {
    provider: Arc<dyn CompletionProvider>,
    model_id: String,
    season: String,
    records: Vec<AnimeRecord>,
    source: Option<PathBuf>,
    debug: DebugSnapshot,
}

impl Recommender {
    /// Creates a recommender backed by OpenRouter
    ///
    /// The key comes from `api_key`, then the configuration, then the
    /// `OPENROUTER_API_KEY` environment variable.
    pub fn new(api_key: Option<String>, config: &Config) -> AppResult<Self> {
        let fallback = config
            .openrouter_api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok());
        let api_key = resolve_api_key(api_key, fallback)?;

        let provider = OpenRouterProvider::new(api_key, config.openrouter_api_url.clone());
        Ok(Self::with_provider(
            Arc::new(provider),
            config.model_id.clone(),
            config.season.clone(),
        ))
    }

    pub fn with_provider(
        provider: Arc<dyn CompletionProvider>,
        model_id: impl Into<String>,
        season: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model_id: model_id.into(),
            season: season.into(),
            records: Vec::new(),
            source: None,
            debug: DebugSnapshot::default(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn records(&self) -> &[AnimeRecord] {
        &self.records
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// File the current records were loaded from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Replaces the loaded records with the contents of `path`
    ///
    /// On failure the previously loaded records stay in place.
    pub async fn load_records(&mut self, path: &Path) -> AppResult<usize> {
        match storage::read_record_set(path).await {
            Ok(records) => {
                tracing::info!(
                    path = %path.display(),
                    records = records.len(),
                    "Anime data loaded"
                );
                self.records = records;
                self.source = Some(path.to_path_buf());
                Ok(self.records.len())
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Error loading anime data");
                Err(e)
            }
        }
    }

    pub fn build_context(&self, max_entries: usize) -> String {
        prompt::build_context(&self.records, max_entries, &self.season)
    }

    /// Performs one chat completion for `request`
    ///
    /// Returns `NoData` without any remote call when nothing is loaded.
    /// Transport and API failures are recorded in the debug snapshot and
    /// returned as errors.
    pub async fn recommend(
        &mut self,
        request: &RecommendationRequest,
    ) -> AppResult<Recommendation> {
        if self.records.is_empty() {
            tracing::warn!("Recommendation requested with no anime data loaded");
            return Ok(Recommendation::NoData);
        }

        let context = self.build_context(request.max_entries);
        let user_prompt = prompt::build_prompt(&context, &request.query, &self.season);

        self.debug.begin(RequestSnapshot {
            model: self.model_id.clone(),
            prompt: user_prompt.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        });

        tracing::info!(
            model = %self.model_id,
            prompt_chars = user_prompt.chars().count(),
            context_entries = request.max_entries.min(self.records.len()),
            "Requesting recommendations"
        );

        let completion = ChatCompletionRequest {
            model: self.model_id.clone(),
            messages: vec![
                ChatMessage::system(prompt::SYSTEM_PROMPT),
                ChatMessage::user(user_prompt),
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = match self.provider.complete(completion).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Error getting recommendations");
                self.debug.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let usage = response.usage.unwrap_or_default();
        let content = response.first_content().map(str::to_string);

        tracing::info!(
            model = %response.model,
            completion_tokens = usage.completion_tokens,
            prompt_tokens = usage.prompt_tokens,
            total_tokens = usage.total_tokens,
            "Response received"
        );

        self.debug.last_response = Some(ResponseSnapshot {
            model: response.model.clone(),
            usage,
            content: content.clone().unwrap_or_else(|| "No content".to_string()),
        });

        match content {
            Some(text) if !text.is_empty() => Ok(Recommendation::Content(text)),
            _ => {
                tracing::warn!("Empty response content from API");
                Ok(Recommendation::EmptyResponse)
            }
        }
    }

    /// Like `recommend`, flattened to the text shown to a user
    pub async fn recommend_text(&mut self, request: &RecommendationRequest) -> String {
        match self.recommend(request).await {
            Ok(recommendation) => recommendation.into_text(),
            Err(e) => error_text(&e),
        }
    }

    pub fn debug_info(&self) -> DebugSnapshot {
        self.debug.clone()
    }

    /// Replaces the debug snapshot with one captured by a detached copy
    pub fn set_debug_info(&mut self, debug: DebugSnapshot) {
        self.debug = debug;
    }
}
