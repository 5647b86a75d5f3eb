use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::{AppError, AppResult};

pub const NO_DATA_MESSAGE: &str = "Please load anime data first.";
pub const EMPTY_RESPONSE_MESSAGE: &str = "The API returned an empty response. Please try again \
     with a different query or check your API key.";

/// Characters a complete answer is expected to end with
const TERMINAL_CHARS: [char; 6] = ['.', '!', '?', ')', ']', '}'];

/// Parameters of one recommendation call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationRequest {
    pub query: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// How many loaded records are placed in the prompt context
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1600
}

fn default_max_entries() -> usize {
    10
}

impl RecommendationRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_entries: default_max_entries(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Rejects parameters the completion API would refuse
    pub fn validate(&self) -> AppResult<()> {
        if self.query.trim().is_empty() {
            return Err(AppError::InvalidInput("Query cannot be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::InvalidInput(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(AppError::InvalidInput(
                "max_tokens must be greater than zero".to_string(),
            ));
        }
        if self.max_entries == 0 {
            return Err(AppError::InvalidInput(
                "max_entries must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a recommendation call that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendation {
    /// Raw model text
    Content(String),
    /// The model answered with no choices or blank content
    EmptyResponse,
    /// No records loaded; nothing was sent
    NoData,
}

impl Recommendation {
    pub fn kind(&self) -> &'static str {
        match self {
            Recommendation::Content(_) => "content",
            Recommendation::EmptyResponse => "empty_response",
            Recommendation::NoData => "no_data",
        }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Recommendation::Content(text) => text,
            Recommendation::EmptyResponse => EMPTY_RESPONSE_MESSAGE,
            Recommendation::NoData => NO_DATA_MESSAGE,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Recommendation::Content(text) => text,
            other => other.as_text().to_string(),
        }
    }

    /// Heuristic for answers cut off by the token limit
    pub fn looks_truncated(&self) -> bool {
        match self {
            Recommendation::Content(text) => {
                text.chars().count() > 100 && !text.ends_with(TERMINAL_CHARS)
            }
            _ => false,
        }
    }
}

impl Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

/// Renders a failed call the way callers expecting plain text see it
pub fn error_text(error: &AppError) -> String {
    format!("Error getting recommendations: {}", error)
}
