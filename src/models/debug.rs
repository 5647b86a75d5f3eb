use serde::{Deserialize, Serialize};

/// Outgoing completion parameters captured before the call is sent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestSnapshot {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseSnapshot {
    pub model: String,
    pub usage: TokenUsage,
    pub content: String,
}

/// Most recent request, response and error of a recommender
///
/// Only the latest call is kept; there is no history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DebugSnapshot {
    pub last_request: Option<RequestSnapshot>,
    pub last_response: Option<ResponseSnapshot>,
    pub last_error: Option<String>,
}

impl DebugSnapshot {
    /// Starts a new call: records the request and forgets the previous outcome
    pub fn begin(&mut self, request: RequestSnapshot) {
        self.last_request = Some(request);
        self.last_response = None;
        self.last_error = None;
    }
}
