use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    services::{Collector, Recommender},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<AppStateInner>>,
    pub config: Arc<Config>,
    pub collector: Arc<Collector>,
}

/// Inner state that can be modified
///
/// One interactive session: the recommender exists once a credential is known.
pub struct AppStateInner {
    pub recommender: Option<Recommender>,
}

impl AppStateInner {
    pub fn recommender(&self) -> AppResult<&Recommender> {
        self.recommender.as_ref().ok_or_else(missing_credentials)
    }

    pub fn recommender_mut(&mut self) -> AppResult<&mut Recommender> {
        self.recommender.as_mut().ok_or_else(missing_credentials)
    }
}

fn missing_credentials() -> AppError {
    AppError::InvalidInput("Please set your OpenRouter API key first.".to_string())
}

impl AppState {
    /// Creates the state, building a recommender when the configuration carries a key
    pub fn new(config: Config) -> AppResult<Self> {
        let recommender = match config.openrouter_api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Some(Recommender::new(None, &config)?),
            _ => None,
        };
        Self::build(config, recommender)
    }

    /// Creates the state around an existing recommender
    pub fn with_recommender(config: Config, recommender: Recommender) -> AppResult<Self> {
        Self::build(config, Some(recommender))
    }

    fn build(config: Config, recommender: Option<Recommender>) -> AppResult<Self> {
        let collector = Collector::new(&config)?;
        Ok(Self {
            inner: Arc::new(RwLock::new(AppStateInner { recommender })),
            config: Arc::new(config),
            collector: Arc::new(collector),
        })
    }
}
