use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};
use crate::middleware::request_id::RequestId;
use crate::models::{
    recommendation::error_text, AnimeRecord, DebugSnapshot, Recommendation,
    RecommendationRequest, RecordFile,
};
use crate::services::Recommender;
use crate::storage;

use super::AppState;

const DEFAULT_RECORD_LIMIT: usize = 20;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct CredentialsResponse {
    pub model: String,
    pub records_loaded: usize,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub count: usize,
    pub path: PathBuf,
    /// Whether the new file was loaded into the recommender
    pub loaded: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoadDatasetRequest {
    /// Bare file name inside the data directory; latest file when absent
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoadDatasetResponse {
    pub path: PathBuf,
    pub records: usize,
}

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub total: usize,
    pub source: Option<PathBuf>,
    pub records: Vec<AnimeRecord>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    /// `content`, `empty_response`, `no_data` or `error`
    pub outcome: String,
    pub recommendation: String,
    pub possibly_truncated: bool,
}

#[derive(Debug, Serialize)]
pub struct DebugResponse {
    pub api_key_set: bool,
    pub records_loaded: usize,
    pub source: Option<PathBuf>,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub debug: DebugSnapshot,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Set the OpenRouter credential, replacing any existing recommender
///
/// Records loaded by the previous recommender are reloaded from their file.
pub async fn set_credentials(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> AppResult<Json<CredentialsResponse>> {
    if request.api_key.trim().is_empty() {
        return Err(AppError::InvalidInput("API key cannot be empty".to_string()));
    }

    let mut recommender = Recommender::new(Some(request.api_key), &state.config)?;

    let mut inner = state.inner.write().await;
    let previous_source = inner
        .recommender
        .as_ref()
        .and_then(|r| r.source().map(|p| p.to_path_buf()));
    if let Some(path) = previous_source {
        if let Err(e) = recommender.load_records(&path).await {
            tracing::warn!(error = %e, "Could not carry loaded data over to new recommender");
        }
    }

    let response = CredentialsResponse {
        model: recommender.model_id().to_string(),
        records_loaded: recommender.record_count(),
    };
    inner.recommender = Some(recommender);

    tracing::info!("API key set");
    Ok(Json(response))
}

/// Scrape the listing page into a new data file
pub async fn scrape(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<ScrapeResponse>> {
    tracing::info!(
        request_id = %request_id,
        url = %state.collector.listing_url(),
        "Processing scrape request"
    );

    let collected = state.collector.collect().await?;

    let mut inner = state.inner.write().await;
    let loaded = match inner.recommender.as_mut() {
        Some(recommender) => recommender.load_records(&collected.path).await.is_ok(),
        None => false,
    };

    Ok(Json(ScrapeResponse {
        count: collected.records.len(),
        path: collected.path,
        loaded,
    }))
}

/// List data files, newest first
pub async fn list_datasets(State(state): State<AppState>) -> AppResult<Json<Vec<RecordFile>>> {
    let files =
        storage::list_record_files(&state.config.data_dir, &state.config.file_prefix).await?;
    Ok(Json(files))
}

/// Load a data file into the recommender
pub async fn load_dataset(
    State(state): State<AppState>,
    request: Result<Json<LoadDatasetRequest>, JsonRejection>,
) -> AppResult<Json<LoadDatasetResponse>> {
    // A bodyless request loads the latest file
    let request = match request {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => LoadDatasetRequest::default(),
        Err(rejection) => return Err(AppError::InvalidInput(rejection.body_text())),
    };
    let path = match request.file_name.as_deref() {
        Some(name) => storage::resolve_record_file(&state.config.data_dir, name)?,
        None => {
            storage::latest_record_file(&state.config.data_dir, &state.config.file_prefix)
                .await?
                .path
        }
    };

    let mut inner = state.inner.write().await;
    let recommender = inner.recommender_mut()?;
    let records = recommender.load_records(&path).await?;

    Ok(Json(LoadDatasetResponse { path, records }))
}

/// View loaded records
pub async fn get_records(
    State(state): State<AppState>,
    Query(params): Query<RecordsQuery>,
) -> Json<RecordsResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_RECORD_LIMIT);
    let inner = state.inner.read().await;

    let response = match inner.recommender.as_ref() {
        Some(recommender) => RecordsResponse {
            total: recommender.record_count(),
            source: recommender.source().map(|p| p.to_path_buf()),
            records: recommender.records().iter().take(limit).cloned().collect(),
        },
        None => RecordsResponse {
            total: 0,
            source: None,
            records: Vec::new(),
        },
    };

    Json(response)
}

/// Ask the model for recommendations
///
/// Upstream failures are reported in the body with outcome `error`, not as an
/// HTTP error status.
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    request.validate()?;

    tracing::info!(
        request_id = %request_id,
        query_chars = request.query.chars().count(),
        max_entries = request.max_entries,
        "Processing recommendation request"
    );

    // The model call runs on a copy so the session stays readable meanwhile
    let mut recommender = state.inner.read().await.recommender()?.clone();
    let outcome = recommender.recommend(&request).await;

    if !matches!(outcome, Ok(Recommendation::NoData)) {
        let mut inner = state.inner.write().await;
        if let Some(live) = inner.recommender.as_mut() {
            live.set_debug_info(recommender.debug_info());
        }
    }

    let response = match outcome {
        Ok(recommendation) => RecommendationResponse {
            outcome: recommendation.kind().to_string(),
            possibly_truncated: recommendation.looks_truncated(),
            recommendation: recommendation.into_text(),
        },
        Err(e) => RecommendationResponse {
            outcome: "error".to_string(),
            recommendation: error_text(&e),
            possibly_truncated: false,
        },
    };

    tracing::info!(
        request_id = %request_id,
        outcome = %response.outcome,
        "Recommendation completed"
    );

    Ok(Json(response))
}

/// Session summary and the last request/response/error
pub async fn debug_info(State(state): State<AppState>) -> Json<DebugResponse> {
    let inner = state.inner.read().await;

    let response = match inner.recommender.as_ref() {
        Some(recommender) => DebugResponse {
            api_key_set: true,
            records_loaded: recommender.record_count(),
            source: recommender.source().map(|p| p.to_path_buf()),
            model: Some(recommender.model_id().to_string()),
            provider: Some(recommender.provider_name().to_string()),
            debug: recommender.debug_info(),
        },
        None => DebugResponse {
            api_key_set: false,
            records_loaded: 0,
            source: None,
            model: None,
            provider: None,
            debug: DebugSnapshot::default(),
        },
    };

    Json(response)
}
