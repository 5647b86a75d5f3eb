use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use otakulens::{
    error::AppError,
    models::{Recommendation, RecommendationRequest, NO_SYNOPSIS},
    services::{Collector, Recommender},
    storage, Config,
};

const LISTING: &str = r#"
<html><body>
  <article class="anime-card">
    <div class="poster-container"><img src="/posters/a.jpg"></div>
    <h3 class="main-title">A</h3>
    <div class="anime-synopsis">A quiet café drama.</div>
  </article>
  <article class="anime-card">
    <div class="poster-container"><img src="https://cdn.example.org/b.jpg"></div>
    <h3 class="main-title">B</h3>
  </article>
  <article class="anime-card">
    <div class="poster-container"><img src="http://[broken"></div>
    <h3 class="main-title">Broken</h3>
    <div class="anime-synopsis">Never stored.</div>
  </article>
  <article class="anime-card">
    <h3 class="main-title">C</h3>
    <div class="anime-synopsis">A slow, warm romance.</div>
  </article>
</body></html>
"#;

type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_listing_site() -> SocketAddr {
    let app = Router::new()
        .route("/winter-2025/tv", get(|| async { Html(LISTING) }))
        .route(
            "/unavailable",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );
    spawn(app).await
}

async fn completions(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);
    captured.lock().unwrap().push((auth, body));

    Json(json!({
        "id": "gen-1",
        "model": "deepseek/deepseek-r1:free",
        "usage": {"completion_tokens": 4, "prompt_tokens": 210, "total_tokens": 214},
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": "Try A and C"}, "finish_reason": "stop"}
        ]
    }))
}

async fn spawn_completion_api() -> (SocketAddr, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/api/v1/chat/completions", post(completions))
        .route(
            "/limited/chat/completions",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({"error": {"message": "Rate limit exceeded", "code": 429}})),
                )
            }),
        )
        .route(
            "/inline-error/chat/completions",
            post(|| async {
                Json(json!({"error": {"message": "No endpoints found", "code": 404}}))
            }),
        )
        .route(
            "/empty/chat/completions",
            post(|| async {
                Json(json!({
                    "model": "deepseek/deepseek-r1:free",
                    "choices": [{"message": {"role": "assistant", "content": ""}}]
                }))
            }),
        )
        .with_state(captured.clone());
    (spawn(app).await, captured)
}

fn temp_data_dir() -> PathBuf {
    std::env::temp_dir().join(format!("otakulens-pipeline-{}", Uuid::new_v4()))
}

fn config(listing: SocketAddr, path: &str, data_dir: &PathBuf) -> Config {
    Config {
        listing_url: format!("http://{}{}", listing, path),
        data_dir: data_dir.clone(),
        scrape_delay_ms: 0,
        ..Config::default()
    }
}

#[tokio::test]
async fn test_collect_writes_readable_record_set() {
    let site = spawn_listing_site().await;
    let data_dir = temp_data_dir();
    let collector = Collector::new(&config(site, "/winter-2025/tv", &data_dir)).unwrap();

    let collected = collector.collect().await.unwrap();

    let titles: Vec<&str> = collected.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B", "C"]);
    assert_eq!(
        collected.records[0].image_url.as_deref(),
        Some(format!("http://{}/posters/a.jpg", site).as_str())
    );
    assert_eq!(collected.records[1].synopsis, NO_SYNOPSIS);
    assert_eq!(collected.records[2].image_url, None);
    assert!(collected.records.iter().all(|r| r.season == "Winter 2025"));

    let file_name = collected.path.file_name().unwrap().to_str().unwrap();
    assert!(file_name.starts_with("winter_2025_anime_"));
    assert!(file_name.ends_with(".json"));

    let written = std::fs::read_to_string(&collected.path).unwrap();
    assert!(written.contains("\n    {"));
    assert!(written.contains("café"));

    let read_back = storage::read_record_set(&collected.path).await.unwrap();
    assert_eq!(read_back, collected.records);

    let latest = storage::latest_record_file(&data_dir, "winter_2025_anime")
        .await
        .unwrap();
    assert_eq!(latest.path, collected.path);

    std::fs::remove_dir_all(&data_dir).ok();
}

#[tokio::test]
async fn test_collect_failed_fetch_writes_nothing() {
    let site = spawn_listing_site().await;
    let data_dir = temp_data_dir();
    let collector = Collector::new(&config(site, "/unavailable", &data_dir)).unwrap();

    let result = collector.collect().await;

    match result {
        Err(AppError::ExternalApi(message)) => assert!(message.contains("503")),
        other => panic!("expected ExternalApi error, got {:?}", other),
    }
    assert!(!data_dir.exists());
}

#[tokio::test]
async fn test_scrape_and_recommend_end_to_end() {
    let site = spawn_listing_site().await;
    let (api, captured) = spawn_completion_api().await;
    let data_dir = temp_data_dir();
    let config = Config {
        openrouter_api_url: format!("http://{}/api/v1/", api),
        ..config(site, "/winter-2025/tv", &data_dir)
    };

    let collected = Collector::new(&config).unwrap().collect().await.unwrap();

    let mut recommender = Recommender::new(Some("sk-or-test".to_string()), &config).unwrap();
    assert_eq!(recommender.load_records(&collected.path).await.unwrap(), 3);

    let request = RecommendationRequest::new("something calming")
        .with_temperature(0.7)
        .with_max_tokens(500)
        .with_max_entries(10);
    let recommendation = recommender.recommend(&request).await.unwrap();
    assert_eq!(
        recommendation,
        Recommendation::Content("Try A and C".to_string())
    );

    let calls = captured.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    let (auth, body) = &calls[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-or-test"));
    assert_eq!(body["model"], "deepseek/deepseek-r1:free");
    assert_eq!(body["max_tokens"], 500);
    assert_eq!(body["messages"][0]["role"], "system");
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("1. A\nSynopsis: A quiet café drama."));
    assert!(prompt.contains("3. C\n"));
    assert!(!prompt.contains("Broken"));
    assert!(prompt.contains("something calming"));

    let debug = recommender.debug_info();
    let response = debug.last_response.unwrap();
    assert_eq!(response.content, "Try A and C");
    assert_eq!(response.usage.total_tokens, 214);
    assert_eq!(debug.last_request.unwrap().max_tokens, 500);
    assert!(debug.last_error.is_none());

    std::fs::remove_dir_all(&data_dir).ok();
}

async fn recommender_against(path: &str, data_dir: &PathBuf) -> Recommender {
    let site = spawn_listing_site().await;
    let (api, _) = spawn_completion_api().await;
    let config = Config {
        openrouter_api_url: format!("http://{}{}", api, path),
        ..config(site, "/winter-2025/tv", data_dir)
    };
    let collected = Collector::new(&config).unwrap().collect().await.unwrap();

    let mut recommender = Recommender::new(Some("sk-or-test".to_string()), &config).unwrap();
    recommender.load_records(&collected.path).await.unwrap();
    recommender
}

#[tokio::test]
async fn test_rate_limited_api_is_reported() {
    let data_dir = temp_data_dir();
    let mut recommender = recommender_against("/limited", &data_dir).await;
    let request = RecommendationRequest::new("mecha");

    let error = recommender.recommend(&request).await.unwrap_err();
    assert!(matches!(error, AppError::ExternalApi(_)));
    assert!(error.to_string().contains("429"));

    let text = recommender.recommend_text(&request).await;
    assert!(text.starts_with("Error getting recommendations:"));
    assert!(recommender.debug_info().last_error.is_some());

    std::fs::remove_dir_all(&data_dir).ok();
}

#[tokio::test]
async fn test_error_inside_success_body_is_reported() {
    let data_dir = temp_data_dir();
    let mut recommender = recommender_against("/inline-error", &data_dir).await;

    let error = recommender
        .recommend(&RecommendationRequest::new("mecha"))
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::ExternalApi(_)));
    assert!(error.to_string().contains("No endpoints found"));

    std::fs::remove_dir_all(&data_dir).ok();
}

#[tokio::test]
async fn test_blank_completion_is_empty_response() {
    let data_dir = temp_data_dir();
    let mut recommender = recommender_against("/empty", &data_dir).await;

    let recommendation = recommender
        .recommend(&RecommendationRequest::new("mecha"))
        .await
        .unwrap();
    assert_eq!(recommendation, Recommendation::EmptyResponse);

    std::fs::remove_dir_all(&data_dir).ok();
}
