//! Real HTTP integration tests for the symcheck API.
//!
//! Boots a kernel with a scripted driver, serves the router on a random
//! port, and drives it with reqwest.

use async_trait::async_trait;
use std::sync::Arc;
use symcheck_api::routes::AppState;
use symcheck_api::server::build_router;
use symcheck_kernel::SymcheckKernel;
use symcheck_runtime::llm_driver::{CompletionRequest, CompletionResponse, LlmDriver, LlmError};
use symcheck_types::config::SymcheckConfig;
use symcheck_types::message::{StopReason, TokenUsage};

/// Only the third candidate answers.
struct ThirdTimeLucky;

#[async_trait]
impl LlmDriver for ThirdTimeLucky {
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        match req.model.as_str() {
            "llama-3.1-8b-instant" => Ok(CompletionResponse {
                text: "Possible viral infection... (disclaimer)".to_string(),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            }),
            "mixtral-8x7b-32768" => Err(LlmError::Api {
                status: 400,
                message: "model decommissioned".to_string(),
            }),
            _ => Err(LlmError::RateLimited {
                retry_after_ms: 1000,
            }),
        }
    }
}

struct TestServer {
    base_url: String,
    _tmp: tempfile::TempDir,
}

async fn start_test_server() -> TestServer {
    let tmp = tempfile::tempdir().unwrap();
    let config = SymcheckConfig {
        home_dir: tmp.path().to_path_buf(),
        ..SymcheckConfig::default()
    };
    let kernel = SymcheckKernel::boot_with_driver(config, Arc::new(ThirdTimeLucky)).unwrap();
    let app = build_router(Arc::new(AppState::new(Arc::new(kernel))));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}"),
        _tmp: tmp,
    }
}

async fn analyze(client: &reqwest::Client, base: &str, text: &str) -> serde_json::Value {
    let resp = client
        .post(format!("{base}/analyze"))
        .json(&serde_json::json!({"text": text}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

async fn history(client: &reqwest::Client, url: String) -> Vec<serde_json::Value> {
    let resp = client.get(url).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn test_analyze_then_history() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    let body = analyze(&client, base, "fever and cough").await;
    assert_eq!(
        body,
        serde_json::json!({"result": "Possible viral infection... (disclaimer)"})
    );

    let entries = history(&client, format!("{base}/history")).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["symptoms"], "fever and cough");
    assert_eq!(entries[0]["model"], "llama-3.1-8b-instant");
    assert_eq!(entries[0]["result"], "Possible viral infection... (disclaimer)");
    assert!(entries[0]["id"].is_i64());
    assert!(entries[0]["timestamp"].is_string());
}

#[tokio::test]
async fn test_history_keyword_filter_and_deletes() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    analyze(&client, base, "Fever and chills").await;
    analyze(&client, base, "sprained ankle").await;

    let all = history(&client, format!("{base}/history")).await;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["symptoms"], "sprained ankle");

    let fever = history(&client, format!("{base}/history?keyword=fever")).await;
    assert_eq!(fever.len(), 1);
    assert_eq!(fever[0]["symptoms"], "Fever and chills");

    // Every result contains "viral", so the keyword also matches the result field.
    let viral = history(&client, format!("{base}/history?keyword=VIRAL")).await;
    assert_eq!(viral.len(), 2);

    let id = fever[0]["id"].as_i64().unwrap();
    let resp = client
        .delete(format!("{base}/history/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], format!("Entry {id} deleted successfully"));

    let resp = client
        .delete(format!("{base}/history/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(history(&client, format!("{base}/history")).await.len(), 1);

    for _ in 0..2 {
        let resp = client.delete(format!("{base}/history")).send().await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "All history deleted successfully");
    }
    assert!(history(&client, format!("{base}/history")).await.is_empty());
}

#[tokio::test]
async fn test_health_counts_analyses() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    analyze(&client, base, "tired").await;

    let health: serde_json::Value = client
        .get(format!("{base}/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["analyses_total"], 1);
    assert_eq!(health["degraded_total"], 0);
    assert_eq!(health["candidates"].as_array().unwrap().len(), 3);
    assert_eq!(health["provider"], "groq");
    assert!(health["uptime_secs"].is_u64());
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let server = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/analyze", server.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
    assert!(history(&client, format!("{}/history", server.base_url))
        .await
        .is_empty());
}
