//! Common test utilities: stub search service, stub cyou gateway and a
//! configuration wired to both.

#![allow(dead_code)]

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use fastknowledge::config::{AppConfig, SearchConfig};
use llm::config::CyouConfig;
use llm::remote::RequestSigner;
use llm::ModelConfig;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const PROMPTS: &str = r#"
llm_chat:
  default: "{{ input }}"
  py: "Write simple python code.\n{{ input }}"
knowledge_base_chat:
  default: "ctx={{ context }} q={{ question }}"
  empty: "no docs, answer: {{ question }}"
"#;

pub const CLIENT_ID: &str = "test-client";
pub const PRIVATE_KEY: &str = "test-key";

/// Bind `router` on an ephemeral local port.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Request bodies received by the stub search service, by endpoint.
#[derive(Clone, Default)]
pub struct SearchLog {
    pub calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl SearchLog {
    pub fn bodies(&self, endpoint: &str) -> Vec<Value> {
        self.calls
            .lock()
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, b)| b.clone())
            .collect()
    }
}

/// Stub search service.
///
/// Knowledge base `empty` has no documents, `broken` answers 500, `slow`
/// stalls for five seconds, anything else returns two documents.
pub fn stub_search(log: SearchLog) -> Router {
    Router::new()
        .route(
            "/knowledge_base/search_docs",
            post(|State(log): State<SearchLog>, Json(body): Json<Value>| async move {
                log.calls.lock().push(("search_docs".to_string(), body.clone()));
                if body["knowledge_base_name"] == "slow" {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                match body["knowledge_base_name"].as_str() {
                    Some("empty") => (StatusCode::OK, Json(json!([]))),
                    Some("broken") => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "index offline"}))),
                    _ => (
                        StatusCode::OK,
                        Json(json!([
                            {"page_content": "doc one", "metadata": {"source": "guide.md"}, "id": "1", "score": 0.2},
                            {"page_content": "doc two", "metadata": {"source": "faq v2.md"}, "id": "2", "score": 0.5}
                        ])),
                    ),
                }
            }),
        )
        .route(
            "/knowledge_base/check_str_like",
            post(|State(log): State<SearchLog>, Json(body): Json<Value>| async move {
                log.calls.lock().push(("check_str_like".to_string(), body.clone()));
                Json(json!({"code": 200, "query": body["query"], "answer": "cached answer"}))
            }),
        )
        .route(
            "/knowledge_base/set_qa_into_db",
            post(|State(log): State<SearchLog>, Json(body): Json<Value>| async move {
                log.calls.lock().push(("set_qa_into_db".to_string(), body.clone()));
                Json(json!({"code": 200, "msg": "saved"}))
            }),
        )
        .with_state(log)
}

fn verifier() -> RequestSigner {
    RequestSigner::new(&CyouConfig::new(CLIENT_ID, PRIVATE_KEY, "http://unused").with_api_path("/chat"))
}

/// Stub cyou gateway.
///
/// `/chat` checks the signature and echoes the last message's content;
/// `/chat-error` answers with a msg-embedded remote error.
pub fn stub_gateway() -> Router {
    Router::new()
        .route(
            "/chat",
            post(
                |State(verifier): State<RequestSigner>,
                 Query(params): Query<HashMap<String, String>>,
                 body: String| async move {
                    let timestamp: i64 = params["timestamp"].parse().unwrap();
                    if params["sign"] != verifier.signature(timestamp, &body) {
                        return (StatusCode::UNAUTHORIZED, "bad signature".to_string());
                    }
                    let parsed: Value = serde_json::from_str(&body).unwrap();
                    let last = parsed["bodyArray"].as_array().unwrap().last().unwrap()["content"].clone();
                    let reply = json!({"msg": null, "data": {"content": last, "totalTokens": 9}});
                    (StatusCode::OK, reply.to_string())
                },
            ),
        )
        .route(
            "/chat-error",
            post(|| async {
                json!({
                    "msg": "Error code: 400, \"{\\\"error\\\":{\\\"message\\\":\\\"bad\\\",\\\"status\\\":400}}\""
                })
                .to_string()
            }),
        )
        .with_state(verifier())
}

/// Prompt file, stub services and a configuration pointing at them.
pub struct TestEnv {
    pub dir: TempDir,
    pub config: AppConfig,
    pub search_addr: SocketAddr,
    pub search_log: SearchLog,
}

impl TestEnv {
    pub async fn start() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let prompts_path = dir.path().join("prompts.yaml");
        std::fs::write(&prompts_path, PROMPTS).unwrap();

        let search_log = SearchLog::default();
        let search_addr = spawn(stub_search(search_log.clone())).await;
        let gateway_addr = spawn(stub_gateway()).await;
        let gateway = format!("http://{}", gateway_addr);

        let mut models = HashMap::new();
        models.insert(
            "cyou-api".to_string(),
            ModelConfig::Cyou(CyouConfig::new(CLIENT_ID, PRIVATE_KEY, &gateway).with_api_path("/chat")),
        );
        models.insert(
            "cyou-err".to_string(),
            ModelConfig::Cyou(CyouConfig::new(CLIENT_ID, PRIVATE_KEY, &gateway).with_api_path("/chat-error")),
        );

        let config = AppConfig {
            search: SearchConfig {
                server_url: format!("http://{}", search_addr),
                ..SearchConfig::default()
            },
            prompts_path,
            models,
            ..AppConfig::default()
        };

        Self {
            dir,
            config,
            search_addr,
            search_log,
        }
    }

    pub fn prompts_path(&self) -> PathBuf {
        self.config.prompts_path.clone()
    }

    pub fn search_url(&self) -> String {
        format!("http://{}", self.search_addr)
    }
}
