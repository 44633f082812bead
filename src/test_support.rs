use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::Router;
use reqwest::Client;
use rmcp::model::CallToolResult;
use serde_json::Value;

use crate::app::AppState;
use crate::pipeline::TattooPipeline;
use crate::profile::ProfileService;
use crate::providers::{DescribeRequest, GenerateRequest, TattooProvider};
use crate::storage::LocalFileStorage;
use crate::store::JsonRecordStore;

/// Serves `router` on an ephemeral local port and returns its base URL.
pub(crate) async fn spawn_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

type Canned = std::result::Result<Option<String>, &'static str>;

/// Provider returning canned answers and remembering what it was asked.
pub(crate) struct FakeProvider {
    describe: Canned,
    generate: Canned,
    describe_calls: Mutex<Vec<DescribeRequest>>,
    generate_calls: Mutex<Vec<GenerateRequest>>,
}

impl FakeProvider {
    pub(crate) fn new(describe: Canned, generate: Canned) -> Self {
        Self {
            describe,
            generate,
            describe_calls: Mutex::new(Vec::new()),
            generate_calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn describe_calls(&self) -> Vec<DescribeRequest> {
        self.describe_calls.lock().unwrap().clone()
    }

    pub(crate) fn generate_calls(&self) -> Vec<GenerateRequest> {
        self.generate_calls.lock().unwrap().clone()
    }
}

fn answer(canned: &Canned) -> Result<Option<String>> {
    canned.clone().map_err(|message| anyhow!(message))
}

#[async_trait]
impl TattooProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn max_tokens(&self) -> u32 {
        300
    }

    async fn describe(&self, request: &DescribeRequest) -> Result<Option<String>> {
        self.describe_calls.lock().unwrap().push(request.clone());
        answer(&self.describe)
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Option<String>> {
        self.generate_calls.lock().unwrap().push(request.clone());
        answer(&self.generate)
    }
}

/// Application state over a temporary data dir with on-device stores.
pub(crate) fn test_state(provider: FakeProvider) -> (tempfile::TempDir, AppState) {
    let dir = tempfile::tempdir().expect("temp dir");
    let storage = Arc::new(LocalFileStorage::new(
        dir.path().to_path_buf(),
        "http://localhost/files".to_string(),
    ));
    let store = Arc::new(JsonRecordStore::new(storage.as_ref().clone()));
    let pipeline =
        TattooPipeline::new(Arc::new(provider), store.clone(), storage.clone(), Client::new());
    let profiles = ProfileService::new(store.clone(), store, storage.clone());
    let state = AppState {
        pipeline,
        profiles,
        storage,
    };
    (dir, state)
}

pub(crate) fn idle_state() -> (tempfile::TempDir, AppState) {
    test_state(FakeProvider::new(Ok(None), Ok(None)))
}

/// Parses the JSON text block a tool returned.
pub(crate) fn tool_json(result: &CallToolResult) -> Value {
    let text = &result.content[0].as_text().expect("text content").text;
    serde_json::from_str(text).expect("tool output is json")
}
