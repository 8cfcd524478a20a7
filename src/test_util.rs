//! Test doubles: a local DeepL look-alike served by axum and a scripted
//! in-memory provider.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::error::SyncError;
use crate::providers::{ProviderFuture, TranslationProvider};

#[derive(Default)]
struct MockDeeplState {
    free_keys: Vec<String>,
    premium_keys: Vec<String>,
    character_count: u64,
    character_limit: u64,
    usage_calls: usize,
    translate_requests: Vec<Value>,
    translate_failure: Option<(u16, String)>,
}

/// Serves `/{tier}/v2/usage` and `/{tier}/v2/translate` where `tier` is
/// `free` or `premium`. Translations are the target code, a colon, and the
/// text sent.
#[derive(Clone, Default)]
pub(crate) struct MockDeepl {
    state: Arc<Mutex<MockDeeplState>>,
}

impl MockDeepl {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn free_key(self, key: &str) -> Self {
        self.lock().free_keys.push(key.to_string());
        self
    }

    pub(crate) fn premium_key(self, key: &str) -> Self {
        self.lock().premium_keys.push(key.to_string());
        self
    }

    pub(crate) fn quota(self, count: u64, limit: u64) -> Self {
        {
            let mut state = self.lock();
            state.character_count = count;
            state.character_limit = limit;
        }
        self
    }

    pub(crate) fn fail_translate(self, status: u16, body: &str) -> Self {
        self.lock().translate_failure = Some((status, body.to_string()));
        self
    }

    pub(crate) fn usage_calls(&self) -> usize {
        self.lock().usage_calls
    }

    pub(crate) fn translate_requests(&self) -> Vec<Value> {
        self.lock().translate_requests.clone()
    }

    pub(crate) async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/:tier/v2/usage", get(usage_handler))
            .route("/:tier/v2/translate", post(translate_handler))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server");
        });
        format!("http://{}", addr)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockDeeplState> {
        self.state.lock().expect("mock state lock")
    }

    fn accepts(&self, tier: &str, headers: &HeaderMap) -> bool {
        let key = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("DeepL-Auth-Key "))
            .unwrap_or_default()
            .to_string();
        let state = self.lock();
        match tier {
            "free" => state.free_keys.contains(&key),
            "premium" => state.premium_keys.contains(&key),
            _ => false,
        }
    }
}

async fn usage_handler(
    State(mock): State<MockDeepl>,
    Path(tier): Path<String>,
    headers: HeaderMap,
) -> Response {
    mock.lock().usage_calls += 1;
    if !mock.accepts(&tier, &headers) {
        return StatusCode::FORBIDDEN.into_response();
    }
    let state = mock.lock();
    Json(json!({
        "character_count": state.character_count,
        "character_limit": state.character_limit,
    }))
    .into_response()
}

async fn translate_handler(
    State(mock): State<MockDeepl>,
    Path(tier): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !mock.accepts(&tier, &headers) {
        return StatusCode::FORBIDDEN.into_response();
    }
    let mut state = mock.lock();
    state.translate_requests.push(body.clone());
    if let Some((status, message)) = state.translate_failure.clone() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, message).into_response();
    }
    let target = body["target_lang"].as_str().unwrap_or_default();
    let translations = body["text"]
        .as_array()
        .map(|texts| {
            texts
                .iter()
                .map(|text| json!({"text": format!("{}:{}", target, text.as_str().unwrap_or_default())}))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    Json(json!({ "translations": translations })).into_response()
}

/// In-memory provider with a fixed quota. Translations are `<target>:<text>`
/// and every call is recorded.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedProvider {
    name: String,
    remaining: u64,
    fail_with: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
    usage_checks: Arc<Mutex<usize>>,
}

impl ScriptedProvider {
    pub(crate) fn new(name: &str, remaining: u64) -> Self {
        Self {
            name: name.to_string(),
            remaining,
            fail_with: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            usage_checks: Arc::new(Mutex::new(0)),
        }
    }

    pub(crate) fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn usage_checks(&self) -> usize {
        *self.usage_checks.lock().expect("usage lock")
    }
}

impl TranslationProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&mut self) -> ProviderFuture<'_, ()> {
        Box::pin(async move { Ok(()) })
    }

    fn usage(&mut self) -> ProviderFuture<'_, u64> {
        Box::pin(async move {
            *self.usage_checks.lock().expect("usage lock") += 1;
            Ok(self.remaining)
        })
    }

    fn translate<'a>(
        &'a mut self,
        texts: &'a [String],
        _source_language: &'a str,
        target_language: &'a str,
    ) -> ProviderFuture<'a, Vec<String>> {
        Box::pin(async move {
            if let Some(message) = &self.fail_with {
                return Err(SyncError::translation(message.clone()));
            }
            let mut out = Vec::new();
            for text in texts {
                let characters = text.chars().count() as u64;
                if characters > self.remaining {
                    return Err(SyncError::usage("scripted quota exhausted"));
                }
                self.remaining -= characters;
                self.calls.lock().expect("calls lock").push(text.clone());
                out.push(format!("{}:{}", target_language, text));
            }
            Ok(out)
        })
    }
}

/// Runs `func` with `dir` as the working directory. Serialized because the
/// working directory is process-wide.
pub(crate) fn with_current_dir<F, R>(dir: &std::path::Path, func: F) -> R
where
    F: FnOnce() -> R,
{
    static CWD_MUTEX: Mutex<()> = Mutex::new(());
    let _guard = CWD_MUTEX.lock().unwrap_or_else(|err| err.into_inner());
    let previous = std::env::current_dir().expect("current dir");
    std::env::set_current_dir(dir).expect("enter dir");
    let result = func();
    std::env::set_current_dir(previous).expect("restore dir");
    result
}
