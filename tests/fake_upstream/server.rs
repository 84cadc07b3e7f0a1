//! In-process fake provider server
//!
//! Routes mirror the provider API the proxy talks to:
//!
//! ```text
//!   GET    /domains                               hydra collection
//!   POST   /accounts        {address, password}   201 account | 422 taken
//!   POST   /token           {address, password}   {id, token} | 401
//!   GET    /messages                              hydra collection (bearer)
//!   GET    /messages/{id}                         detail | 404
//!   PATCH  /messages/{id}   merge-patch {seen}    detail | 415 | 404
//!   DELETE /messages/{id}                         204 | 404
//!   GET    /messages/{id}/attachment/{att}        raw bytes | 404
//! ```
//!
//! Every request that reaches the server is counted, so tests can
//! assert that the proxy did not call upstream at all. Setting the
//! server to failing answers every request with a 500; failing one
//! method only breaks that kind of call.

use super::provider::{Provider, TestMessage};
use axum::body::Bytes;
use axum::extract::{Path, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;

struct Shared {
    provider: Mutex<Provider>,
    requests: AtomicUsize,
    failing: AtomicBool,
    failing_method: Mutex<Option<Method>>,
}

impl Shared {
    fn provider(&self) -> MutexGuard<'_, Provider> {
        self.provider.lock().unwrap()
    }
}

/// A fake provider on `127.0.0.1` with an OS-assigned port.
///
/// The server runs until the `FakeProvider` is dropped.
pub struct FakeProvider {
    port: u16,
    shared: Arc<Shared>,
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeProvider {
    pub async fn start(provider: Provider) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind to ephemeral port");
        let port = listener.local_addr().unwrap().port();

        let shared = Arc::new(Shared {
            provider: Mutex::new(provider),
            requests: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            failing_method: Mutex::new(None),
        });

        let app = Router::new()
            .route("/domains", get(domains))
            .route("/accounts", post(create_account))
            .route("/token", post(issue_token))
            .route("/messages", get(list_messages))
            .route(
                "/messages/{id}",
                get(get_message).patch(patch_message).delete(delete_message),
            )
            .route("/messages/{id}/attachment/{attachment_id}", get(attachment))
            .layer(middleware::from_fn_with_state(shared.clone(), count))
            .with_state(shared.clone());

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            port,
            shared,
            _handle: handle,
        }
    }

    /// Root URL of the provider API.
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Number of requests received so far.
    pub fn requests(&self) -> usize {
        self.shared.requests.load(Ordering::SeqCst)
    }

    /// Answer every following request with a 500.
    pub fn set_failing(&self, failing: bool) {
        self.shared.failing.store(failing, Ordering::SeqCst);
    }

    /// Answer every following request with `method` with a 500.
    pub fn fail_method(&self, method: Method) {
        *self.shared.failing_method.lock().unwrap() = Some(method);
    }

    /// Drop a message into `address`'s inbox, as if it arrived by mail.
    pub fn deliver(&self, address: &str, mut message: TestMessage) {
        message.to = address.to_string();
        self.shared.provider().inbox_mut(address).push(message);
    }

    pub fn is_seen(&self, address: &str, id: &str) -> bool {
        self.shared
            .provider()
            .message(address, id)
            .is_some_and(|m| m.seen)
    }

    pub fn message_ids(&self, address: &str) -> Vec<String> {
        self.shared
            .provider()
            .inboxes
            .get(address)
            .map(|inbox| inbox.iter().map(|m| m.id.clone()).collect())
            .unwrap_or_default()
    }

    /// The addresses of every account created so far.
    pub fn accounts(&self) -> Vec<String> {
        self.shared
            .provider()
            .accounts
            .iter()
            .map(|a| a.address.clone())
            .collect()
    }
}

// ── Middleware ──────────────────────────────────────────────────────

async fn count(State(shared): State<Arc<Shared>>, request: Request, next: Next) -> Response {
    shared.requests.fetch_add(1, Ordering::SeqCst);
    let method_fails =
        shared.failing_method.lock().unwrap().as_ref() == Some(request.method());
    if method_fails || shared.failing.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream down").into_response();
    }
    next.run(request).await
}

// ── Handlers ────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct Credentials {
    address: String,
    password: String,
}

fn hydra(members: Vec<Value>) -> Value {
    let total = members.len();
    json!({ "hydra:member": members, "hydra:totalItems": total })
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" }))).into_response()
}

/// Resolve the bearer token to its account's address.
fn authorize(shared: &Shared, headers: &HeaderMap) -> Result<String, Response> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    token
        .and_then(|t| shared.provider().address_for_token(t))
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Invalid JWT Token" })),
            )
                .into_response()
        })
}

async fn domains(State(shared): State<Arc<Shared>>) -> Json<Value> {
    let members: Vec<Value> = shared
        .provider()
        .domains
        .iter()
        .enumerate()
        .map(|(i, d)| json!({ "id": format!("dom-{i}"), "domain": d.domain, "isActive": d.active }))
        .collect();
    Json(hydra(members))
}

async fn create_account(
    State(shared): State<Arc<Shared>>,
    Json(body): Json<Credentials>,
) -> Response {
    let mut provider = shared.provider();
    let domain_ok = body.address.split_once('@').is_some_and(|(_, domain)| {
        provider
            .domains
            .iter()
            .any(|d| d.active && d.domain == domain)
    });
    if !domain_ok {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": "address: This value is not valid." })),
        )
            .into_response();
    }

    match provider.create_account(&body.address, &body.password) {
        Some(account) => (
            StatusCode::CREATED,
            Json(json!({ "id": account.id, "address": account.address })),
        )
            .into_response(),
        None => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": "address: This value is already used." })),
        )
            .into_response(),
    }
}

async fn issue_token(State(shared): State<Arc<Shared>>, Json(body): Json<Credentials>) -> Response {
    match shared.provider().issue_token(&body.address, &body.password) {
        Some((id, token)) => Json(json!({ "id": id, "token": token })).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials." })),
        )
            .into_response(),
    }
}

async fn list_messages(State(shared): State<Arc<Shared>>, headers: HeaderMap) -> Response {
    let address = match authorize(&shared, &headers) {
        Ok(address) => address,
        Err(rejection) => return rejection,
    };

    let members: Vec<Value> = shared
        .provider()
        .inboxes
        .get(&address)
        .map(|inbox| inbox.iter().map(TestMessage::summary_json).collect())
        .unwrap_or_default();
    Json(hydra(members)).into_response()
}

async fn get_message(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let address = match authorize(&shared, &headers) {
        Ok(address) => address,
        Err(rejection) => return rejection,
    };

    shared
        .provider()
        .message(&address, &id)
        .map_or_else(not_found, |m| Json(m.detail_json()).into_response())
}

async fn patch_message(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let address = match authorize(&shared, &headers) {
        Ok(address) => address,
        Err(rejection) => return rejection,
    };

    let merge_patch = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/merge-patch+json"));
    if !merge_patch {
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }
    let Ok(patch) = serde_json::from_slice::<Value>(&body) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let mut provider = shared.provider();
    let Some(message) = provider
        .inbox_mut(&address)
        .iter_mut()
        .find(|m| m.id == id)
    else {
        return not_found();
    };
    if let Some(seen) = patch.get("seen").and_then(Value::as_bool) {
        message.seen = seen;
    }
    Json(message.detail_json()).into_response()
}

async fn delete_message(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let address = match authorize(&shared, &headers) {
        Ok(address) => address,
        Err(rejection) => return rejection,
    };

    let mut provider = shared.provider();
    let inbox = provider.inbox_mut(&address);
    let before = inbox.len();
    inbox.retain(|m| m.id != id);
    if inbox.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn attachment(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Path((id, attachment_id)): Path<(String, String)>,
) -> Response {
    let address = match authorize(&shared, &headers) {
        Ok(address) => address,
        Err(rejection) => return rejection,
    };

    let provider = shared.provider();
    let Some(found) = provider
        .message(&address, &id)
        .and_then(|m| m.attachments.iter().find(|a| a.id == attachment_id))
    else {
        return not_found();
    };

    (
        [
            (CONTENT_TYPE, found.content_type.clone()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", found.filename),
            ),
        ],
        found.bytes.clone(),
    )
        .into_response()
}
