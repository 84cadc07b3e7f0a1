//! Route handlers

use super::AppState;
use super::response::Authorized;
use crate::error::{Error, Result};
use crate::model::{DeleteAck, GenerateResponse, MarkReadAck};
use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{
    HeaderValue,
    header::{CONTENT_DISPOSITION, CONTENT_TYPE},
};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use futures::TryStreamExt;
use serde_json::{Value, json};
use tracing::{info, warn};

pub async fn root() -> &'static str {
    "tempmail proxy is running"
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "success", "message": "API is working" }))
}

pub async fn generate(State(state): State<AppState>) -> Result<Json<GenerateResponse>> {
    let username = state.usernames.next_username();
    let mailbox = state.upstream.create_mailbox(&username).await?;

    info!("Generated mailbox {}", mailbox.address);
    Ok(Json(GenerateResponse {
        status: "success".to_string(),
        message: "Email Generated".to_string(),
        email: mailbox.address,
        data: mailbox.token,
        created_at: Utc::now(),
    }))
}

pub async fn list_messages(
    State(state): State<AppState>,
    Authorized(credential): Authorized,
) -> Result<Json<Value>> {
    Ok(Json(state.upstream.list_messages(&credential).await?))
}

pub async fn get_message(
    State(state): State<AppState>,
    Authorized(credential): Authorized,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    Ok(Json(state.upstream.get_message(&id, &credential).await?))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Authorized(credential): Authorized,
    Path(id): Path<String>,
) -> Result<Json<MarkReadAck>> {
    state.upstream.mark_seen(&id, &credential).await?;
    Ok(Json(MarkReadAck { seen: true }))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Authorized(credential): Authorized,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>> {
    state.upstream.delete_message(&id, &credential).await?;

    info!("Deleted message {}", id);
    Ok(Json(DeleteAck {
        status: "success".to_string(),
        message: "Message deleted successfully".to_string(),
        id,
    }))
}

pub async fn get_attachment(
    State(state): State<AppState>,
    Authorized(credential): Authorized,
    Path((id, attachment_id)): Path<(String, String)>,
) -> Result<Response> {
    let upstream = state
        .upstream
        .fetch_attachment(&id, &attachment_id, &credential)
        .await?;

    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    let filename = upstream
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(disposition_filename)
        .unwrap_or(attachment_id);
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|e| Error::Upstream(format!("Invalid attachment filename: {e}")))?;

    let stream = upstream
        .bytes_stream()
        .inspect_err(|e| warn!("Attachment stream interrupted: {}", e));
    let body = Body::from_stream(stream);
    Ok((
        [(CONTENT_TYPE, content_type), (CONTENT_DISPOSITION, disposition)],
        body,
    )
        .into_response())
}

/// Extract the filename from a `Content-Disposition` value.
///
/// Surrounding quotes are stripped, as are any embedded quotes so the
/// name can be re-quoted safely.
#[must_use]
pub fn disposition_filename(value: &str) -> Option<String> {
    let (_, rest) = value.split_once("filename=")?;
    let name: String = rest
        .split(';')
        .next()?
        .trim()
        .chars()
        .filter(|c| *c != '"' && !c.is_control())
        .collect();
    (!name.is_empty()).then_some(name)
}
