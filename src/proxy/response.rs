//! Credential extraction and error responses

use crate::credential::{Credential, DEFAULT_SOURCES, SessionToken, resolve};
use crate::error::Error;
use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::warn;

/// Extractor for the request's upstream credential.
///
/// Rejects with 401 before any handler code runs, so a request without
/// a token never reaches upstream.
#[derive(Debug, Clone)]
pub struct Authorized(pub Credential);

impl<S: Send + Sync> FromRequestParts<S> for Authorized {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        resolve(
            &DEFAULT_SOURCES,
            &parts.headers,
            parts.extensions.get::<SessionToken>(),
        )
        .map(Self)
        .ok_or(Error::Unauthorized)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if matches!(self, Self::Unauthorized) {
            let body = json!({ "status": false, "message": self.to_string() });
            return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        }

        warn!("Upstream call failed: {}", self);
        let body = json!({ "status": "error", "message": self.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
