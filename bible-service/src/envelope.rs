//! Pretty-printed JSON envelope shared by every `/api` response.

use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// `{ "ok": ..., [ "error": ... ,] ...payload }`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            ok: true,
            error: None,
            payload,
        }
    }

    /// A non-exceptional negative answer (status stays 200)
    pub fn failed(error: impl Into<String>, payload: T) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            payload,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        pretty_json(StatusCode::OK, &self)
    }
}

pub fn pretty_json<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec_pretty(body) {
        Ok(bytes) => (status, [(CONTENT_TYPE, JSON_CONTENT_TYPE)], bytes).into_response(),
        Err(err) => {
            let fallback = serde_json::json!({ "ok": false, "error": err.to_string() });
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(CONTENT_TYPE, JSON_CONTENT_TYPE)],
                fallback.to_string(),
            )
                .into_response()
        }
    }
}
