use crate::envelope::pretty_json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bible_core::BibleError;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Failure body: always `ok: false` plus an `error` message and optional
/// diagnostic fields flattened alongside.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub error: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
            details: Map::new(),
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        if let Value::Object(map) = details {
            self.details.extend(map);
        }
        self
    }
}

pub struct AppError {
    pub status: StatusCode,
    pub body: ErrorEnvelope,
}

impl AppError {
    pub fn new(status: StatusCode, body: ErrorEnvelope) -> Self {
        Self { status, body }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorEnvelope::new(msg))
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorEnvelope::new(msg))
    }

    pub fn internal(msg: impl std::fmt::Display) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorEnvelope::new(msg.to_string()),
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        pretty_json(self.status, &self.body)
    }
}

impl From<BibleError> for AppError {
    fn from(err: BibleError) -> Self {
        let message = err.to_string();
        match err {
            BibleError::InvalidParam(msg) => AppError::bad_request(msg),
            BibleError::BookNotFound { book } => {
                let body = ErrorEnvelope::new(message).with_details(json!({ "book": book }));
                AppError::new(StatusCode::NOT_FOUND, body)
            }
            BibleError::ChapterNotFound {
                book,
                requested_chapter,
                available_chapters,
            } => {
                let body = ErrorEnvelope::new(message).with_details(json!({
                    "book": book,
                    "requestedChapter": requested_chapter,
                    "availableChapters": available_chapters,
                }));
                AppError::new(StatusCode::NOT_FOUND, body)
            }
            BibleError::VerseNotFound {
                book,
                chapter,
                verse,
                verse_count,
            } => {
                let body = ErrorEnvelope::new(message).with_details(json!({
                    "book": book,
                    "chapter": chapter,
                    "verse": verse,
                    "verseCount": verse_count,
                }));
                AppError::new(StatusCode::NOT_FOUND, body)
            }
            BibleError::EmptyRange { book, from, to } => {
                let body = ErrorEnvelope::new(message)
                    .with_details(json!({ "book": book, "from": from, "to": to }));
                AppError::new(StatusCode::NOT_FOUND, body)
            }
            BibleError::NoCandidates => AppError::not_found(message),
            BibleError::ChapterRead { file, source } => {
                tracing::error!(%file, error = %source, "located chapter file is unreadable");
                let body = ErrorEnvelope::new("failed to read chapter file")
                    .with_details(json!({ "file": file }));
                AppError::new(StatusCode::INTERNAL_SERVER_ERROR, body)
            }
            BibleError::DirectoryMissing(_) | BibleError::Io(_) | BibleError::ConfigParse(_) => {
                tracing::error!(error = %message, "environment error");
                AppError::internal(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_not_found_carries_book() {
        let err = AppError::from(BibleError::BookNotFound {
            book: "XXX".to_string(),
        });
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        let body = serde_json::to_value(&err.body).unwrap();
        assert_eq!(
            body,
            json!({ "ok": false, "error": "book not found", "book": "XXX" })
        );
    }

    #[test]
    fn chapter_not_found_lists_available_chapters() {
        let err = AppError::from(BibleError::ChapterNotFound {
            book: "GEN".to_string(),
            requested_chapter: 99,
            available_chapters: vec![1, 2],
        });
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        let body = serde_json::to_value(&err.body).unwrap();
        assert_eq!(body["requestedChapter"], 99);
        assert_eq!(body["availableChapters"], json!([1, 2]));
    }

    #[test]
    fn validation_and_environment_statuses() {
        let bad = AppError::from(BibleError::invalid("q must be at least 2 characters"));
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.body.error, "q must be at least 2 characters");

        let missing = AppError::from(BibleError::DirectoryMissing("data/bible".into()));
        assert_eq!(missing.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(missing.body.error, "bible directory missing or empty");

        let unreadable = AppError::from(BibleError::ChapterRead {
            file: "001_GEN_01.txt".to_string(),
            source: std::io::Error::other("denied"),
        });
        assert_eq!(unreadable.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!unreadable.body.ok);
    }
}
