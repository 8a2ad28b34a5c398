//! API error taxonomy and the JSON error envelope.
//!
//! Every handler returns `Result<_, ApiError>`; the `IntoResponse` impl
//! renders `{"error": "...", "code": "...", "field": "..."}` with the
//! status class the error belongs to. Store and infrastructure failures
//! are logged and surfaced as generic 500s.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation { field: Option<String>, message: String },

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Business-rule violation (insufficient stock, promo limits, ...).
    #[error("{message}")]
    Business { code: &'static str, message: String },

    /// Uniqueness conflict (duplicate SKU, slug, promo code).
    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { field: None, message: message.into() }
    }

    /// Maps a unique-constraint violation to a Conflict, anything else to Database.
    pub fn on_unique(e: sqlx::Error, code: &'static str, message: impl Into<String>) -> Self {
        match &e {
            sqlx::Error::Database(d) if d.is_unique_violation() => {
                Self::Conflict { code, message: message.into() }
            }
            _ => Self::Database(e),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errs: validator::ValidationErrors) -> Self {
        let first = errs.field_errors().into_iter().next().map(|(field, errors)| {
            let message = errors
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("invalid value for {field}"));
            (field.to_string(), message)
        });
        match first {
            Some((field, message)) => Self::Validation { field: Some(field), message },
            None => Self::validation("invalid request"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, field, message) = match self {
            Self::Validation { field, message } => {
                (StatusCode::BAD_REQUEST, "VALIDATION", field, message)
            }
            Self::NotFound(what) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", None, format!("{what} not found"))
            }
            Self::Business { code, message } => (StatusCode::BAD_REQUEST, code, None, message),
            Self::Conflict { code, message } => (StatusCode::BAD_REQUEST, code, None, message),
            Self::Database(e) => {
                tracing::error!(error = %e, "database failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", None, "internal server error".to_string())
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "unexpected failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", None, "internal server error".to_string())
            }
        };
        let mut body = json!({ "error": message, "code": code });
        if let Some(f) = field {
            body["field"] = json!(f);
        }
        (status, Json(body)).into_response()
    }
}
