use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::repository::RepoError;

/// ApiError
///
/// The single error taxonomy for the HTTP surface. Every failure path in the
/// request pipeline (extraction, validation, authorization, repository) ends
/// up here and is rendered as the API's structured error envelope:
/// `{ "success": false, "message": ... }` for terminal failures, or
/// `{ "success": false, "errors": { field: message } }` for validation.
#[derive(Debug, Error, PartialEq)]
pub enum ApiError {
    /// Field-level validation failures, keyed by field name.
    #[error("validation failed")]
    Validation(BTreeMap<String, String>),
    /// Malformed request body or parameters (unparseable JSON, bad enum literal).
    #[error("{0}")]
    BadRequest(String),
    #[error("authentication required")]
    Unauthorized,
    #[error("insufficient privileges")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Storage-level uniqueness violation (e.g. duplicate product slug).
    #[error("{0}")]
    Conflict(String),
    /// A reference to another entity (parent category, tag) did not resolve.
    #[error("unknown {0} reference")]
    UnknownReference(&'static str),
    /// Terminal catch-all. Details are logged server-side, never returned.
    #[error("internal server error")]
    Internal,
}

#[derive(Serialize)]
struct MessageBody {
    success: bool,
    message: String,
}

#[derive(Serialize)]
struct FieldErrorBody {
    success: bool,
    errors: BTreeMap<String, String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(FieldErrorBody {
                    success: false,
                    errors,
                }),
            )
                .into_response(),
            other => {
                let status = match &other {
                    ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
                    ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
                    ApiError::Forbidden => StatusCode::FORBIDDEN,
                    ApiError::NotFound(_) => StatusCode::NOT_FOUND,
                    ApiError::Conflict(_) => StatusCode::CONFLICT,
                    ApiError::UnknownReference(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    // Validation handled above.
                    ApiError::Validation(_) | ApiError::Internal => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (
                    status,
                    Json(MessageBody {
                        success: false,
                        message: other.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    /// Flattens the validator error tree into a `field -> message` map, using
    /// dotted keys for nested sub-documents (e.g. `accordion.details`) and
    /// indexed keys for list entries.
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = BTreeMap::new();
        flatten_errors("", &errors, &mut fields);
        ApiError::Validation(fields)
    }
}

fn flatten_errors(prefix: &str, errors: &ValidationErrors, out: &mut BTreeMap<String, String>) {
    for (field, kind) in errors.errors() {
        let key = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                if let Some(err) = errs.first() {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value ({})", err.code));
                    out.insert(key, message);
                }
            }
            ValidationErrorsKind::Struct(nested) => flatten_errors(&key, nested, out),
            ValidationErrorsKind::List(entries) => {
                for (index, nested) in entries {
                    flatten_errors(&format!("{key}[{index}]"), nested, out);
                }
            }
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate(what) => ApiError::Conflict(format!("{what} already exists")),
            RepoError::UnknownReference(what) => ApiError::UnknownReference(what),
            RepoError::SelfParent(what) => {
                ApiError::BadRequest(format!("{what} cannot be its own parent"))
            }
            RepoError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                ApiError::Internal
            }
        }
    }
}
