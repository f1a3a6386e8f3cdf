// error.rs
// Service error type and its JSON rendering.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mongodb::error::{ErrorKind, WriteFailure};
use serde::Serialize;
use thiserror::Error;

use crate::{coaching::CoachingError, receipt_book::ReceiptError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    #[error(transparent)]
    Coaching(#[from] CoachingError),

    #[error("invalid assignee: {0}")]
    InvalidAssignee(String),

    #[error("range {start}-{end} overlaps active book \"{existing}\"")]
    RangeOverlap {
        start: i64,
        end: i64,
        existing: String,
    },

    #[error("{0} linked record(s) still reference this book")]
    LinkedRecordsExist(u64),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("missing tenant scope")]
    Unauthorized,

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Unique-index violation reported by the server (E11000).
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == 11000
    )
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Receipt(err) => err.code(),
            AppError::Coaching(_) => "INVALID_COACHING",
            AppError::InvalidAssignee(_) => "INVALID_ASSIGNEE",
            AppError::RangeOverlap { .. } => "RANGE_OVERLAP",
            AppError::LinkedRecordsExist(_) => "LINKED_RECORDS_EXIST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Receipt(_) | AppError::Coaching(_) | AppError::InvalidAssignee(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::RangeOverlap { .. }
            | AppError::LinkedRecordsExist(_)
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorBody {
                error: self.code(),
                message,
            }),
        )
            .into_response()
    }
}
