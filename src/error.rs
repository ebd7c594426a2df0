//! Errors raised while turning an expense request into shares.
//!
//! - [`SplitMismatch`] the amounts or percentages do not reconcile with the total.
//! - [`EmptySelection`] no member was selected for a split expense.
//! - [`UnknownMember`] a referenced id is not on the trip roster.
//!
//! None of them is retried: they go back to whoever filled the form.
//!
//! [`ServerError`] wraps them for the HTTP layer together with storage errors.
//!
//!  [`SplitMismatch`]: ValidationError::SplitMismatch
//!  [`EmptySelection`]: ValidationError::EmptySelection
//!  [`UnknownMember`]: ValidationError::UnknownMember
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::schemas::MemberId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Split mismatch: {0}")]
    SplitMismatch(String),
    #[error("No member selected for the split")]
    EmptySelection,
    #[error("\"{0}\" is not a member of the trip")]
    UnknownMember(MemberId),
    #[error("\"{0}\" is selected more than once")]
    DuplicateMember(MemberId),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("\"{0}\" not found")]
    NotFound(String),
    #[error("\"{0}\" already present")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
    #[error(transparent)]
    Encoding(#[from] bson::ser::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::BadRequest(_)
            | ServerError::Validation(ValidationError::MissingField(_)) => StatusCode::BAD_REQUEST,
            ServerError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Database(_) | ServerError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            ServerError::Database(err) => {
                tracing::error!("database error: {err}");
                "internal server error".to_string()
            }
            ServerError::Encoding(err) => {
                tracing::error!("failed to encode document: {err}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { error })
    }
}
