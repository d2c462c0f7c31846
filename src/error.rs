use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::ErrorBody;

pub const NOT_FOUND_MESSAGE: &str = "Cannot find a GitHub account with your username";
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests";
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    #[error("directory lookup timed out")]
    Timeout,
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record for {0} already exists")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("identity not found")]
    IdentityNotFound,
    #[error("rate limited")]
    RateLimited,
    #[error(transparent)]
    Validator(#[from] ValidatorError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::IdentityNotFound => StatusCode::NOT_FOUND,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Validator(_) | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // What the caller gets to see; internal detail stays in the logs
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::IdentityNotFound => NOT_FOUND_MESSAGE,
            AppError::RateLimited => RATE_LIMITED_MESSAGE,
            AppError::Validator(_) | AppError::Store(_) => SERVER_ERROR_MESSAGE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: self.public_message().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
