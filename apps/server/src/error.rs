use std::io::Error as IoError;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use printwatch_monitor::{StoreError, TargetId};
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Database error: {0:#}")]
    Database(#[from] anyhow::Error),
    #[error("Failed to load printers: {0}")]
    Store(#[from] StoreError),
}

/// Errors returned to HTTP clients as `{"error": ...}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("field \"{0}\" is required")]
    MissingField(&'static str),
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("printer {0} not found")]
    NotFound(TargetId),
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingField(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::DuplicateAddress(_)) => StatusCode::CONFLICT,
            Self::Store(StoreError::Backend(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Self::Store(StoreError::Backend(e)) => {
                tracing::error!("Store operation failed: {:#}", e);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}
