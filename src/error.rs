//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Failure loading or reading the properties bag.
#[derive(Error, Debug)]
pub enum PropertiesError {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("{} could not be read: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} line {line} is malformed: {content}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        content: String,
    },
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

/// Problems with what the application registered or with required properties.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing property: {0}")]
    MissingProperty(&'static str),
    #[error(transparent)]
    Properties(#[from] PropertiesError),
    #[error("entity {0} is registered more than once")]
    DuplicateEntity(String),
    #[error("invalid entity {table}: {reason}")]
    InvalidEntity { table: String, reason: String },
    #[error("invalid mount path '{0}': must start with '/' and not end with '/'")]
    InvalidMountPath(String),
    #[error("invalid request log path spec '{spec}': {reason}")]
    InvalidPathSpec { spec: String, reason: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("Invalid parameter: {param} ({reason}).")]
    InvalidParam { param: String, reason: String },
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("service not registered: {0}")]
    MissingService(&'static str),
    #[error("module {module} failed: {reason}")]
    Module { module: String, reason: String },
    #[error("bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::InvalidParam { .. } => (StatusCode::BAD_REQUEST, "invalid_parameter"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            AppError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            AppError::MissingService(_) | AppError::Module { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "service_error")
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
