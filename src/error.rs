//! # Centralized Error Handling
//!
//! This module provides the error types used across the crate. [`PlacementError`]
//! is returned by the placement core (templates, naming, thumbnails, lifecycle hooks),
//! while [`AppError`] wraps it for the reference HTTP host and turns every failure
//! into a logged, appropriately coded HTTP response.

use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors produced by the attachment placement core.
///
/// Configuration problems (`Configuration`, `InvalidProfile`) are raised when an
/// [`UploadBehavior`](crate::services::UploadBehavior) is constructed and never at
/// runtime. I/O problems abort only the save cycle they occur in.
#[derive(Error, Debug)]
pub enum PlacementError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid thumbnail profile `{name}`: {width}x{height}, one side must be positive")]
    InvalidProfile {
        name: String,
        width: u32,
        height: u32,
    },

    #[error("directory `{}` doesn't exist or cannot be created", path.display())]
    DirectoryUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("destination directory for `{}` does not exist", path.display())]
    DestinationUnwritable { path: PathBuf },

    #[error("resource limit exceeded while processing `{}`: {reason}", path.display())]
    ResourceExhausted { path: PathBuf, reason: String },

    #[error("file name resolved to an empty string")]
    EmptyFileName,

    #[error("source file `{}` does not exist", path.display())]
    MissingSource { path: PathBuf },

    #[error("image error on `{}`", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

impl PlacementError {
    /// Maps an `image` crate error for `path`, separating limit violations from
    /// ordinary decode/encode failures.
    pub fn from_image(path: impl Into<PathBuf>, err: image::ImageError) -> Self {
        match err {
            image::ImageError::Limits(limit) => PlacementError::ResourceExhausted {
                path: path.into(),
                reason: limit.to_string(),
            },
            image::ImageError::IoError(io) => PlacementError::Io(io),
            other => PlacementError::Image {
                path: path.into(),
                source: other,
            },
        }
    }
}

/// Convenience Result type alias for the placement core.
pub type PlacementResult<T> = Result<T, PlacementError>;

/// Central application error type for the reference HTTP host.
///
/// _Placement errors are logged automatically, other errors should be logged at the
/// point of creation if needed._
#[derive(Error, Debug)]
pub enum AppError {
    #[error("placement error")]
    Placement(#[from] PlacementError),

    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("bad request: {0}")]
    BadRequest(&'static str),

    #[error("internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorBody {
    message: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Placement(e) = &self {
            error!(error = %e, ?e, "Placement error occurred");
        }

        let (status, message) = match self {
            AppError::Placement(PlacementError::EmptyFileName) => {
                (StatusCode::BAD_REQUEST, "Uploaded file name is empty")
            }
            AppError::Placement(PlacementError::ResourceExhausted { .. }) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Image is too large to process",
            ),
            AppError::Placement(PlacementError::Image { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Image could not be processed")
            }
            AppError::Placement(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Storage error"),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        let body = Json(ErrorBody { message });
        (status, body).into_response()
    }
}

/// Convenience Result type alias that uses AppError as the error type.
pub type AppResult<T> = Result<T, AppError>;
