//! Typed error hierarchy for msgpurge.
//!
//! Two top-level enums cover the two layers:
//! - `ApiError`: one remote call, after the retry ladder has given up
//! - `PurgeError`: failures that abort a whole run

use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Errors surfaced by `ApiClient` once retries no longer apply.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: the token was rejected")]
    Unauthorized,

    #[error("Forbidden: no access to {path}")]
    Forbidden { path: String },

    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("Search index not ready for {path} after {attempts} attempts")]
    IndexNotReady { path: String, attempts: u32 },

    #[error("Thread is archived: {path}")]
    ArchivedThread { path: String },

    #[error("HTTP {status} on {method} {path}: {body}")]
    Http {
        status: StatusCode,
        method: Method,
        path: String,
        body: String,
    },

    #[error("Failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    /// Whether this error means the credential itself is no good.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// Errors that end a run early.
#[derive(Debug, Error)]
pub enum PurgeError {
    #[error("Authentication failed: the token is invalid or expired")]
    Unauthorized,

    #[error("Failed to enumerate {what}: {source}")]
    Enumeration {
        what: &'static str,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
