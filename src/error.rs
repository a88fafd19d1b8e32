//! Error types for the widget services
//!
//! Errors are classified by what the caller should do next:
//! - RequiresReauth: expired or missing credential
//! - RequiresUserAction: API not enabled for the account
//! - Retryable: other HTTP failures, transport errors, undecodable bodies

use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the provider clients and services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Unauthorized: credential expired or missing")]
    Unauthorized,

    #[error("Forbidden: API not enabled for this account")]
    Forbidden,

    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Skipped record {id}: {reason}")]
    NormalizationSkipped { id: String, reason: String },
}

impl ServiceError {
    /// Map a non-success HTTP status and its body to a failure kind.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => ServiceError::Unauthorized,
            403 => ServiceError::Forbidden,
            _ => ServiceError::RequestFailed { status, body },
        }
    }

    /// Returns true if the caller should prompt for re-authentication
    pub fn requires_reauth(&self) -> bool {
        matches!(self, ServiceError::Unauthorized)
    }

    /// Returns true if a plain user-triggered retry may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::RequestFailed { .. }
                | ServiceError::Transport(_)
                | ServiceError::Decode(_)
        )
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ServiceError::Unauthorized => "Sign in again to reconnect your account.",
            ServiceError::Forbidden => {
                "Enable the API for your account in the provider console, then refresh."
            }
            ServiceError::RequestFailed { .. } => "The provider returned an error. Try again.",
            ServiceError::Transport(_) => "Check your internet connection and try again.",
            ServiceError::Decode(_) => "The provider sent an unexpected response. Try again.",
            ServiceError::NormalizationSkipped { .. } => "Some items could not be displayed.",
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

/// Serializable error representation attached to degraded summaries
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub message: String,
    pub error_type: ErrorType,
    pub can_retry: bool,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorType {
    RequiresReauth,
    RequiresUserAction,
    Retryable,
}

impl From<&ServiceError> for ErrorPayload {
    fn from(err: &ServiceError) -> Self {
        let error_type = if err.requires_reauth() {
            ErrorType::RequiresReauth
        } else if err.is_retryable() {
            ErrorType::Retryable
        } else {
            ErrorType::RequiresUserAction
        };

        ErrorPayload {
            message: err.to_string(),
            error_type,
            can_retry: err.is_retryable(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not find home directory")]
    NoHomeDir,

    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid config at {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}
