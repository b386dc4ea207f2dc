//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error type
pub use dns_purge_provider::{ErrorClass, ProviderError};

/// Core layer error type
///
/// Only run-level and account-level failures are represented here. Failures of
/// individual resources never surface as `CoreError`; they are captured on the
/// resource's deletion attempt instead.
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// `Execute` mode requested without a confirmation token
    #[error("Execute mode requires a confirmation token")]
    ConfirmationRequired,

    /// Confirmation token does not match the expected sentinel
    #[error("Confirmation token does not match")]
    InvalidConfirmationToken,

    /// The request names no accounts
    #[error("No accounts selected")]
    NoAccountsSelected,

    /// No API client is registered for the account
    #[error("No API client registered for account: {0}")]
    ApiClientNotFound(String),

    /// Credentials for the account are rejected by the API
    #[error("Credential failure for account {account}: {message}")]
    CredentialFailure { account: String, message: String },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Storage layer error (report persistence)
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl CoreError {
    /// Whether it is expected behavior (user input, rejected credentials, etc.), used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added. **
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::ConfirmationRequired
            | Self::InvalidConfirmationToken
            | Self::NoAccountsSelected
            | Self::ApiClientNotFound(_)
            | Self::CredentialFailure { .. }
            | Self::ConfigError(_) => true,
            Self::SerializationError(_) | Self::StorageError(_) => false,
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
