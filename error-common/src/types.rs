use std::time::Duration;

use thiserror::Error;

/// Shared error enum for ReliefNet operations
#[derive(Error, Debug)]
pub enum ReliefError {
    /// Malformed or missing required input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced entity is absent
    #[error("{0} not found")]
    NotFound(String),

    /// Durable-store operation failed
    #[error("Store error: {0}")]
    Store(String),

    /// Durable-store operation exceeded its deadline
    #[error("Store operation timed out after {0:?}")]
    StoreTimeout(Duration),

    /// Enrichment-provider call failed
    #[error("Provider {provider} failed: {message}")]
    Provider { provider: String, message: String },

    /// Enrichment-provider call exceeded its deadline
    #[error("Provider {provider} timed out after {timeout:?}")]
    ProviderTimeout { provider: String, timeout: Duration },

    /// Internal system errors
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ReliefError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not-found error for a named entity kind
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Create a provider error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error is the caller's fault (4xx at the HTTP boundary)
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }
}

/// Result type alias for ReliefNet operations
pub type Result<T> = std::result::Result<T, ReliefError>;

/// Log an error with its originating context
pub fn log_error(context: &str, error: &ReliefError) {
    tracing::error!(
        context = context,
        error = %error,
        "ReliefNet error occurred"
    );
}
