//! Per-concern error types. The conversation layer never surfaces these to
//! users directly; each one degrades to a corrective reply or a log line.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// User-input validation errors. Surfaced with a corrective example,
/// never mutate the session.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("IATA code must be exactly 3 letters, got: {0}")]
    BadIata(String),

    #[error("Origin and destination must differ, both are: {0}")]
    SameRoute(String),
}

/// Provider call failures. Swallowed at the adapter boundary — each one
/// collapses to an empty offer list and is only visible in the logs.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider {name} request failed: {reason}")]
    RequestFailed { name: String, reason: String },

    #[error("Provider {name} returned status {status}")]
    BadStatus { name: String, status: u16 },

    #[error("Provider {name} returned a malformed payload: {reason}")]
    MalformedPayload { name: String, reason: String },

    #[error("Provider {name} timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },
}

/// Chat-transport errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },
}

/// Payment/tier collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum TierError {
    #[error("Invoice creation failed for user {user_id}: {reason}")]
    InvoiceFailed { user_id: String, reason: String },
}
