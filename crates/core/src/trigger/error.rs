//! Error types for the trigger module.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriggerError {
    /// The notification body is not a valid event.
    #[error("malformed notification: {0}")]
    Malformed(String),

    /// A record's key cannot be decoded.
    #[error("invalid object key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },
}
