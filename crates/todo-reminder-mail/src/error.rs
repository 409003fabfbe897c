//! Error types for mail delivery

/// Result type for mail operations
pub type Result<T> = std::result::Result<T, MailError>;

/// Errors that can occur while delivering mail
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// A required setting is missing or malformed
    #[error("Mail configuration error: {0}")]
    Config(String),

    /// An address could not be parsed
    #[error("Invalid mail address '{address}': {reason}")]
    InvalidAddress {
        /// The offending address
        address: String,
        /// Parser diagnostics
        reason: String,
    },

    /// The message could not be assembled
    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    /// The SMTP exchange failed (connect, TLS, auth, or rejection)
    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}
