/// Failures reported by backend calls
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Login refused; carries the message to show on the form
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("token rejected by backend")]
    TokenRejected,
    /// Transport failure or unreadable body
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response ({status}): {message}")]
    UnexpectedResponse { status: u16, message: String },
    #[error("client configuration error: {0}")]
    Configuration(String),
}

impl BackendError {
    /// Default message for refused logins
    pub const INVALID_CREDENTIALS: &'static str = "Invalid credentials. Please try again.";

    pub(crate) fn network(err: &reqwest::Error) -> Self {
        BackendError::Network(err.to_string())
    }

    /// Transient failures that may succeed on retry
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Network(_))
    }
}
