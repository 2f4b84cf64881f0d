use crate::client::BackendError;
use crate::credentials::StoreError;
use crate::token::TokenError;

/// Why a login attempt did not produce a session.
///
/// The `Display` text is what the login form shows.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Please enter both Email and Password")]
    EmptyCredentials,
    #[error("{0}")]
    InvalidCredentials(String),
    /// Valid credentials whose role claim is not a recognised role
    #[error("Access denied. User only access.")]
    UnauthorizedRole(Option<String>),
    #[error("Login response carried an unreadable token: {0}")]
    MalformedToken(#[from] TokenError),
    #[error("Unable to reach the server: {0}")]
    Network(String),
    #[error("Login failed: {0}")]
    Server(String),
    #[error("Could not save the session: {0}")]
    Storage(#[from] StoreError),
    #[error("Session is closed")]
    Closed,
}

impl From<BackendError> for LoginError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::InvalidCredentials(message) => LoginError::InvalidCredentials(message),
            BackendError::TokenRejected => {
                LoginError::InvalidCredentials(BackendError::INVALID_CREDENTIALS.to_string())
            }
            BackendError::Network(message) => LoginError::Network(message),
            BackendError::UnexpectedResponse { message, .. } => LoginError::Server(message),
            BackendError::Configuration(message) => LoginError::Server(message),
        }
    }
}
