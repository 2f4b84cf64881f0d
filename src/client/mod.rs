//! Session Validator
//!
//! The backend calls the session layer depends on, behind the
//! [`AuthBackend`] trait so the session context can be driven by the real
//! HTTP client or a scripted double.

pub mod errors;
pub mod http;

pub use errors::BackendError;
pub use http::{AuthorizedApi, HttpAuthBackend};

use crate::models::{Credentials, UserProfile};
use async_trait::async_trait;

/// Authentication endpoints of the Bidi backend
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for an access token (`POST /auth/login`)
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` when the backend refuses the pair, or a
    /// network/response error otherwise
    async fn login(&self, credentials: &Credentials) -> Result<String, BackendError>;

    /// Confirm the token is still accepted (`GET /auth/validate`)
    ///
    /// # Errors
    ///
    /// Returns `TokenRejected` when the backend refuses the token, or
    /// `Network` when the call could not complete
    async fn validate(&self, token: &str) -> Result<(), BackendError>;

    /// Fetch the canonical profile (`GET /users/profile`)
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the body cannot be read
    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, BackendError>;

    /// Tell the backend the session is over (`POST /auth/logout`).
    /// Callers treat failures as non-fatal.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification could not be delivered
    async fn notify_logout(&self, token: &str) -> Result<(), BackendError>;
}
