//! Core data types shared by the session layer
//!
//! - [`role`] - The closed set of recognised roles
//! - [`auth`] - Login credentials, decoded token claims and backend profiles
//! - [`state`] - The observable session state owned by the session context

pub mod auth;
pub mod role;
pub mod state;

pub use auth::{Credentials, TokenClaims, UserProfile};
pub use role::{Role, UnknownRole};
pub use state::{SessionPhase, SessionState};
