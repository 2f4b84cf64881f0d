//! Session Context
//!
//! The single owner of session state. It composes the credential store, the
//! token decoder and the backend validator, and is the only writer of
//! [`SessionState`](crate::models::SessionState).
//!
//! - [`context`] - Bootstrap, login, logout and role mutation
//! - [`notice`] - User-visible notices raised by session transitions
//! - [`errors`] - Login failures returned to the form

pub mod context;
pub mod errors;
pub mod notice;

pub use context::SessionContext;
pub use errors::LoginError;
pub use notice::{LogNotifier, Notice, Notifier};
