#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the bidi-session library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod assignments;
pub mod client;
pub mod credentials;
pub mod guard;
pub mod models;
pub mod session;
pub mod settings;
pub mod token;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use client::{AuthBackend, BackendError, HttpAuthBackend};
pub use credentials::{CredentialStore, StoreError};
pub use guard::{GuardDecision, RouteGuard, Screen};
pub use models::{Credentials, Role, SessionPhase, SessionState};
pub use session::{LoginError, Notice, Notifier, SessionContext};
pub use settings::BidiSettings;
