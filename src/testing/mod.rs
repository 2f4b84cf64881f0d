//! Testing utilities for the session layer
//!
//! ## Organization
//!
//! - [`tokens`] - HS256 token minting with arbitrary claims
//! - [`mock`] - Scripted backend and a notifier that records notices
//! - [`fixtures`] - Pre-wired session harness and settings
//!
//! ## Usage
//!
//! ```rust
//! use bidi_session::testing::{fixtures::TestSession, mock::MockBackend, tokens::token_for_role};
//!
//! # async fn example() {
//! let harness = TestSession::with_token(token_for_role("OMC_ADMIN"), MockBackend::new());
//! harness.context.bootstrap().await;
//! assert!(harness.context.snapshot().is_authenticated());
//! # }
//! ```

pub mod fixtures;
pub mod mock;
pub mod tokens;

pub use fixtures::{TestFixtures, TestSession};
pub use mock::{Gate, MockBackend, RecordingNotifier};
pub use tokens::{mint_token, token_for_role};

/// Common test constants
pub mod constants {
    /// Default test email address
    pub const TEST_EMAIL: &str = "ops@bidi.test";

    /// Default test password
    pub const TEST_PASSWORD: &str = "correct-horse";

    /// Default test user name
    pub const TEST_USER_NAME: &str = "Ama Mensah";

    /// Default subject claim
    pub const TEST_USER_ID: u64 = 42;

    /// Test JWT signing key for HMAC (256 bits)
    pub const TEST_JWT_KEY: &[u8] = b"test_key_32_bytes_long_for_test_";
}
