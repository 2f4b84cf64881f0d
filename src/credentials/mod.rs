//! Credential Store
//!
//! Persistence of the single bearer token under a fixed key. Stores perform
//! no validation and no network access.
//!
//! - [`memory`] - In-process store, also used to simulate unavailable storage
//! - [`file`] - Key/value JSON file, the local-storage equivalent
//! - [`encrypted`] - AES-256-GCM sealed file store for device secure storage

pub mod encrypted;
pub mod file;
pub mod memory;

pub use encrypted::EncryptedCredentialStore;
pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

/// Key used by the web console
pub const WEB_TOKEN_KEY: &str = "accessToken";

/// Key used by the attendant mobile app
pub const MOBILE_TOKEN_KEY: &str = "userToken";

/// Credential storage failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Storage backend cannot be reached at all
    #[error("credential storage unavailable: {0}")]
    Unavailable(String),
    /// Stored data exists but cannot be read back
    #[error("credential storage corrupt: {0}")]
    Corrupt(String),
    #[error("credential storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistent storage of one bearer token
pub trait CredentialStore: Send + Sync {
    /// Read the stored token, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read
    fn get(&self) -> Result<Option<String>, StoreError>;

    /// Store `token`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written
    fn set(&self, token: &str) -> Result<(), StoreError>;

    /// Remove the stored token. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written
    fn clear(&self) -> Result<(), StoreError>;
}
