use super::{CredentialStore, FileCredentialStore, StoreError};
use crate::utils::crypto::{self, ENCRYPTION_KEY_SIZE};

/// File store whose values are sealed with AES-256-GCM
pub struct EncryptedCredentialStore {
    inner: FileCredentialStore,
    key: [u8; ENCRYPTION_KEY_SIZE],
}

impl EncryptedCredentialStore {
    /// Wrap `inner`, deriving the sealing key from `secret`
    #[must_use]
    pub fn new(inner: FileCredentialStore, secret: &[u8]) -> Self {
        Self {
            inner,
            key: crypto::derive_encryption_key(secret),
        }
    }
}

impl std::fmt::Debug for EncryptedCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedCredentialStore")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl CredentialStore for EncryptedCredentialStore {
    fn get(&self) -> Result<Option<String>, StoreError> {
        self.inner
            .get()?
            .map(|sealed| {
                crypto::open(&sealed, &self.key).map_err(|e| StoreError::Corrupt(e.to_string()))
            })
            .transpose()
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        let sealed = crypto::seal(token, &self.key)
            .map_err(|e| StoreError::Unavailable(format!("failed to seal token: {e}")))?;
        self.inner.set(&sealed)
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.inner.clear()
    }
}
