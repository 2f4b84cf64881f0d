use super::{CredentialStore, StoreError};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Slot {
    token: Option<String>,
    unavailable: bool,
}

/// Credential store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Slot>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `token`
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Slot {
                token: Some(token.into()),
                unavailable: false,
            }),
        }
    }

    /// Make every operation fail with [`StoreError::Unavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Current value, bypassing the availability switch
    #[must_use]
    pub fn peek(&self) -> Option<String> {
        self.lock().token.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn available(&self) -> Result<MutexGuard<'_, Slot>, StoreError> {
        let slot = self.lock();
        if slot.unavailable {
            return Err(StoreError::Unavailable("in-memory store disabled".to_string()));
        }
        Ok(slot)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(self.available()?.token.clone())
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        self.available()?.token = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.available()?.token = None;
        Ok(())
    }
}
