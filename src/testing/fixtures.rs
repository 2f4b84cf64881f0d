//! Test fixtures providing pre-wired session contexts and settings

use super::mock::{MockBackend, RecordingNotifier};
use crate::credentials::MemoryCredentialStore;
use crate::session::SessionContext;
use crate::settings::{ApiSettings, BidiSettings, StorageSettings};
use std::path::Path;
use std::sync::Arc;

/// A session context together with the doubles it was built from
pub struct TestSession {
    pub store: Arc<MemoryCredentialStore>,
    pub backend: Arc<MockBackend>,
    pub notifier: Arc<RecordingNotifier>,
    pub context: Arc<SessionContext>,
}

impl TestSession {
    /// Context over an empty store
    #[must_use]
    pub fn new(backend: MockBackend) -> Self {
        Self::from_store(MemoryCredentialStore::new(), backend)
    }

    /// Context over a store already holding `token`
    #[must_use]
    pub fn with_token(token: impl Into<String>, backend: MockBackend) -> Self {
        Self::from_store(MemoryCredentialStore::with_token(token), backend)
    }

    fn from_store(store: MemoryCredentialStore, backend: MockBackend) -> Self {
        let store = Arc::new(store);
        let backend = Arc::new(backend);
        let notifier = Arc::new(RecordingNotifier::default());
        let context = Arc::new(SessionContext::new(
            store.clone(),
            backend.clone(),
            notifier.clone(),
        ));
        Self {
            store,
            backend,
            notifier,
            context,
        }
    }
}

/// Central fixture provider for test data
pub struct TestFixtures;

impl TestFixtures {
    /// Settings pointing at `base_url` with the credential file under `dir`
    #[must_use]
    pub fn settings(base_url: &str, dir: &Path) -> BidiSettings {
        BidiSettings {
            api: ApiSettings {
                base_url: base_url.to_string(),
                timeout_seconds: 5,
            },
            storage: StorageSettings {
                path: dir.join("credentials.json").to_string_lossy().into_owned(),
                ..StorageSettings::default()
            },
            ..BidiSettings::default()
        }
    }

    /// Same as [`TestFixtures::settings`] with sealed storage
    #[must_use]
    pub fn encrypted_settings(base_url: &str, dir: &Path) -> BidiSettings {
        let mut settings = Self::settings(base_url, dir);
        settings.storage.encrypted = true;
        settings.storage.secret = "fixture-secret".to_string();
        settings
    }
}
