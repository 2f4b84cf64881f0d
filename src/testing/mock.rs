//! Mock objects and fake implementations for testing
//!
//! [`MockBackend`] answers each backend call with a scripted result and
//! counts the calls. A [`Gate`] holds a call in flight until the test
//! releases it, which is how the interleaving scenarios are driven.

use super::tokens::token_for_role;
use crate::client::{AuthBackend, BackendError};
use crate::models::{Credentials, UserProfile};
use crate::session::{Notice, Notifier};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds a backend call until released
#[derive(Debug, Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until the gated call has started
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the gated call complete
    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Debug)]
struct Script {
    login: Result<String, BackendError>,
    validate: Result<(), BackendError>,
    profile: Result<UserProfile, BackendError>,
    logout: Result<(), BackendError>,
    validate_gate: Option<Arc<Gate>>,
    profile_gate: Option<Arc<Gate>>,
    login_gate: Option<Arc<Gate>>,
    logout_gate: Option<Arc<Gate>>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            login: Ok(token_for_role("OMC_ADMIN")),
            validate: Ok(()),
            profile: Ok(UserProfile::default()),
            logout: Ok(()),
            validate_gate: None,
            profile_gate: None,
            login_gate: None,
            logout_gate: None,
        }
    }
}

/// Scripted [`AuthBackend`]
///
/// By default login returns an `OMC_ADMIN` token, validation succeeds, the
/// profile carries no role and logout succeeds.
#[derive(Debug, Default)]
pub struct MockBackend {
    script: Mutex<Script>,
    login_calls: AtomicUsize,
    validate_calls: AtomicUsize,
    profile_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    logout_tokens: Mutex<Vec<String>>,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_login(self, result: Result<String, BackendError>) -> Self {
        lock(&self.script).login = result;
        self
    }

    /// Login succeeds with a token carrying `role`
    #[must_use]
    pub fn with_login_role(self, role: &str) -> Self {
        self.with_login(Ok(token_for_role(role)))
    }

    #[must_use]
    pub fn with_validate(self, result: Result<(), BackendError>) -> Self {
        lock(&self.script).validate = result;
        self
    }

    #[must_use]
    pub fn with_profile(self, result: Result<UserProfile, BackendError>) -> Self {
        self.set_profile(result);
        self
    }

    /// Profile fetch succeeds with `role`
    #[must_use]
    pub fn with_profile_role(self, role: &str) -> Self {
        self.with_profile(Ok(UserProfile {
            role: Some(role.to_string()),
            ..UserProfile::default()
        }))
    }

    #[must_use]
    pub fn with_logout(self, result: Result<(), BackendError>) -> Self {
        lock(&self.script).logout = result;
        self
    }

    pub fn set_profile(&self, result: Result<UserProfile, BackendError>) {
        lock(&self.script).profile = result;
    }

    /// Hold the next validation calls until the returned gate is released
    #[must_use]
    pub fn hold_validation(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        lock(&self.script).validate_gate = Some(gate.clone());
        gate
    }

    /// Hold the next profile fetches until the returned gate is released
    #[must_use]
    pub fn hold_profile(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        lock(&self.script).profile_gate = Some(gate.clone());
        gate
    }

    /// Hold the next login calls until the returned gate is released
    #[must_use]
    pub fn hold_login(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        lock(&self.script).login_gate = Some(gate.clone());
        gate
    }

    /// Hold the next logout notifications until the returned gate is released
    #[must_use]
    pub fn hold_logout(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        lock(&self.script).logout_gate = Some(gate.clone());
        gate
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    /// Total number of backend calls of any kind
    pub fn total_calls(&self) -> usize {
        self.login_calls() + self.validate_calls() + self.profile_calls() + self.logout_calls()
    }

    /// Tokens passed to logout notifications, in call order
    pub fn logout_tokens(&self) -> Vec<String> {
        lock(&self.logout_tokens).clone()
    }
}

#[async_trait]
impl AuthBackend for MockBackend {
    async fn login(&self, _credentials: &Credentials) -> Result<String, BackendError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.script).login_gate.clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        lock(&self.script).login.clone()
    }

    async fn validate(&self, _token: &str) -> Result<(), BackendError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.script).validate_gate.clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        lock(&self.script).validate.clone()
    }

    async fn fetch_profile(&self, _token: &str) -> Result<UserProfile, BackendError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.script).profile_gate.clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        lock(&self.script).profile.clone()
    }

    async fn notify_logout(&self, token: &str) -> Result<(), BackendError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.logout_tokens).push(token.to_string());
        let gate = lock(&self.script).logout_gate.clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        lock(&self.script).logout.clone()
    }
}

/// Notifier that keeps every notice it receives
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }

    /// Number of times `notice` was delivered
    #[must_use]
    pub fn count(&self, notice: &Notice) -> usize {
        lock(&self.notices).iter().filter(|n| *n == notice).count()
    }

    pub fn clear(&self) {
        lock(&self.notices).clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        lock(&self.notices).push(notice.clone());
    }
}
