//! Session Context - bootstrap, login, logout and role mutation
//!
//! ## State machine
//!
//! `Bootstrapping → {Authenticated(role), Unauthenticated}`, and
//! `Authenticated → Unauthenticated` on logout or failed validation.
//!
//! ## Stale results
//!
//! Every operation that awaits the backend reads the current generation
//! first and commits its result only if the generation is unchanged. Login,
//! logout, role mutation and teardown advance the generation, so a call still
//! in flight when the session moved on can never resurrect or overwrite it.

use crate::client::{AuthBackend, BackendError, HttpAuthBackend};
use crate::credentials::CredentialStore;
use crate::models::{Credentials, Role, SessionPhase, SessionState};
use crate::session::{LogNotifier, LoginError, Notice, Notifier};
use crate::settings::BidiSettings;
use crate::token;
use crate::utils::LoggingHelper;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct Generation {
    value: u64,
    closed: bool,
}

impl Generation {
    fn advance(&mut self) {
        self.value = self.value.wrapping_add(1);
    }
}

/// Single owner of the session state
pub struct SessionContext {
    store: Arc<dyn CredentialStore>,
    backend: Arc<dyn AuthBackend>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<SessionState>,
    generation: Mutex<Generation>,
    bootstrap_started: AtomicBool,
}

// =============================================================================
// Construction and read access
// =============================================================================

impl SessionContext {
    /// Create a context in the initial `Bootstrapping` state
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        backend: Arc<dyn AuthBackend>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::initial());
        Self {
            store,
            backend,
            notifier,
            state,
            generation: Mutex::new(Generation::default()),
            bootstrap_started: AtomicBool::new(false),
        }
    }

    /// Create a context wired to the HTTP backend and the configured store,
    /// with notices written to the log
    ///
    /// # Errors
    ///
    /// Returns an error if the configured backend URL is invalid
    pub fn from_settings(settings: &BidiSettings) -> Result<Self, BackendError> {
        let backend = HttpAuthBackend::from_settings(&settings.api)?;
        Ok(Self::new(
            settings.credential_store(),
            Arc::new(backend),
            Arc::new(LogNotifier),
        ))
    }

    /// Read-only view of the state for consumers such as the route guard
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.state.borrow().role
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// Bearer token for data calls, available only while authenticated
    #[must_use]
    pub fn current_token(&self) -> Option<String> {
        if !self.state.borrow().is_authenticated() {
            return None;
        }
        self.store.get().ok().flatten()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock_generation().closed
    }
}

// =============================================================================
// Bootstrap
// =============================================================================

impl SessionContext {
    /// Reconstruct the session from the stored token.
    ///
    /// Runs once per context; later calls return the current phase without
    /// touching storage or the network. If the returned future is dropped
    /// before it resolves, the session settles as logged out (the stored
    /// token is kept) and a later call may run bootstrap again.
    pub async fn bootstrap(&self) -> SessionPhase {
        if self.bootstrap_started.swap(true, Ordering::SeqCst) {
            return self.phase();
        }

        let generation = self.current_generation();
        let mut attempt = BootstrapAttempt {
            context: self,
            generation,
            settled: false,
        };
        let phase = self.run_bootstrap(generation).await;
        attempt.settled = true;
        phase
    }

    async fn run_bootstrap(&self, generation: u64) -> SessionPhase {
        LoggingHelper::log_bootstrap_start();
        if self
            .commit(generation, "bootstrap", || {
                self.state.send_modify(|state| state.is_loading = true);
            })
            .is_none()
        {
            return self.phase();
        }

        let token = match self.store.get() {
            Ok(Some(token)) => token,
            Ok(None) => {
                LoggingHelper::log_no_stored_token();
                return self.resolve_logged_out(generation, false);
            }
            Err(e) => {
                LoggingHelper::log_store_unavailable(&e);
                return self.resolve_logged_out(generation, false);
            }
        };

        let decoded_role = match decode_role(&token) {
            Ok(role) => role,
            Err(reason) => {
                LoggingHelper::log_discarding_token(&reason);
                return self.resolve_logged_out(generation, true);
            }
        };
        LoggingHelper::log_stored_token(&token, decoded_role);

        // Optimistic role until the backend confirms
        if self
            .commit(generation, "decode", || {
                self.state.send_modify(|state| state.role = Some(decoded_role));
            })
            .is_none()
        {
            return self.phase();
        }

        if let Err(e) = self.backend.validate(&token).await {
            LoggingHelper::log_validation_failed(&e);
            return self.expire(generation, "validation");
        }

        let phase = self.apply_profile(generation, &token, decoded_role).await;
        LoggingHelper::log_bootstrap_complete(phase);
        phase
    }

    /// Re-fetch the profile of an authenticated session and apply its role
    pub async fn refresh_profile(&self) -> SessionPhase {
        let generation = self.current_generation();
        let SessionPhase::Authenticated(current) = self.phase() else {
            return self.phase();
        };

        match self.store.get() {
            Ok(Some(token)) => self.apply_profile(generation, &token, current).await,
            Ok(None) => {
                log::warn!("Authenticated session has no stored token, ending session");
                self.expire(generation, "refresh")
            }
            Err(e) => {
                LoggingHelper::log_store_unavailable(&e);
                self.phase()
            }
        }
    }

    /// Fetch the profile; its role supersedes `fallback` when present
    async fn apply_profile(&self, generation: u64, token: &str, fallback: Role) -> SessionPhase {
        let role = match self.backend.fetch_profile(token).await {
            Ok(profile) => match profile.role.as_deref() {
                None => fallback,
                Some(raw) => {
                    if let Some(role) = Role::from_claim(raw) {
                        LoggingHelper::log_profile_role(fallback, role);
                        role
                    } else {
                        log::warn!("Profile reported unrecognised role '{raw}', ending session");
                        return self.expire(generation, "profile");
                    }
                }
            },
            Err(e) => {
                LoggingHelper::log_profile_degraded(&e, fallback);
                fallback
            }
        };

        self.commit(generation, "profile", || {
            self.state.send_replace(SessionState::authenticated(role));
        });
        self.phase()
    }

    /// Finish in `Unauthenticated` without a notice
    fn resolve_logged_out(&self, generation: u64, clear_store: bool) -> SessionPhase {
        self.commit(generation, "bootstrap", || {
            if clear_store {
                self.clear_store_quietly();
            }
            self.state.send_replace(SessionState::unauthenticated());
        });
        let phase = self.phase();
        LoggingHelper::log_bootstrap_complete(phase);
        phase
    }

    /// Tear the session down and tell the user it expired
    fn expire(&self, generation: u64, stage: &str) -> SessionPhase {
        let committed = self.commit(generation, stage, || {
            self.clear_store_quietly();
            self.state.send_replace(SessionState::unauthenticated());
        });
        if committed.is_some() {
            self.notifier.notify(&Notice::SessionExpired);
        }
        self.phase()
    }
}

// =============================================================================
// Login, logout and role mutation
// =============================================================================

impl SessionContext {
    /// Exchange credentials for a session.
    ///
    /// On failure the session state is left as it was.
    ///
    /// # Errors
    ///
    /// Returns a [`LoginError`] whose message is suitable for the login form
    pub async fn login(&self, credentials: &Credentials) -> Result<Role, LoginError> {
        let result = self.try_login(credentials).await;
        match &result {
            Ok(role) => {
                LoggingHelper::log_login_success(*role);
                self.notifier.notify(&Notice::LoginSucceeded);
            }
            Err(e) => {
                LoggingHelper::log_login_failed(e);
                let notice = match e {
                    LoginError::UnauthorizedRole(_) => Notice::AccessDenied,
                    other => Notice::LoginFailed(other.to_string()),
                };
                self.notifier.notify(&notice);
            }
        }
        result
    }

    async fn try_login(&self, credentials: &Credentials) -> Result<Role, LoginError> {
        if !credentials.is_complete() {
            return Err(LoginError::EmptyCredentials);
        }
        if self.is_closed() {
            return Err(LoginError::Closed);
        }

        self.state.send_modify(|state| state.is_loading = true);
        let exchanged = self.exchange_credentials(credentials).await;

        let mut generation = self.lock_generation();
        let outcome = match exchanged {
            _ if generation.closed => Err(LoginError::Closed),
            Ok((token, role)) => match self.store.set(&token) {
                Ok(()) => {
                    generation.advance();
                    self.bootstrap_started.store(true, Ordering::SeqCst);
                    self.state.send_replace(SessionState::authenticated(role));
                    return Ok(role);
                }
                Err(e) => Err(LoginError::Storage(e)),
            },
            Err(e) => Err(e),
        };
        drop(generation);

        self.state.send_modify(|state| {
            state.is_loading = state.phase == SessionPhase::Bootstrapping;
        });
        outcome
    }

    async fn exchange_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<(String, Role), LoginError> {
        let token = self.backend.login(credentials).await?;
        let claims = token::decode_claims(&token)?;
        let role = claims
            .role()
            .ok_or_else(|| LoginError::UnauthorizedRole(claims.role.clone()))?;
        Ok((token, role))
    }

    /// End the session locally and, best effort, on the backend.
    ///
    /// The local transition and both notices happen before this returns. The
    /// backend notification runs on the current tokio runtime without being
    /// awaited; its handle is returned for callers that want to wait for it.
    /// Calling it with no active session does nothing.
    pub fn logout(&self) -> Option<JoinHandle<()>> {
        let stored_token = {
            let mut generation = self.lock_generation();
            let stored_token = match self.store.get() {
                Ok(token) => token,
                Err(e) => {
                    LoggingHelper::log_store_unavailable(&e);
                    None
                }
            };
            let state = self.snapshot();
            let active = stored_token.is_some()
                || state.role.is_some()
                || state.phase != SessionPhase::Unauthenticated;
            if generation.closed || !active {
                log::debug!("Logout requested without an active session");
                return None;
            }

            generation.advance();
            self.bootstrap_started.store(true, Ordering::SeqCst);
            self.clear_store_quietly();
            self.state.send_replace(SessionState::unauthenticated());
            stored_token
        };

        LoggingHelper::log_logout();
        self.notifier.notify(&Notice::LoggedOut);
        self.notifier.notify(&Notice::NavigateToLogin);

        stored_token.and_then(|token| self.spawn_logout_notification(token))
    }

    fn spawn_logout_notification(&self, token: String) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            log::warn!("No async runtime available, skipping backend logout notification");
            return None;
        };
        let backend = Arc::clone(&self.backend);
        Some(runtime.spawn(async move {
            if let Err(e) = backend.notify_logout(&token).await {
                LoggingHelper::log_logout_notify_failed(&e);
            }
        }))
    }

    /// Set the role directly.
    ///
    /// `Some(role)` requires a stored token; `None` ends the session locally
    /// without notifying the backend. Returns whether the state changed.
    pub fn set_role(&self, role: Option<Role>) -> bool {
        let mut generation = self.lock_generation();
        if generation.closed {
            return false;
        }

        match role {
            Some(role) => {
                if !matches!(self.store.get(), Ok(Some(_))) {
                    log::warn!("Ignoring role change to {role}: no stored token");
                    return false;
                }
                generation.advance();
                self.bootstrap_started.store(true, Ordering::SeqCst);
                self.state.send_replace(SessionState::authenticated(role));
            }
            None => {
                generation.advance();
                self.bootstrap_started.store(true, Ordering::SeqCst);
                self.clear_store_quietly();
                self.state.send_replace(SessionState::unauthenticated());
            }
        }
        true
    }

    /// Detach the context from its host. Results of calls still in flight are
    /// discarded and no further state changes happen.
    pub fn teardown(&self) {
        let mut generation = self.lock_generation();
        generation.closed = true;
        generation.advance();
    }
}

// =============================================================================
// Utilities
// =============================================================================

impl SessionContext {
    fn lock_generation(&self) -> MutexGuard<'_, Generation> {
        self.generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn current_generation(&self) -> u64 {
        self.lock_generation().value
    }

    /// Run `apply` only if the session is still on `generation`
    fn commit<R>(&self, generation: u64, stage: &str, apply: impl FnOnce() -> R) -> Option<R> {
        let current = self.lock_generation();
        if current.closed || current.value != generation {
            LoggingHelper::log_stale_result(stage);
            return None;
        }
        let result = apply();
        drop(current);
        Some(result)
    }

    /// Settle a bootstrap whose future was dropped before it resolved
    fn abandon_bootstrap(&self, generation: u64) {
        let abandoned = self.commit(generation, "bootstrap", || {
            self.state.send_replace(SessionState::unauthenticated());
        });
        if abandoned.is_some() {
            self.bootstrap_started.store(false, Ordering::SeqCst);
            LoggingHelper::log_bootstrap_abandoned();
        }
    }

    fn clear_store_quietly(&self) {
        if let Err(e) = self.store.clear() {
            log::warn!("Failed to clear stored access token: {e}");
        }
    }
}

/// Settles the session if a bootstrap future is dropped mid-flight
struct BootstrapAttempt<'a> {
    context: &'a SessionContext,
    generation: u64,
    settled: bool,
}

impl Drop for BootstrapAttempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.context.abandon_bootstrap(self.generation);
        }
    }
}

/// Decode the stored token and require a recognised role claim
fn decode_role(token: &str) -> Result<Role, String> {
    let claims = token::decode_claims(token).map_err(|e| e.to_string())?;
    match claims.role.as_deref() {
        None => Err("token carries no role claim".to_string()),
        Some(raw) => Role::from_claim(raw).ok_or_else(|| format!("unrecognised role '{raw}'")),
    }
}
