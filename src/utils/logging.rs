// Centralized logging for the session lifecycle.
// Tokens are never logged, only their length.
use crate::models::{Role, SessionPhase};
use log::{debug, info, warn};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log the start of the bootstrap sequence
    pub fn log_bootstrap_start() {
        info!("🔄 Restoring session from stored credentials");
    }

    /// Log that no token was stored
    pub fn log_no_stored_token() {
        info!("ℹ No stored access token, starting logged out");
    }

    /// Log the token found in storage
    pub fn log_stored_token(token: &str, decoded_role: Role) {
        debug!(
            "Stored access token found (length = {} characters), decoded role {}",
            token.len(),
            decoded_role
        );
    }

    /// Log a credential storage failure that is treated as "no token"
    pub fn log_store_unavailable(error: &dyn std::error::Error) {
        warn!("⚠️  Credential storage unavailable, treating as logged out: {error}");
    }

    /// Log a stored token that could not be decoded and is being discarded
    pub fn log_discarding_token(reason: &str) {
        warn!("🗑️  Discarding stored access token: {reason}");
    }

    /// Log a rejected validation call
    pub fn log_validation_failed(error: &dyn std::error::Error) {
        warn!("❌ Session validation failed, logging out: {error}");
    }

    /// Log profile fetch degradation
    pub fn log_profile_degraded(error: &dyn std::error::Error, kept: Role) {
        warn!("⚠️  Failed to fetch profile data ({error}); keeping decoded role {kept}");
    }

    /// Log a profile role override
    pub fn log_profile_role(decoded: Role, profile: Role) {
        if decoded == profile {
            debug!("Profile confirmed role {profile}");
        } else {
            info!("🔁 Profile role {profile} supersedes decoded role {decoded}");
        }
    }

    /// Log the outcome of bootstrap
    pub fn log_bootstrap_complete(phase: SessionPhase) {
        match phase {
            SessionPhase::Authenticated(role) => info!("✅ Session restored as {role}"),
            SessionPhase::Unauthenticated => info!("🚪 Session bootstrap finished logged out"),
            SessionPhase::Bootstrapping => debug!("Session bootstrap still pending"),
        }
    }

    /// Log a bootstrap whose caller stopped waiting before it resolved
    pub fn log_bootstrap_abandoned() {
        warn!("⚠️  Session bootstrap cancelled before completion, continuing logged out");
    }

    /// Log a continuation result dropped because the session moved on
    pub fn log_stale_result(stage: &str) {
        debug!("Discarding stale {stage} result: session changed while the call was in flight");
    }

    /// Log a successful login
    pub fn log_login_success(role: Role) {
        info!("✅ Login successful as {role}");
    }

    /// Log a rejected login
    pub fn log_login_failed(error: &dyn std::error::Error) {
        warn!("❌ Login failed: {error}");
    }

    /// Log a best-effort logout notification failure
    pub fn log_logout_notify_failed(error: &dyn std::error::Error) {
        warn!("⚠️  Backend logout notification failed (ignored): {error}");
    }

    /// Log completion of a logout
    pub fn log_logout() {
        info!("🚪 Logged out");
    }
}
