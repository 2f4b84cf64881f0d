use super::Role;
use serde::Serialize;

/// Lifecycle phase of the session.
///
/// `Bootstrapping` is only ever the initial phase; once left it is never
/// re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "role", rename_all = "snake_case")]
pub enum SessionPhase {
    Bootstrapping,
    Authenticated(Role),
    Unauthenticated,
}

/// Observable session state, written only by the session context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    /// Current role; may be set optimistically while still bootstrapping
    pub role: Option<Role>,
    pub is_loading: bool,
}

impl SessionState {
    /// State at process start
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            phase: SessionPhase::Bootstrapping,
            role: None,
            is_loading: true,
        }
    }

    /// Resolved, logged-out state
    #[must_use]
    pub const fn unauthenticated() -> Self {
        Self {
            phase: SessionPhase::Unauthenticated,
            role: None,
            is_loading: false,
        }
    }

    /// Resolved, logged-in state
    #[must_use]
    pub const fn authenticated(role: Role) -> Self {
        Self {
            phase: SessionPhase::Authenticated(role),
            role: Some(role),
            is_loading: false,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.phase, SessionPhase::Authenticated(_))
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}
