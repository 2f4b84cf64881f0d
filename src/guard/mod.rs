//! Route Guard
//!
//! Decides what a screen shows for the current session state. The guard only
//! reads state; it never mutates the session.

pub mod screens;

pub use screens::{navigation_for, Screen};

use crate::models::{Role, SessionState};
use serde::Serialize;
use tokio::sync::watch;

/// What to show for a guarded screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Session still resolving: neutral waiting indicator
    Waiting,
    Redirect { to: Screen },
    /// Signed in, but with a role the screen does not admit
    Restricted { required: &'static [Role] },
    Render,
}

impl GuardDecision {
    #[must_use]
    pub fn is_render(&self) -> bool {
        matches!(self, GuardDecision::Render)
    }
}

/// Route guard bound to a session's state channel
#[derive(Debug, Clone)]
pub struct RouteGuard {
    state: watch::Receiver<SessionState>,
}

impl RouteGuard {
    #[must_use]
    pub fn new(state: watch::Receiver<SessionState>) -> Self {
        Self { state }
    }

    /// Decision for `screen` against the latest state
    #[must_use]
    pub fn decide(&self, screen: Screen) -> GuardDecision {
        Self::evaluate(&self.state.borrow(), screen)
    }

    /// Wait until the session stops loading, then decide.
    ///
    /// If the session context is dropped while loading, the decision is made
    /// on the last state it published.
    pub async fn wait_for(&mut self, screen: Screen) -> GuardDecision {
        if screen.is_public() {
            return GuardDecision::Render;
        }
        let resolved = self
            .state
            .wait_for(|state| !state.is_loading)
            .await
            .map(|state| Self::evaluate(&state, screen));
        resolved.unwrap_or_else(|_| Self::evaluate(&self.state.borrow(), screen))
    }

    #[must_use]
    pub fn evaluate(state: &SessionState, screen: Screen) -> GuardDecision {
        if screen.is_public() {
            return GuardDecision::Render;
        }
        if state.is_loading {
            return GuardDecision::Waiting;
        }
        match state.role {
            None => GuardDecision::Redirect { to: Screen::Login },
            Some(role) if screen.permits(role) => GuardDecision::Render,
            Some(_) => GuardDecision::Restricted {
                required: screen.permitted_roles(),
            },
        }
    }
}
