use std::fmt;

/// User-visible notice (toast/alert) raised by the session layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Stored session was rejected or could not be confirmed
    SessionExpired,
    LoginSucceeded,
    LoginFailed(String),
    /// Credentials were valid but the role is not allowed in
    AccessDenied,
    LoggedOut,
    /// Navigate to the unauthenticated entry point
    NavigateToLogin,
}

impl Notice {
    /// Whether the notice reports a failure
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notice::SessionExpired | Notice::LoginFailed(_) | Notice::AccessDenied
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::SessionExpired => {
                write!(f, "Session expired or invalid. Please log in again.")
            }
            Notice::LoginSucceeded => write!(f, "Login successful!"),
            Notice::LoginFailed(message) => write!(f, "{message}"),
            Notice::AccessDenied => write!(f, "Access denied. User only access."),
            Notice::LoggedOut => write!(f, "Logged out successfully"),
            Notice::NavigateToLogin => write!(f, "Redirecting to login"),
        }
    }
}

/// Receiver of session notices; the UI layer renders them
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Notifier that writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        if notice.is_error() {
            log::warn!("{notice}");
        } else {
            log::info!("{notice}");
        }
    }
}
