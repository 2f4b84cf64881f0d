use crate::models::Role;
use serde::Serialize;
use std::fmt;

const ANY_ROLE: &[Role] = &Role::ALL;
const OMC_ADMIN_ONLY: &[Role] = &[Role::OmcAdmin];
const STATION_STAFF: &[Role] = &[Role::OmcAdmin, Role::StationManager];
const ATTENDANT_ONLY: &[Role] = &[Role::PumpAttendant];

/// Navigable screens of the console and the attendant app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Screen {
    Dashboard,
    RegisterOmc,
    RegisteredOmcs,
    Stations,
    Attendants,
    EnterToken,
    Sales,
    Login,
}

impl Screen {
    pub const ALL: [Screen; 8] = [
        Screen::Dashboard,
        Screen::RegisterOmc,
        Screen::RegisteredOmcs,
        Screen::Stations,
        Screen::Attendants,
        Screen::EnterToken,
        Screen::Sales,
        Screen::Login,
    ];

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Screen::Dashboard => "/",
            Screen::RegisterOmc => "/register-omc",
            Screen::RegisteredOmcs => "/registered-omc",
            Screen::Stations => "/stations",
            Screen::Attendants => "/attendants",
            Screen::EnterToken => "/enter-token",
            Screen::Sales => "/sales",
            Screen::Login => "/login",
        }
    }

    /// Look a screen up by path. A trailing slash is ignored.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Self::ALL.into_iter().find(|screen| screen.path() == normalized)
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Screen::Dashboard => "Dashboard",
            Screen::RegisterOmc => "Register OMC",
            Screen::RegisteredOmcs => "Registered OMCs",
            Screen::Stations => "Stations",
            Screen::Attendants => "Attendants",
            Screen::EnterToken => "Enter Token",
            Screen::Sales => "Sales",
            Screen::Login => "Login",
        }
    }

    /// Screens reachable without a session
    #[must_use]
    pub fn is_public(self) -> bool {
        matches!(self, Screen::Login)
    }

    /// Roles allowed to open this screen; empty for public screens
    #[must_use]
    pub fn permitted_roles(self) -> &'static [Role] {
        match self {
            Screen::Dashboard => ANY_ROLE,
            Screen::RegisterOmc | Screen::RegisteredOmcs | Screen::Attendants => OMC_ADMIN_ONLY,
            Screen::Stations => STATION_STAFF,
            Screen::EnterToken | Screen::Sales => ATTENDANT_ONLY,
            Screen::Login => &[],
        }
    }

    #[must_use]
    pub fn permits(self, role: Role) -> bool {
        self.permitted_roles().contains(&role)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Menu entries visible to `role`, in sidebar order
#[must_use]
pub fn navigation_for(role: Role) -> Vec<Screen> {
    Screen::ALL
        .into_iter()
        .filter(|screen| !screen.is_public() && screen.permits(role))
        .collect()
}
