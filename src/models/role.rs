use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Permission level carried in the `role` claim of a Bidi access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Administrator of an Oil Marketing Company
    OmcAdmin,
    StationManager,
    PumpAttendant,
}

impl Role {
    /// Every recognised role, in sidebar order
    pub const ALL: [Role; 3] = [Role::OmcAdmin, Role::StationManager, Role::PumpAttendant];

    /// Wire representation of the role
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::OmcAdmin => "OMC_ADMIN",
            Role::StationManager => "STATION_MANAGER",
            Role::PumpAttendant => "PUMP_ATTENDANT",
        }
    }

    /// Map a raw claim to a recognised role.
    ///
    /// Matching is exact; `"omc_admin"` or `"SUPER_ADMIN"` are not roles.
    #[must_use]
    pub fn from_claim(claim: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == claim)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role claim outside the recognised set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_claim(s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}
