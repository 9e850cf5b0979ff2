use serde::{Deserialize, Serialize};
use std::fmt;

/// Escalation ladder, ordered from least to most restrictive
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PolicyLevel {
    /// Full dispatch
    #[default]
    Normal,
    /// Dispatch continues, failures are being watched
    Watch,
    /// Dispatch continues under emergency admission rules
    Restricted,
    /// No new dispatch
    Halted,
}

impl PolicyLevel {
    pub const LADDER: [PolicyLevel; 4] = [
        PolicyLevel::Normal,
        PolicyLevel::Watch,
        PolicyLevel::Restricted,
        PolicyLevel::Halted,
    ];

    /// One step more restrictive, clamped at `Halted`
    pub fn escalated(self) -> Self {
        match self {
            Self::Normal => Self::Watch,
            Self::Watch => Self::Restricted,
            Self::Restricted | Self::Halted => Self::Halted,
        }
    }

    /// One step less restrictive, clamped at `Normal`
    pub fn deescalated(self) -> Self {
        match self {
            Self::Normal | Self::Watch => Self::Normal,
            Self::Restricted => Self::Watch,
            Self::Halted => Self::Restricted,
        }
    }

    pub fn is_most_restrictive(&self) -> bool {
        matches!(self, Self::Halted)
    }

    /// Whether admission should run in emergency mode at this level
    pub fn requires_emergency_admission(&self) -> bool {
        matches!(self, Self::Restricted | Self::Halted)
    }

    pub fn allows_dispatch(&self) -> bool {
        !matches!(self, Self::Halted)
    }
}

impl fmt::Display for PolicyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Watch => write!(f, "watch"),
            Self::Restricted => write!(f, "restricted"),
            Self::Halted => write!(f, "halted"),
        }
    }
}

impl std::str::FromStr for PolicyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "watch" => Ok(Self::Watch),
            "restricted" => Ok(Self::Restricted),
            "halted" => Ok(Self::Halted),
            _ => Err(format!("Invalid policy level: {s}")),
        }
    }
}
