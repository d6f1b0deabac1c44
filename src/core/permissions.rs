//! Access levels for console access control.
//!
//! Lower levels are more privileged: an invoker may run a command when its
//! own level is numerically less than or equal to the command's level.

#[cfg(feature = "persist")]
use serde::{Deserialize, Serialize};

/// Access level of a command or of the invoking console.
///
/// Levels are ordered from most to least privileged:
/// `Admin < Moderator < Helper < User`
///
/// A command registered with level `Helper` can be run by admins,
/// moderators and helpers, but not by plain users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "persist", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum AccessLevel {
    /// Full rcon access.
    #[default]
    Admin = 0,
    /// Moderators (ban, kick, mute).
    Moderator = 1,
    /// Helpers with a few extra commands.
    Helper = 2,
    /// Anyone, e.g. chat commands.
    User = 3,
}

impl AccessLevel {
    /// Get the display name for this access level.
    pub fn name(&self) -> &'static str {
        match self {
            AccessLevel::Admin => "admin",
            AccessLevel::Moderator => "moderator",
            AccessLevel::Helper => "helper",
            AccessLevel::User => "user",
        }
    }

    /// Convert a numeric level, clamping out-of-range values.
    pub fn from_i32_clamped(level: i32) -> Self {
        match level {
            i32::MIN..=0 => AccessLevel::Admin,
            1 => AccessLevel::Moderator,
            2 => AccessLevel::Helper,
            _ => AccessLevel::User,
        }
    }

    /// Numeric value of this level.
    #[inline]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if an invoker at this level may run a command requiring `required`.
    #[inline]
    pub fn permits(self, required: AccessLevel) -> bool {
        self <= required
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
