//! Context flags for console commands.
//!
//! A command's flags say which subsystems may register and invoke it
//! (server, client, chat, map scripts) and how the dispatcher treats it
//! (queueable, test-only, excluded from the audit history).

#[cfg(feature = "persist")]
use serde::{Deserialize, Serialize};

/// Bitset of command context flags.
///
/// Lookups match a command when its flags *intersect* the active mask, so a
/// command registered for `SERVER | CLIENT` is visible to either console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "persist", derive(Serialize, Deserialize), serde(transparent))]
pub struct CommandFlags(u32);

impl CommandFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);

    /// Variable is written out by the config writer.
    pub const SAVE: Self = Self(1 << 0);

    /// Available to the client console.
    pub const CLIENT: Self = Self(1 << 1);

    /// Available to the server console (local and rcon).
    pub const SERVER: Self = Self(1 << 2);

    /// Invocations are queued while command buffering is enabled.
    pub const STORE: Self = Self(1 << 3);

    /// Available to the external console (econ).
    pub const ECON: Self = Self(1 << 4);

    /// Test-only command, dropped unless test commands are enabled.
    pub const TEST: Self = Self(1 << 5);

    /// Invocable from in-game chat; always gets the user access level.
    pub const CHAT: Self = Self(1 << 6);

    /// Map-scoped: invocable from map scripts, refused from plain config files.
    pub const GAME: Self = Self(1 << 7);

    /// Not reported to the audit hook.
    pub const NON_HISTORIC: Self = Self(1 << 8);

    /// Every flag set. Useful as a lookup mask.
    pub const ALL: Self = Self((1 << 9) - 1);

    /// Build flags from raw bits.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check if every flag in `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any flag in `other` is set.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Combine two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Remove flags.
    #[inline]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Check if no flags are set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for CommandFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for CommandFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl std::ops::BitAnd for CommandFlags {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}
