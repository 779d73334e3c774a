//! Guild permission bitsets.
//!
//! The platform serializes permission sets as decimal strings of a 64-bit
//! flag field. `Permissions` wraps that field with the handful of flags the
//! bot cares about; holders of `ADMINISTRATOR` implicitly pass every check.

/// A resolved permission bitset for a member or role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions(pub u64);

impl Permissions {
    pub const ADMINISTRATOR: Permissions = Permissions(1 << 3);
    pub const MANAGE_MESSAGES: Permissions = Permissions(1 << 13);
    pub const USE_EXTERNAL_STICKERS: Permissions = Permissions(1 << 37);

    pub const fn empty() -> Permissions {
        Permissions(0)
    }

    /// Parse the decimal-string encoding used in role payloads.
    pub fn parse(raw: &str) -> Option<Permissions> {
        raw.parse::<u64>().ok().map(Permissions)
    }

    pub const fn union(self, other: Permissions) -> Permissions {
        Permissions(self.0 | other.0)
    }

    /// True when every bit of `flag` is present, or when the set carries
    /// `ADMINISTRATOR` (which overrides individual flags).
    pub fn contains(self, flag: Permissions) -> bool {
        if self.0 & Self::ADMINISTRATOR.0 != 0 {
            return true;
        }
        self.0 & flag.0 == flag.0
    }
}
