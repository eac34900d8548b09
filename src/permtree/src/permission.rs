//! Permission bit-masks

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Permission mask attached to a rule
    ///
    /// The named flags are the default catalogue; callers are free to use
    /// any other bit, which is carried through every operation untouched.
    /// An empty mask means "no permissions" and is how a rule denies access.
    ///
    /// # Examples
    ///
    /// ```
    /// use permtree::Permission;
    ///
    /// let granted = Permission::READ | Permission::WRITE;
    /// assert!(granted.grants(Permission::READ));
    /// assert!(!granted.grants(Permission::READ | Permission::CREATE));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Permission: u32 {
        /// Read access
        const READ = 0x01;
        /// Write (update) access
        const WRITE = 0x02;
        /// Create access
        const CREATE = 0x04;
        /// Delete access
        const DELETE = 0x08;
        /// Read and write
        const RW = Self::READ.bits() | Self::WRITE.bits();

        // Caller-defined bits
        const _ = !0;
    }
}

impl Permission {
    /// No permissions; the mask of an explicit deny rule
    pub const DENY: Self = Self::empty();

    const CATALOGUE: Self = Self::READ
        .union(Self::WRITE)
        .union(Self::CREATE)
        .union(Self::DELETE);

    /// Wraps a raw mask, keeping every bit
    pub const fn from_mask(mask: u32) -> Self {
        Self::from_bits_retain(mask)
    }

    /// Returns `true` if every bit of `required` is present in this mask
    #[must_use]
    pub fn grants(self, required: Permission) -> bool {
        self.contains(required)
    }

    /// Parses a compact flag string such as `"crwd"`
    ///
    /// `c` = CREATE, `r` = READ, `w` or `u` = WRITE, `d` = DELETE.
    /// Unknown characters are ignored.
    pub fn parse_flags(flags: &str) -> Self {
        flags.chars().fold(Self::empty(), |acc, c| {
            acc | match c.to_ascii_lowercase() {
                'c' => Self::CREATE,
                'r' => Self::READ,
                'w' | 'u' => Self::WRITE,
                'd' => Self::DELETE,
                _ => Self::empty(),
            }
        })
    }
}

impl Default for Permission {
    fn default() -> Self {
        Self::DENY
    }
}

impl From<u32> for Permission {
    fn from(mask: u32) -> Self {
        Self::from_mask(mask)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(none)");
        }

        let mut parts: Vec<String> = self.iter_names().map(|(name, _)| name.to_string()).collect();
        let extra = self.bits() & !Self::CATALOGUE.bits();
        if extra != 0 {
            parts.push(format!("{:#x}", extra));
        }
        write!(f, "{}", parts.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rw_is_union() {
        assert_eq!(Permission::RW, Permission::READ | Permission::WRITE);
    }

    #[test]
    fn test_grants_requires_every_bit() {
        let mask = Permission::READ | Permission::WRITE;
        assert!(mask.grants(Permission::READ));
        assert!(mask.grants(Permission::WRITE));
        assert!(mask.grants(Permission::RW));
        assert!(!mask.grants(Permission::READ | Permission::WRITE | Permission::CREATE));
    }

    #[test]
    fn test_deny_grants_nothing() {
        assert!(!Permission::DENY.grants(Permission::READ));
        assert!(Permission::DENY.grants(Permission::empty()));
    }

    #[test]
    fn test_custom_bits_survive() {
        let custom = Permission::from_mask(0x40);
        let mask = Permission::READ | custom;
        assert_eq!(mask.bits(), 0x41);
        assert!(mask.grants(custom));
        assert!(!Permission::READ.grants(custom));
    }

    #[test]
    fn test_parse_flags() {
        assert_eq!(Permission::parse_flags("c"), Permission::CREATE);
        assert_eq!(Permission::parse_flags("cr"), Permission::CREATE | Permission::READ);
        assert_eq!(
            Permission::parse_flags("crud"),
            Permission::CREATE | Permission::READ | Permission::WRITE | Permission::DELETE
        );
        assert_eq!(Permission::parse_flags("RW"), Permission::RW);
        assert_eq!(Permission::parse_flags(""), Permission::empty());
        assert_eq!(Permission::parse_flags("xyz"), Permission::empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(Permission::READ.to_string(), "READ");
        assert_eq!(Permission::RW.to_string(), "READ | WRITE");
        assert_eq!(Permission::DENY.to_string(), "(none)");
        assert_eq!((Permission::READ | Permission::from_mask(0x40)).to_string(), "READ | 0x40");
    }
}
