//! The ordered access-level enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Permission tier under the total order `None < View < Edit < Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AccessLevel {
    /// No access.
    None = 0,
    /// Read-only access.
    View = 1,
    /// Read and modify.
    Edit = 2,
    /// Full control, including administrative operations.
    Full = 3,
}

impl AccessLevel {
    /// Convert to u8 for storage.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Try to parse from u8.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::View),
            2 => Some(Self::Edit),
            3 => Some(Self::Full),
            _ => None,
        }
    }

    /// Whether this level satisfies a required level.
    pub fn permits(self, required: AccessLevel) -> bool {
        self >= required
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessLevel::None => "none",
            AccessLevel::View => "view",
            AccessLevel::Edit => "edit",
            AccessLevel::Full => "full",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        assert!(AccessLevel::None < AccessLevel::View);
        assert!(AccessLevel::View < AccessLevel::Edit);
        assert!(AccessLevel::Edit < AccessLevel::Full);
    }

    #[test]
    fn test_permits_is_monotone() {
        let levels = [
            AccessLevel::None,
            AccessLevel::View,
            AccessLevel::Edit,
            AccessLevel::Full,
        ];
        for &granted in &levels {
            for &lo in &levels {
                for &hi in &levels {
                    if lo <= hi && granted.permits(hi) {
                        assert!(granted.permits(lo));
                    }
                }
            }
        }
    }

    #[test]
    fn test_u8_roundtrip() {
        for v in 0..=3u8 {
            assert_eq!(AccessLevel::from_u8(v).unwrap().to_u8(), v);
        }
        assert_eq!(AccessLevel::from_u8(4), None);
    }
}
