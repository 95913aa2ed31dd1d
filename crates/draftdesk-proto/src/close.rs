//! WebSocket close codes.

use std::fmt;

/// Close code reported when a transport shuts down.
///
/// Only [`CloseCode::NORMAL`] is treated as a deliberate close. Every other
/// code, including ones we have never heard of, means the link dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloseCode(u16);

impl CloseCode {
    /// Normal closure (1000).
    pub const NORMAL: Self = Self(1000);
    /// Endpoint going away, e.g. server restart (1001).
    pub const GOING_AWAY: Self = Self(1001);
    /// Connection lost without a close frame (1006). Never sent on the wire.
    pub const ABNORMAL: Self = Self(1006);
    /// Server hit an unexpected condition (1011).
    pub const INTERNAL_ERROR: Self = Self(1011);

    /// Wrap a raw code.
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Raw numeric value.
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Whether this is the normal-closure code.
    pub const fn is_normal(self) -> bool {
        self.0 == Self::NORMAL.0
    }

    /// Whether the code is reserved for local reporting and must not appear
    /// in a close frame (1005, 1006, 1015).
    pub const fn is_reserved(self) -> bool {
        matches!(self.0, 1005 | 1006 | 1015)
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.0
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
