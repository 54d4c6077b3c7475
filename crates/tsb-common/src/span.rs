//! Byte-offset spans into a compilation unit.
//!
//! Spans never carry line/column information; line mapping belongs to the
//! diagnostics reporter.

use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` in a unit's text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    #[inline]
    pub const fn len(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.end <= self.start
    }

    /// Whether `offset` falls inside the span. The end offset counts as inside
    /// so that a cursor placed right after an identifier still hits it.
    #[inline]
    pub const fn contains(self, offset: u32) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}
