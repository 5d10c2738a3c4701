//! Pagination bounds.
//!
//! `Pagination` can only be built through [`Pagination::clamped`], so every
//! value that reaches a store already satisfies `0 < limit <= MAX_LIMIT` and
//! `offset >= 0`.

/// Page size used when the caller gives none (or a non-positive one).
pub const DEFAULT_LIMIT: u32 = 20;

/// Largest page a caller may request.
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    limit: u32,
    offset: u64,
}

impl Pagination {
    /// Normalize caller-supplied values.
    ///
    /// Oversized limits clamp to [`MAX_LIMIT`], absent or non-positive limits
    /// fall back to [`DEFAULT_LIMIT`], and negative offsets become zero.
    pub fn clamped(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = match limit {
            Some(l) if l > i64::from(MAX_LIMIT) => MAX_LIMIT,
            Some(l) if l > 0 => l as u32,
            _ => DEFAULT_LIMIT,
        };
        let offset = offset.map_or(0, |o| o.max(0).unsigned_abs());

        Self { limit, offset }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::clamped(None, None)
    }
}
