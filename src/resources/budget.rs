use crate::utils::constants::{MAX_SINGLE_EMBED_BYTES, MAX_TOTAL_EMBED_BYTES};

/// Monotonic byte accounting for one archival run.
///
/// `used` only ever grows; eviction does not exist. Once the aggregate cap
/// is hit the run stops admitting new resources and the output document is
/// simply less complete.
#[derive(Debug, Clone)]
pub struct ByteBudget {
    used: usize,
    max_total_bytes: usize,
    max_single_bytes: usize,
}

impl Default for ByteBudget {
    fn default() -> Self {
        Self::new(MAX_TOTAL_EMBED_BYTES, MAX_SINGLE_EMBED_BYTES)
    }
}

impl ByteBudget {
    pub fn new(max_total_bytes: usize, max_single_bytes: usize) -> Self {
        Self {
            used: 0,
            max_total_bytes,
            max_single_bytes,
        }
    }

    /// Would a body of `len` bytes be admitted right now?
    ///
    /// Zero-length bodies are rejected; an empty stylesheet or image is
    /// useless inlined and usually signals a failed response.
    #[must_use]
    pub fn admits(&self, len: usize) -> bool {
        len > 0 && len <= self.max_single_bytes && self.used + len <= self.max_total_bytes
    }

    /// Record `len` bytes as spent. Call only after `admits` returned true.
    pub fn consume(&mut self, len: usize) {
        self.used += len;
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.used >= self.max_total_bytes
    }

    #[must_use]
    pub fn used(&self) -> usize {
        self.used
    }

    #[must_use]
    pub fn max_single_bytes(&self) -> usize {
        self.max_single_bytes
    }
}
