//! Zstd filter - compresses encoder output

use crate::{Filter, FilterError};

/// Compresses the encoded buffer with zstd.
///
/// Applied after encoding, so a whole batch compresses as one frame.
#[derive(Debug, Clone)]
pub struct ZstdFilter {
    level: i32,
}

impl ZstdFilter {
    /// Create a filter at the given compression level.
    ///
    /// Levels follow zstd semantics; 0 selects the library default.
    pub fn new(level: i32) -> Self {
        Self { level }
    }

    /// The configured compression level.
    pub fn level(&self) -> i32 {
        self.level
    }
}

impl Default for ZstdFilter {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Filter for ZstdFilter {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn filter(&self, input: Vec<u8>) -> Result<Vec<u8>, FilterError> {
        zstd::encode_all(input.as_slice(), self.level).map_err(FilterError::from)
    }
}
