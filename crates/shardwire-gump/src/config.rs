use serde::Deserialize;

/// Default cap on a single inflated block: 1 MiB.
pub const DEFAULT_MAX_DECOMPRESSED_LEN: usize = 1024 * 1024;

/// Default cap on the number of text lines in one layout.
pub const DEFAULT_MAX_LINES: usize = 4096;

/// Bounds applied while decoding layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Largest declared decompressed size accepted for either block.
    pub max_decompressed_len: usize,
    /// Largest declared line count accepted.
    pub max_lines: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_decompressed_len: DEFAULT_MAX_DECOMPRESSED_LEN,
            max_lines: DEFAULT_MAX_LINES,
        }
    }
}
