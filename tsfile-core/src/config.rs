use serde::{Deserialize, Serialize};

/// Knobs threaded through to the read path by the caller. The crate never
/// loads this from a file or environment — config loading is an external
/// collaborator — callers construct it however they like and pass it in.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Maximum number of open file handles `FileReaderCache` holds at once.
    pub file_cache_capacity: usize,
    /// Maximum points per `BatchData` (default 10_000).
    pub batch_size: usize,
    /// When true, `UnseqResourceMergeReader` opens the next pending chunk's
    /// reader as soon as the heap's top timestamp reaches its start time,
    /// rather than waiting until the current readers are exhausted.
    pub eager_unseq_prefetch: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            file_cache_capacity: 128,
            batch_size: 10_000,
            eager_unseq_prefetch: true,
        }
    }
}
