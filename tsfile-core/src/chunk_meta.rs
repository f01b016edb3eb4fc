//! `ChunkMetaData` (C2): an immutable locator + summary for one chunk.

use crate::error::Result;
use crate::filter::Filter;
use crate::stats::Statistics;
use crate::types::DataType;

/// Opaque handle a `ChunkMetaData` carries instead of a back-pointer to
/// its owning file resource, so metadata and file resources never form a
/// reference cycle. `FileReaderCache`/`ChunkLoader` resolve it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoaderHandle(pub u64);

#[derive(Clone, Debug)]
pub struct ChunkMetaData {
    pub measurement_uid: String,
    pub offset: u64,
    pub num_points: i64,
    pub start_time: i64,
    pub end_time: i64,
    pub data_type: DataType,
    pub version: u64,
    pub deleted_at: i64,
    pub statistics: Statistics,
    pub loader: LoaderHandle,
    pub priority: u64,
}

impl ChunkMetaData {
    /// Delegates to `filter.accepts_stats(statistics, start_time, end_time)`.
    pub fn satisfies(&self, filter: &dyn Filter) -> bool {
        filter.accepts_stats(&self.statistics, self.start_time, self.end_time)
    }

    pub fn is_deleted_above(&self, ts: i64) -> bool {
        ts <= self.deleted_at
    }

    /// Raises `deleted_at` to the tightest (largest) bound that applies,
    /// used when folding modifications into metadata at load time.
    pub fn apply_deletion_bound(&mut self, bound: i64) {
        if bound > self.deleted_at {
            self.deleted_at = bound;
        }
    }

    pub fn validate_invariants(&self) -> Result<()> {
        if self.start_time > self.end_time {
            return Err(crate::error::TsReadError::CorruptChunk(format!(
                "chunk {} has start_time {} > end_time {}",
                self.measurement_uid, self.start_time, self.end_time
            )));
        }
        if !self.statistics.is_empty() && self.statistics.count() != self.num_points as u64 {
            return Err(crate::error::TsReadError::CorruptChunk(format!(
                "chunk {} statistics.count {} != num_points {}",
                self.measurement_uid,
                self.statistics.count(),
                self.num_points
            )));
        }
        Ok(())
    }
}
