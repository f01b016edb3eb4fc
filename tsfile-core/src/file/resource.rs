//! `FileResource` (§3): a closed file is immutable and fully indexed; an
//! unclosed file additionally carries a `ReadOnlyMemChunk` tail of
//! unflushed points and an end-time map used to pre-filter resources
//! before touching disk (§4.8 step 1).

use crate::error::Result;
use crate::merge::priority::IPointReader;
use crate::stats::Statistics;
use crate::types::{DataType, TimeValuePair, Value};
use std::collections::HashMap;
use std::path::PathBuf;

/// The in-memory tail of an unclosed file: points not yet flushed to a
/// disk chunk. Always the highest-priority source for its series (§3).
#[derive(Clone, Debug)]
pub struct ReadOnlyMemChunk {
    pub measurement_uid: String,
    pub data_type: DataType,
    /// Ascending by timestamp, matching the on-disk ordering contract.
    pub points: Vec<TimeValuePair>,
}

impl ReadOnlyMemChunk {
    pub fn new(measurement_uid: impl Into<String>, data_type: DataType, points: Vec<TimeValuePair>) -> Self {
        Self {
            measurement_uid: measurement_uid.into(),
            data_type,
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start_time(&self) -> Option<i64> {
        self.points.first().map(|p| p.timestamp)
    }

    pub fn end_time(&self) -> Option<i64> {
        self.points.last().map(|p| p.timestamp)
    }

    pub fn statistics(&self) -> Result<Statistics> {
        let mut stats = Statistics::empty(self.data_type);
        for p in &self.points {
            stats.update(&p.value)?;
        }
        Ok(stats)
    }

    pub fn point_reader(&self, deleted_at: i64) -> MemChunkPointReader {
        MemChunkPointReader {
            points: self.points.clone(),
            pos: 0,
            deleted_at,
        }
    }
}

/// Streams a mem-chunk's points, applying the deletion watermark the same
/// way a page reader would (`time > deleted_at`).
pub struct MemChunkPointReader {
    points: Vec<TimeValuePair>,
    pos: usize,
    deleted_at: i64,
}

impl IPointReader for MemChunkPointReader {
    fn has_next(&mut self) -> Result<bool> {
        while self.pos < self.points.len() && self.points[self.pos].timestamp <= self.deleted_at {
            self.pos += 1;
        }
        Ok(self.pos < self.points.len())
    }

    fn current(&self) -> TimeValuePair {
        self.points[self.pos].clone()
    }

    fn advance(&mut self) -> Result<()> {
        self.pos += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.pos = self.points.len();
    }
}

/// A resource backing a query: either a closed, fully-indexed file, or an
/// unclosed file with an in-memory tail.
pub struct FileResource {
    pub path: PathBuf,
    pub closed: bool,
    pub version: u64,
    /// Last flushed timestamp per series, populated for unclosed files so
    /// `ResourceFilter` can prune without a disk read.
    pub end_times: HashMap<String, i64>,
    pub mem_chunk: Option<ReadOnlyMemChunk>,
}

impl FileResource {
    pub fn closed(path: impl Into<PathBuf>, version: u64) -> Self {
        Self {
            path: path.into(),
            closed: true,
            version,
            end_times: HashMap::new(),
            mem_chunk: None,
        }
    }

    pub fn unclosed(path: impl Into<PathBuf>, version: u64) -> Self {
        Self {
            path: path.into(),
            closed: false,
            version,
            end_times: HashMap::new(),
            mem_chunk: None,
        }
    }

    pub fn with_end_time(mut self, path: impl Into<String>, ts: i64) -> Self {
        self.end_times.insert(path.into(), ts);
        self
    }

    pub fn with_mem_chunk(mut self, chunk: ReadOnlyMemChunk) -> Self {
        self.mem_chunk = Some(chunk);
        self
    }
}
