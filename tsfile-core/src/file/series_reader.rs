//! `FileSeriesReader` (C5): iterates the chunks of one file for one
//! series, pruning chunks by their metadata's statistics before asking
//! `ChunkLoader` to materialise any bytes. Scan mode implements
//! `IBatchReader`; point-lookup mode exposes `value_at` directly, since
//! its contract (§4.5) isn't a batch contract at all.

use crate::batch_reader::IBatchReader;
use crate::chunk::ChunkReader;
use crate::chunk_meta::ChunkMetaData;
use crate::error::{Result, TsReadError};
use crate::file::loader::ChunkLoader;
use crate::filter::Filter;
use crate::page::batch::BatchData;
use crate::types::{DataType, Value};
use std::sync::Arc;

pub struct FileSeriesReader {
    data_type: DataType,
    /// Ascending by `start_time`, per the chunk-ordering invariant (§3).
    metas: Vec<ChunkMetaData>,
    cursor: usize,
    filter: Option<Arc<dyn Filter>>,
    loader: Arc<ChunkLoader>,
    current_chunk_reader: Option<ChunkReader>,
    /// The batch `value_at` is currently walking, retained across calls
    /// so a point opened while skipping toward an earlier `ts` is never
    /// dropped before a later call can reach it (mirrors
    /// `BatchPointReader`'s retained-batch cursor for the scan side).
    current_batch: Option<BatchData>,
    last_lookup_ts: Option<i64>,
    closed: bool,
}

impl FileSeriesReader {
    pub fn new(
        data_type: DataType,
        metas: Vec<ChunkMetaData>,
        filter: Option<Arc<dyn Filter>>,
        loader: Arc<ChunkLoader>,
    ) -> Self {
        Self {
            data_type,
            metas,
            cursor: 0,
            filter,
            loader,
            current_chunk_reader: None,
            current_batch: None,
            last_lookup_ts: None,
            closed: false,
        }
    }

    /// §4.5 point-lookup variant. Callers must pass non-decreasing `ts`
    /// across calls; a decreasing `ts` is rejected with
    /// `OutOfOrderLookup` rather than silently misbehaving.
    pub fn value_at(&mut self, ts: i64) -> Result<Option<Value>> {
        if self.closed {
            return Err(TsReadError::Cancelled);
        }
        if let Some(previous) = self.last_lookup_ts {
            if ts < previous {
                return Err(TsReadError::OutOfOrderLookup { previous, requested: ts });
            }
        }
        self.last_lookup_ts = Some(ts);

        loop {
            // Drain whatever batch is already open before asking for a
            // new page or chunk — a batch opened by an earlier, smaller
            // `ts` may still hold the point this call is after.
            if let Some(batch) = &mut self.current_batch {
                while batch.has_next() && batch.current_time() < ts {
                    batch.advance();
                }
                if batch.has_next() {
                    let current_time = batch.current_time();
                    if current_time == ts {
                        let value = batch.current_value().clone();
                        batch.advance();
                        return Ok(Some(value));
                    }
                    return Ok(None);
                }
                // Exhausted: fall through and pull the next page/chunk.
                self.current_batch = None;
            }

            if self.current_chunk_reader.is_none() {
                let mut opened = false;
                while self.cursor < self.metas.len() {
                    let meta = self.metas[self.cursor].clone();
                    self.cursor += 1;
                    if meta.end_time >= ts {
                        let chunk = self.loader.load(&meta)?;
                        self.current_chunk_reader =
                            Some(ChunkReader::new_point_lookup(chunk, self.filter.clone(), ts));
                        opened = true;
                        break;
                    }
                }
                if !opened {
                    return Ok(None);
                }
            }

            let cr = self.current_chunk_reader.as_mut().expect("just opened or already present");
            if !cr.has_next_batch()? {
                cr.close();
                self.current_chunk_reader = None;
                continue;
            }
            self.current_batch = Some(cr.next_batch()?);
        }
    }
}

impl IBatchReader for FileSeriesReader {
    fn has_next_batch(&mut self) -> Result<bool> {
        if self.closed {
            return Err(TsReadError::Cancelled);
        }
        loop {
            if let Some(cr) = &mut self.current_chunk_reader {
                if cr.has_next_batch()? {
                    return Ok(true);
                }
                cr.close();
                self.current_chunk_reader = None;
            }

            let mut opened = false;
            while self.cursor < self.metas.len() {
                let meta = self.metas[self.cursor].clone();
                self.cursor += 1;
                let satisfies = match &self.filter {
                    Some(f) => meta.satisfies(f.as_ref()),
                    None => true,
                };
                if satisfies {
                    let chunk = self.loader.load(&meta)?;
                    self.current_chunk_reader = Some(ChunkReader::new_scan(chunk, self.filter.clone()));
                    opened = true;
                    break;
                }
            }
            if !opened {
                return Ok(false);
            }
        }
    }

    fn next_batch(&mut self) -> Result<BatchData> {
        if self.closed {
            return Err(TsReadError::Cancelled);
        }
        match &mut self.current_chunk_reader {
            Some(cr) => cr.next_batch(),
            None => Ok(BatchData::new(self.data_type)),
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        if let Some(cr) = &mut self.current_chunk_reader {
            cr.close();
        }
        self.current_chunk_reader = None;
        self.current_batch = None;
        self.closed = true;
    }
}
