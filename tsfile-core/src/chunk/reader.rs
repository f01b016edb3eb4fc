//! `ChunkReader` (C4): iterates the pages of one chunk, pruning by page
//! header statistics before paying for decompression. Two variants share
//! one struct, distinguished by `Mode` — a filtered scan and a
//! point-lookup whose `page_satisfied` test is keyed off a target
//! timestamp instead of the filter.

use crate::batch_reader::IBatchReader;
use crate::chunk::Chunk;
use crate::codec::get_compressor;
use crate::container::page_header::PageHeader;
use crate::error::{Result, TsReadError};
use crate::filter::Filter;
use crate::page::batch::BatchData;
use crate::page::reader::PageReader;
use std::sync::Arc;

#[derive(Clone, Copy, Debug)]
enum Mode {
    Scan,
    PointLookup { current_timestamp: i64 },
}

pub struct ChunkReader {
    chunk: Chunk,
    pos: usize,
    filter: Option<Arc<dyn Filter>>,
    mode: Mode,
    cached_header: Option<PageHeader>,
    closed: bool,
}

impl ChunkReader {
    pub fn new_scan(chunk: Chunk, filter: Option<Arc<dyn Filter>>) -> Self {
        Self {
            chunk,
            pos: 0,
            filter,
            mode: Mode::Scan,
            cached_header: None,
            closed: false,
        }
    }

    pub fn new_point_lookup(chunk: Chunk, filter: Option<Arc<dyn Filter>>, ts: i64) -> Self {
        Self {
            chunk,
            pos: 0,
            filter,
            mode: Mode::PointLookup {
                current_timestamp: ts,
            },
            cached_header: None,
            closed: false,
        }
    }

    fn page_satisfied(&self, header: &PageHeader) -> bool {
        match self.mode {
            Mode::Scan => {
                let stats_ok = match &self.filter {
                    Some(f) => f.accepts_stats(&header.statistics, header.min_timestamp, header.max_timestamp),
                    None => true,
                };
                stats_ok && header.max_timestamp > self.chunk.deleted_at
            }
            Mode::PointLookup { current_timestamp } => header.max_timestamp >= current_timestamp,
        }
    }
}

impl IBatchReader for ChunkReader {
    fn has_next_batch(&mut self) -> Result<bool> {
        if self.closed {
            return Err(TsReadError::Cancelled);
        }
        if self.cached_header.is_some() {
            return Ok(true);
        }
        loop {
            if self.pos >= self.chunk.body.len() {
                return Ok(false);
            }
            let mut cursor = &self.chunk.body[self.pos..];
            let before = cursor.len();
            let header = PageHeader::read_from(&mut cursor, self.chunk.header.data_type)?;
            self.pos += before - cursor.len();

            let clen = header.compressed_size;
            if clen < 0 || self.pos + clen as usize > self.chunk.body.len() {
                return Err(TsReadError::CorruptChunk(format!(
                    "page compressed_size {clen} exceeds remaining chunk bytes"
                )));
            }

            if self.page_satisfied(&header) {
                self.cached_header = Some(header);
                return Ok(true);
            }
            self.pos += clen as usize;
        }
    }

    fn next_batch(&mut self) -> Result<BatchData> {
        if self.closed {
            return Err(TsReadError::Cancelled);
        }
        if self.cached_header.is_none() && !self.has_next_batch()? {
            return Ok(BatchData::new(self.chunk.header.data_type));
        }
        let header = self.cached_header.take().expect("checked above");
        let clen = header.compressed_size as usize;
        let compressed = &self.chunk.body[self.pos..self.pos + clen];
        self.pos += clen;

        let compressor = get_compressor(self.chunk.header.compression)?;
        let mut decompressed = Vec::with_capacity(header.uncompressed_size.max(0) as usize);
        compressor.decompress(&mut &compressed[..], &mut decompressed)?;

        // The wire layout carries one `encoding` byte per chunk (§3); the
        // time column and the value column both decode with it.
        PageReader::decode(
            &decompressed,
            self.chunk.header.data_type,
            self.chunk.header.endianness,
            self.chunk.header.encoding,
            self.chunk.header.encoding,
            self.filter.as_deref(),
            self.chunk.deleted_at,
        )
    }

    fn close(&mut self) {
        self.closed = true;
        self.cached_header = None;
    }
}
