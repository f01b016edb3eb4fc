//! Sequential chunk indexer: walks a raw file front to back, reading each
//! `ChunkHeader` and its pages' headers directly, to rebuild the
//! `ChunkMetaData` list a real metadata catalogue would otherwise hand
//! back. Grounded on the same "walk a positioned cursor over a table of
//! records" shape `ChunkReader`/`FileSeriesReader` already use for pages
//! and chunks, scaled up one level: whole chunks instead of pages. A page
//! header's statistics are readable without decompressing its body, so
//! indexing never pays for decompression.

use crate::chunk_meta::{ChunkMetaData, LoaderHandle};
use crate::container::chunk_header::ChunkHeader;
use crate::container::page_header::PageHeader;
use crate::error::{Result, TsReadError};
use crate::stats::Statistics;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Reads every chunk in `path`, in file order, and rebuilds its
/// `ChunkMetaData`. `version` is stamped onto every chunk found; `loader`
/// is left at a placeholder handle — callers overwrite it once the file
/// is registered with a `ChunkLoader`, the same way
/// `UnseqResourceMergeReader::build` does for its own sources.
pub fn index_file(path: &Path, version: u64) -> Result<Vec<ChunkMetaData>> {
    let mut file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut metas = Vec::new();

    loop {
        let offset = file.stream_position()?;
        if offset >= file_len {
            break;
        }

        let header = ChunkHeader::read_from(&mut file)?;
        if header.body_size < 0 {
            return Err(TsReadError::CorruptChunk("negative chunk body_size".into()));
        }
        let mut body = vec![0u8; header.body_size as usize];
        file.read_exact(&mut body)?;

        let mut stats = Statistics::empty(header.data_type);
        let mut num_points = 0i64;
        let mut start_time = i64::MAX;
        let mut end_time = i64::MIN;
        let mut pos = 0usize;

        for _ in 0..header.num_pages {
            let mut cursor = &body[pos..];
            let before = cursor.len();
            let page_header = PageHeader::read_from(&mut cursor, header.data_type)?;
            pos += before - cursor.len();

            let clen = page_header.compressed_size;
            if clen < 0 || pos + clen as usize > body.len() {
                return Err(TsReadError::CorruptChunk(format!(
                    "page compressed_size {clen} exceeds remaining chunk bytes"
                )));
            }
            pos += clen as usize;

            num_points += page_header.num_points as i64;
            start_time = start_time.min(page_header.min_timestamp);
            end_time = end_time.max(page_header.max_timestamp);
            stats.merge(&page_header.statistics)?;
        }

        // Each page's statistics already carries its own `num_points` as
        // count (stamped by `PageHeader::read_from`), so the merge above
        // sums to the chunk total on its own; set it explicitly so the
        // invariant holds even if a page's statistics came back empty.
        stats.set_count(num_points.max(0) as u64);

        metas.push(ChunkMetaData {
            measurement_uid: header.measurement_uid.clone(),
            offset,
            num_points,
            start_time: if num_points == 0 { 0 } else { start_time },
            end_time: if num_points == 0 { 0 } else { end_time },
            data_type: header.data_type,
            version,
            deleted_at: -1,
            statistics: stats,
            loader: LoaderHandle(0),
            priority: 0,
        });
    }

    Ok(metas)
}
