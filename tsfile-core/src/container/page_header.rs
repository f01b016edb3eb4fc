//! `PageHeader`: bit-exact layout preceding one page's compressed body.
//!
//! Wire layout: `i32 uncompressed_size`, `i32 compressed_size`,
//! `Statistics` blob, `i32 num_points`, `i64 max_timestamp`,
//! `i64 min_timestamp`.

use crate::error::{Result, TsReadError};
use crate::stats::Statistics;
use crate::types::DataType;
use std::io::{Read, Write};

#[derive(Debug, Clone, PartialEq)]
pub struct PageHeader {
    pub uncompressed_size: i32,
    pub compressed_size: i32,
    pub statistics: Statistics,
    pub num_points: i32,
    pub max_timestamp: i64,
    pub min_timestamp: i64,
}

impl PageHeader {
    pub fn write_to(&self, mut w: impl Write) -> Result<()> {
        w.write_all(&self.uncompressed_size.to_le_bytes())?;
        w.write_all(&self.compressed_size.to_le_bytes())?;

        let mut stats_buf = Vec::new();
        self.statistics.serialize(&mut stats_buf)?;
        w.write_all(&(stats_buf.len() as i32).to_le_bytes())?;
        w.write_all(&stats_buf)?;

        w.write_all(&self.num_points.to_le_bytes())?;
        w.write_all(&self.max_timestamp.to_le_bytes())?;
        w.write_all(&self.min_timestamp.to_le_bytes())?;
        Ok(())
    }

    /// `data_type` comes from the enclosing `ChunkHeader`; the statistics
    /// blob itself is data-type-agnostic on the wire.
    pub fn read_from(mut r: impl Read, data_type: DataType) -> Result<Self> {
        let mut i32_buf = [0u8; 4];
        r.read_exact(&mut i32_buf)?;
        let uncompressed_size = i32::from_le_bytes(i32_buf);
        r.read_exact(&mut i32_buf)?;
        let compressed_size = i32::from_le_bytes(i32_buf);

        r.read_exact(&mut i32_buf)?;
        let stats_len = i32::from_le_bytes(i32_buf);
        if stats_len < 0 {
            return Err(TsReadError::CorruptChunk("negative statistics length".into()));
        }
        let mut stats_bytes = vec![0u8; stats_len as usize];
        r.read_exact(&mut stats_bytes)?;
        let mut stats_slice = &stats_bytes[..];
        let mut statistics = Statistics::deserialize(&mut stats_slice, data_type)?;

        r.read_exact(&mut i32_buf)?;
        let num_points = i32::from_le_bytes(i32_buf);
        statistics.set_count(num_points.max(0) as u64);

        let mut i64_buf = [0u8; 8];
        r.read_exact(&mut i64_buf)?;
        let max_timestamp = i64::from_le_bytes(i64_buf);
        r.read_exact(&mut i64_buf)?;
        let min_timestamp = i64::from_le_bytes(i64_buf);

        Ok(Self {
            uncompressed_size,
            compressed_size,
            statistics,
            num_points,
            max_timestamp,
            min_timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn round_trips_through_bytes() {
        let mut stats = Statistics::empty(DataType::F64);
        stats.update_batch(&[Value::F64(1.0), Value::F64(2.0)]).unwrap();
        let header = PageHeader {
            uncompressed_size: 100,
            compressed_size: 40,
            statistics: stats,
            num_points: 2,
            max_timestamp: 20,
            min_timestamp: 10,
        };
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        let back = PageHeader::read_from(&buf[..], DataType::F64).unwrap();
        assert_eq!(header, back);
    }
}
