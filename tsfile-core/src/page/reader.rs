//! `PageReader` (C3): decodes one decompressed page into a `BatchData`,
//! applying the deletion watermark before the caller's filter so a
//! value-referencing filter never observes tombstoned data.
//!
//! A page's decompressed body is laid out as `i32 time_section_len`,
//! followed by the time column's encoded bytes, followed by the value
//! column's encoded bytes — mirroring the teacher's `FileReader` shape of
//! "buffer one decoded unit, refill by decompressing the next on
//! exhaustion", except a page is small and bounded so decoding happens in
//! one pass rather than lazily per `read()` call.

use crate::decode::new_decoder;
use crate::error::{Result, TsReadError};
use crate::filter::Filter;
use crate::page::batch::BatchData;
use crate::types::{DataType, Endianness};

pub struct PageReader;

impl PageReader {
    /// Decodes `page_body` (already decompressed) into a `BatchData`,
    /// keeping only points with `time > deleted_at` that also satisfy
    /// `filter` (when present).
    pub fn decode(
        page_body: &[u8],
        data_type: DataType,
        endianness: Endianness,
        time_encoding: u8,
        value_encoding: u8,
        filter: Option<&dyn Filter>,
        deleted_at: i64,
    ) -> Result<BatchData> {
        if page_body.len() < 4 {
            return Err(TsReadError::CorruptChunk(
                "page body too short for time section length".into(),
            ));
        }
        let time_len_bytes: [u8; 4] = page_body[0..4].try_into().unwrap();
        let time_len = i32::from_le_bytes(time_len_bytes);
        if time_len < 0 || 4 + time_len as usize > page_body.len() {
            return Err(TsReadError::CorruptChunk(format!(
                "page time section length {time_len} out of bounds"
            )));
        }
        let (mut time_slice, mut value_slice) = {
            let rest = &page_body[4..];
            rest.split_at(time_len as usize)
        };

        let mut time_decoder = new_decoder(time_encoding)?;
        let mut value_decoder = new_decoder(value_encoding)?;
        time_decoder.set_endianness(endianness);
        value_decoder.set_endianness(endianness);

        let mut batch = BatchData::new(data_type);
        while time_decoder.has_next(time_slice) {
            let time_value = time_decoder.next(&mut time_slice, DataType::I64)?;
            let time = time_value
                .as_i64()
                .ok_or_else(|| TsReadError::Decode("time column did not decode to an integer".into()))?;
            let value = value_decoder.next(&mut value_slice, data_type)?;

            if time <= deleted_at {
                continue;
            }
            if let Some(f) = filter {
                if !f.accepts_point(time, &value) {
                    continue;
                }
            }
            batch.put_time(time);
            batch.put(value);
        }

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{TimeFilter, TimeOp};
    use crate::types::Value;

    fn build_plain_page(times: &[i64], values: &[f64]) -> Vec<u8> {
        let mut time_bytes = Vec::new();
        for t in times {
            time_bytes.extend_from_slice(&t.to_le_bytes());
        }
        let mut value_bytes = Vec::new();
        for v in values {
            value_bytes.extend_from_slice(&v.to_le_bytes());
        }
        let mut body = Vec::new();
        body.extend_from_slice(&(time_bytes.len() as i32).to_le_bytes());
        body.extend_from_slice(&time_bytes);
        body.extend_from_slice(&value_bytes);
        body
    }

    #[test]
    fn decodes_all_points_with_no_filter_or_deletion() {
        let body = build_plain_page(&[1, 2, 3], &[1.1, 2.2, 3.3]);
        let batch =
            PageReader::decode(&body, DataType::F64, Endianness::Little, 0, 0, None, -1).unwrap();
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn deletion_watermark_applies_before_filter() {
        let body = build_plain_page(&[1, 2, 3], &[100.0, 100.0, 100.0]);
        // A value filter that would accept everything; only the watermark prunes.
        let batch =
            PageReader::decode(&body, DataType::F64, Endianness::Little, 0, 0, None, 2).unwrap();
        let mut times = Vec::new();
        let mut b = batch;
        while b.has_next() {
            times.push(b.current_time());
            b.advance();
        }
        assert_eq!(times, vec![3]);
    }

    #[test]
    fn filter_rejects_points_after_watermark() {
        let body = build_plain_page(&[10, 60, 90], &[10.0, 60.0, 90.0]);
        let filter = TimeFilter::new(TimeOp::Gt, 50);
        let batch = PageReader::decode(
            &body,
            DataType::F64,
            Endianness::Little,
            0,
            0,
            Some(&filter),
            -1,
        )
        .unwrap();
        let mut out = Vec::new();
        let mut b = batch;
        while b.has_next() {
            out.push((b.current_time(), b.current_value().clone()));
            b.advance();
        }
        assert_eq!(out, vec![(60, Value::F64(60.0)), (90, Value::F64(90.0))]);
    }
}
