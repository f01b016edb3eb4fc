//! Per-column summary statistics (C1).
//!
//! `Statistics` is the tagged union design note asks for: `data_type` is
//! the tag, and every operation that needs type-specific behaviour
//! (ordering, summation, wire encoding) dispatches once on
//! `data_type`/`Value` rather than duplicating a struct per type.
//!
//! Build order matters: `update`/`update_batch` assume values arrive in
//! the chunk's natural ascending-time order (pages inside a chunk are
//! stored in ascending start-time order), so "first" is simply the value
//! passed to the first `update` call and "last" is whatever the most
//! recent call passed. `merge(self, other)` assumes `self` covers the
//! earlier time range and `other` the later one — the same assumption the
//! page-into-chunk and chunk-into-resource build-up already relies on.

use crate::error::{Result, TsReadError};
use crate::types::{DataType, Value};
use std::io::Write;

const SLOT_MIN: i16 = 0;
const SLOT_MAX: i16 = 1;
const SLOT_FIRST: i16 = 2;
const SLOT_LAST: i16 = 3;
const SLOT_SUM: i16 = 4;

const LEGACY_MIN: &str = "min_value";
const LEGACY_MAX: &str = "max_value";
const LEGACY_FIRST: &str = "first";
const LEGACY_LAST: &str = "last";
const LEGACY_SUM: &str = "sum";

#[derive(Clone, Debug, PartialEq)]
pub struct Statistics {
    data_type: DataType,
    count: u64,
    min: Option<Value>,
    max: Option<Value>,
    first: Option<Value>,
    last: Option<Value>,
    sum: f64,
}

impl Statistics {
    pub fn empty(data_type: DataType) -> Self {
        Self {
            data_type,
            count: 0,
            min: None,
            max: None,
            first: None,
            last: None,
            sum: 0.0,
        }
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sets the point count directly. `count` isn't itself one of the
    /// wire slots (§6) — it's carried by the enclosing page/chunk
    /// header's `num_points` instead — so the header-level code that
    /// knows the true count (`PageHeader::read_from`, `index_file`'s
    /// per-chunk merge) stamps it on after the fact rather than this
    /// type inventing one on deserialize.
    pub(crate) fn set_count(&mut self, count: u64) {
        self.count = count;
    }

    /// Whether any value has ever been recorded, independent of the
    /// bookkeeping `count` — a `Statistics` freshly decoded off the wire
    /// has real min/max/first/last/sum but its `count` isn't set until
    /// the caller stamps it from the header, so emptiness can't be
    /// decided from `count` alone.
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
    }

    pub fn min(&self) -> Option<&Value> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&Value> {
        self.max.as_ref()
    }

    pub fn first(&self) -> Option<&Value> {
        self.first.as_ref()
    }

    pub fn last(&self) -> Option<&Value> {
        self.last.as_ref()
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    fn check_type(&self, other: DataType) -> Result<()> {
        if self.data_type != other {
            return Err(TsReadError::StatisticsTypeMismatch(
                self.data_type.name(),
                other.name(),
            ));
        }
        Ok(())
    }

    /// Extends min/max, sets first once, overwrites last, adds to sum for
    /// numeric types, increments count.
    pub fn update(&mut self, value: &Value) -> Result<()> {
        self.check_type(value.data_type())?;

        if self.first.is_none() {
            self.first = Some(value.clone());
        }
        self.last = Some(value.clone());

        match &self.min {
            None => self.min = Some(value.clone()),
            Some(cur) => {
                if matches!(value.partial_cmp(cur), Some(std::cmp::Ordering::Less)) {
                    self.min = Some(value.clone());
                }
            }
        }
        match &self.max {
            None => self.max = Some(value.clone()),
            Some(cur) => {
                if matches!(value.partial_cmp(cur), Some(std::cmp::Ordering::Greater)) {
                    self.max = Some(value.clone());
                }
            }
        }

        if let Some(n) = value.as_f64() {
            self.sum += n;
        }
        self.count += 1;
        Ok(())
    }

    pub fn update_batch(&mut self, values: &[Value]) -> Result<()> {
        for v in values {
            self.update(v)?;
        }
        Ok(())
    }

    /// `self` must be the earlier-in-time operand, `other` the later one.
    pub fn merge(&mut self, other: &Statistics) -> Result<()> {
        self.check_type(other.data_type)?;
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            *self = other.clone();
            return Ok(());
        }

        if let (Some(a), Some(b)) = (&self.min, &other.min) {
            if matches!(b.partial_cmp(a), Some(std::cmp::Ordering::Less)) {
                self.min = Some(b.clone());
            }
        }
        if let (Some(a), Some(b)) = (&self.max, &other.max) {
            if matches!(b.partial_cmp(a), Some(std::cmp::Ordering::Greater)) {
                self.max = Some(b.clone());
            }
        }
        // self.first already holds the earlier operand's first value.
        self.last = other.last.clone();
        self.sum += other.sum;
        self.count += other.count;
        Ok(())
    }

    pub fn serialized_size(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let d = self.data_type.size_of_datum();
        if d >= 0 {
            4 * d as usize + 8
        } else {
            let text_len = |v: &Option<Value>| -> usize {
                match v {
                    Some(Value::Text(b)) => b.len(),
                    _ => 0,
                }
            };
            4 * 4
                + text_len(&self.min)
                + text_len(&self.max)
                + text_len(&self.first)
                + text_len(&self.last)
                + 8
        }
    }

    /// Count-prefixed `(slot_id, length, bytes)` entries, always in slot
    /// order `min,max,first,last,sum`. Writes nothing when empty.
    pub fn serialize(&self, sink: &mut impl Write) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        sink.write_all(&5i32.to_le_bytes())?;
        write_slot(sink, SLOT_MIN, &encode_value(self.min.as_ref().unwrap()))?;
        write_slot(sink, SLOT_MAX, &encode_value(self.max.as_ref().unwrap()))?;
        write_slot(sink, SLOT_FIRST, &encode_value(self.first.as_ref().unwrap()))?;
        write_slot(sink, SLOT_LAST, &encode_value(self.last.as_ref().unwrap()))?;
        write_slot(sink, SLOT_SUM, &self.sum.to_le_bytes())?;
        Ok(())
    }

    /// Reads either the current slot-id layout or the legacy named layout,
    /// sniffed by peeking the leading i32 as a putative name length and
    /// checking whether it decodes to a known legacy key.
    pub fn deserialize(buf: &mut &[u8], data_type: DataType) -> Result<Statistics> {
        if buf.is_empty() {
            return Ok(Statistics::empty(data_type));
        }
        if is_legacy_layout(buf) {
            deserialize_legacy(buf, data_type)
        } else {
            deserialize_slots(buf, data_type)
        }
    }
}

fn write_slot(sink: &mut impl Write, slot_id: i16, bytes: &[u8]) -> Result<()> {
    sink.write_all(&slot_id.to_le_bytes())?;
    sink.write_all(&(bytes.len() as i32).to_le_bytes())?;
    sink.write_all(bytes)?;
    Ok(())
}

fn encode_value(v: &Value) -> Vec<u8> {
    match v {
        Value::Bool(b) => vec![*b as u8],
        Value::I32(n) => n.to_le_bytes().to_vec(),
        Value::I64(n) => n.to_le_bytes().to_vec(),
        Value::F32(n) => n.to_le_bytes().to_vec(),
        Value::F64(n) => n.to_le_bytes().to_vec(),
        Value::Text(b) => b.clone(),
    }
}

fn decode_value(data_type: DataType, bytes: &[u8]) -> Result<Value> {
    let need = |n: usize| -> Result<()> {
        if bytes.len() != n {
            return Err(TsReadError::CorruptChunk(format!(
                "statistics value for {:?} has {} bytes, expected {}",
                data_type,
                bytes.len(),
                n
            )));
        }
        Ok(())
    };
    Ok(match data_type {
        DataType::Bool => {
            need(1)?;
            Value::Bool(bytes[0] != 0)
        }
        DataType::I32 => {
            need(4)?;
            Value::I32(i32::from_le_bytes(bytes.try_into().unwrap()))
        }
        DataType::I64 => {
            need(8)?;
            Value::I64(i64::from_le_bytes(bytes.try_into().unwrap()))
        }
        DataType::F32 => {
            need(4)?;
            Value::F32(f32::from_le_bytes(bytes.try_into().unwrap()))
        }
        DataType::F64 => {
            need(8)?;
            Value::F64(f64::from_le_bytes(bytes.try_into().unwrap()))
        }
        DataType::Text => Value::Text(bytes.to_vec()),
    })
}

fn known_legacy_name(s: &str) -> bool {
    matches!(s, LEGACY_MIN | LEGACY_MAX | LEGACY_FIRST | LEGACY_LAST | LEGACY_SUM)
}

/// Peeks (without consuming) whether `buf` starts with a legacy
/// `(i32 name_len, name_bytes)` header naming a known key.
fn is_legacy_layout(buf: &[u8]) -> bool {
    if buf.len() < 4 {
        return false;
    }
    let len = i32::from_le_bytes(buf[0..4].try_into().unwrap());
    if len <= 0 || len as usize > 32 || buf.len() < 4 + len as usize {
        return false;
    }
    match std::str::from_utf8(&buf[4..4 + len as usize]) {
        Ok(s) => known_legacy_name(s),
        Err(_) => false,
    }
}

fn deserialize_slots(buf: &mut &[u8], data_type: DataType) -> Result<Statistics> {
    let count = read_i32(buf)? as usize;
    let mut stats = Statistics::empty(data_type);
    let mut min = None;
    let mut max = None;
    let mut first = None;
    let mut last = None;
    let mut sum = 0.0f64;

    for _ in 0..count {
        let slot_id = read_i16(buf)?;
        let len = read_i32(buf)? as usize;
        let bytes = read_n(buf, len)?;
        match slot_id {
            SLOT_MIN => min = Some(decode_value(data_type, bytes)?),
            SLOT_MAX => max = Some(decode_value(data_type, bytes)?),
            SLOT_FIRST => first = Some(decode_value(data_type, bytes)?),
            SLOT_LAST => last = Some(decode_value(data_type, bytes)?),
            SLOT_SUM => {
                if bytes.len() != 8 {
                    return Err(TsReadError::CorruptChunk(
                        "sum slot must be 8 bytes".to_string(),
                    ));
                }
                sum = f64::from_le_bytes(bytes.try_into().unwrap());
            }
            other => {
                return Err(TsReadError::CorruptChunk(format!(
                    "unknown statistics slot id {other}"
                )));
            }
        }
    }

    stats.min = min;
    stats.max = max;
    stats.first = first;
    stats.last = last;
    stats.sum = sum;
    // `count` is left at 0 — it isn't one of the wire slots (§6); the
    // enclosing header stamps the real value on via `set_count` once it
    // reads `num_points` (`PageHeader::read_from`, `index_file`).
    Ok(stats)
}

fn deserialize_legacy(buf: &mut &[u8], data_type: DataType) -> Result<Statistics> {
    let mut stats = Statistics::empty(data_type);
    let mut min = None;
    let mut max = None;
    let mut first = None;
    let mut last = None;
    let mut sum = 0.0f64;

    // Fixed key order on the wire: min_value, max_value, first, last, sum.
    let keys = [LEGACY_MIN, LEGACY_MAX, LEGACY_FIRST, LEGACY_LAST, LEGACY_SUM];
    for key in keys {
        if buf.is_empty() {
            break;
        }
        let name_len = read_i32(buf)? as usize;
        let name = std::str::from_utf8(read_n(buf, name_len)?)
            .map_err(|_| TsReadError::CorruptChunk("legacy statistics key not utf-8".into()))?;
        if name != key {
            return Err(TsReadError::CorruptChunk(format!(
                "legacy statistics key order mismatch: expected {key}, got {name}"
            )));
        }
        let val_len = read_i32(buf)? as usize;
        let val_bytes = read_n(buf, val_len)?;
        match key {
            LEGACY_MIN => min = Some(decode_value(data_type, val_bytes)?),
            LEGACY_MAX => max = Some(decode_value(data_type, val_bytes)?),
            LEGACY_FIRST => first = Some(decode_value(data_type, val_bytes)?),
            LEGACY_LAST => last = Some(decode_value(data_type, val_bytes)?),
            LEGACY_SUM => {
                if val_bytes.len() != 8 {
                    return Err(TsReadError::CorruptChunk("legacy sum must be 8 bytes".into()));
                }
                sum = f64::from_le_bytes(val_bytes.try_into().unwrap());
            }
            _ => unreachable!(),
        }
    }

    stats.min = min;
    stats.max = max;
    stats.first = first;
    stats.last = last;
    stats.sum = sum;
    // `count` is left at 0 here too; the enclosing header stamps it via
    // `set_count` once it reads `num_points`.
    Ok(stats)
}

fn read_i32(buf: &mut &[u8]) -> Result<i32> {
    let bytes = read_n(buf, 4)?;
    Ok(i32::from_le_bytes(bytes.try_into().unwrap()))
}

fn read_i16(buf: &mut &[u8]) -> Result<i16> {
    let bytes = read_n(buf, 2)?;
    Ok(i16::from_le_bytes(bytes.try_into().unwrap()))
}

fn read_n<'a>(buf: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    if buf.len() < n {
        return Err(TsReadError::CorruptChunk(format!(
            "statistics buffer underrun: need {n}, have {}",
            buf.len()
        )));
    }
    let (head, tail) = buf.split_at(n);
    *buf = tail;
    Ok(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_tracks_min_max_first_last_sum_count() {
        let mut s = Statistics::empty(DataType::F64);
        for v in [3.0, 1.0, 4.0, 1.0, 5.0] {
            s.update(&Value::F64(v)).unwrap();
        }
        assert_eq!(s.min(), Some(&Value::F64(1.0)));
        assert_eq!(s.max(), Some(&Value::F64(5.0)));
        assert_eq!(s.first(), Some(&Value::F64(3.0)));
        assert_eq!(s.last(), Some(&Value::F64(5.0)));
        assert_eq!(s.sum(), 14.0);
        assert_eq!(s.count(), 5);
    }

    #[test]
    fn merge_widens_min_max_and_keeps_earlier_first_later_last() {
        let mut early = Statistics::empty(DataType::I64);
        early.update_batch(&[Value::I64(10), Value::I64(20)]).unwrap();
        let mut late = Statistics::empty(DataType::I64);
        late.update_batch(&[Value::I64(5), Value::I64(30)]).unwrap();

        early.merge(&late).unwrap();
        assert_eq!(early.min(), Some(&Value::I64(5)));
        assert_eq!(early.max(), Some(&Value::I64(30)));
        assert_eq!(early.first(), Some(&Value::I64(10)));
        assert_eq!(early.last(), Some(&Value::I64(30)));
        assert_eq!(early.count(), 4);
    }

    #[test]
    fn merge_type_mismatch_errors_without_mutating() {
        let mut a = Statistics::empty(DataType::I64);
        a.update(&Value::I64(1)).unwrap();
        let before = a.clone();
        let mut b = Statistics::empty(DataType::F64);
        b.update(&Value::F64(1.0)).unwrap();

        let err = a.merge(&b).unwrap_err();
        assert!(matches!(err, TsReadError::StatisticsTypeMismatch(_, _)));
        assert_eq!(a, before);
    }

    #[test]
    fn serialize_deserialize_round_trips() {
        let mut s = Statistics::empty(DataType::F64);
        s.update_batch(&[Value::F64(1.5), Value::F64(-2.5), Value::F64(9.0)])
            .unwrap();

        let mut buf = Vec::new();
        s.serialize(&mut buf).unwrap();
        let mut slice = &buf[..];
        let back = Statistics::deserialize(&mut slice, DataType::F64).unwrap();

        assert_eq!(back.min(), s.min());
        assert_eq!(back.max(), s.max());
        assert_eq!(back.first(), s.first());
        assert_eq!(back.last(), s.last());
        assert_eq!(back.sum(), s.sum());
        assert!(slice.is_empty());
    }

    #[test]
    fn legacy_layout_decodes_to_same_content_as_slot_layout() {
        let mut s = Statistics::empty(DataType::I32);
        s.update_batch(&[Value::I32(7), Value::I32(2), Value::I32(42)])
            .unwrap();

        let mut modern = Vec::new();
        s.serialize(&mut modern).unwrap();

        let mut legacy = Vec::new();
        for (name, value) in [
            (LEGACY_MIN, s.min().unwrap().clone()),
            (LEGACY_MAX, s.max().unwrap().clone()),
            (LEGACY_FIRST, s.first().unwrap().clone()),
            (LEGACY_LAST, s.last().unwrap().clone()),
        ] {
            legacy
                .write_all(&(name.len() as i32).to_le_bytes())
                .unwrap();
            legacy.write_all(name.as_bytes()).unwrap();
            let bytes = encode_value(&value);
            legacy
                .write_all(&(bytes.len() as i32).to_le_bytes())
                .unwrap();
            legacy.write_all(&bytes).unwrap();
        }
        legacy
            .write_all(&(LEGACY_SUM.len() as i32).to_le_bytes())
            .unwrap();
        legacy.write_all(LEGACY_SUM.as_bytes()).unwrap();
        legacy.write_all(&8i32.to_le_bytes()).unwrap();
        legacy.write_all(&s.sum().to_le_bytes()).unwrap();

        let mut modern_slice = &modern[..];
        let mut legacy_slice = &legacy[..];
        assert!(is_legacy_layout(legacy_slice));
        assert!(!is_legacy_layout(modern_slice));

        let from_modern = Statistics::deserialize(&mut modern_slice, DataType::I32).unwrap();
        let from_legacy = Statistics::deserialize(&mut legacy_slice, DataType::I32).unwrap();

        assert_eq!(from_modern.min(), from_legacy.min());
        assert_eq!(from_modern.max(), from_legacy.max());
        assert_eq!(from_modern.first(), from_legacy.first());
        assert_eq!(from_modern.last(), from_legacy.last());
        assert_eq!(from_modern.sum(), from_legacy.sum());
    }

    #[test]
    fn empty_statistics_serialize_to_nothing() {
        let s = Statistics::empty(DataType::F64);
        let mut buf = Vec::new();
        s.serialize(&mut buf).unwrap();
        assert!(buf.is_empty());
        assert_eq!(s.serialized_size(), 0);
    }
}
