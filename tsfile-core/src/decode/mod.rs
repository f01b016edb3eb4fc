//! Per-type value decoding plug-in point. A page's body is a compressed
//! run of encoded values; after decompression a `Decoder` turns that byte
//! run back into `Value`s one at a time.
//!
//! Decoder state is never shared between pages — each `PageReader` owns
//! its own decoder instance and calls `reset()` between pages.

use crate::error::{Result, TsReadError};
use crate::types::{DataType, Endianness, Value};

pub trait Decoder: Send {
    fn reset(&mut self);
    fn set_endianness(&mut self, endianness: Endianness);
    /// Whether at least one more value can be decoded from `buf`.
    fn has_next(&self, buf: &[u8]) -> bool;
    /// Decodes one value, advancing `buf` past the bytes consumed.
    fn next(&mut self, buf: &mut &[u8], data_type: DataType) -> Result<Value>;
}

pub mod plain;
pub mod rle;

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EncodingId {
    Plain = 0,
    Rle = 1,
}

impl EncodingId {
    pub fn from_u8(b: u8) -> Result<Self> {
        match b {
            0 => Ok(EncodingId::Plain),
            1 => Ok(EncodingId::Rle),
            other => Err(TsReadError::CorruptChunk(format!(
                "unknown value encoding id {other}"
            ))),
        }
    }
}

pub fn new_decoder(encoding: u8) -> Result<Box<dyn Decoder>> {
    match EncodingId::from_u8(encoding)? {
        EncodingId::Plain => Ok(Box::new(plain::PlainDecoder::new())),
        EncodingId::Rle => Ok(Box::new(rle::RleDecoder::new())),
    }
}

pub(crate) fn read_exact<'a>(buf: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    if buf.len() < n {
        return Err(TsReadError::Decode(format!(
            "decoder needs {n} bytes, page has {}",
            buf.len()
        )));
    }
    let (head, tail) = buf.split_at(n);
    *buf = tail;
    Ok(head)
}

pub(crate) fn decode_fixed(
    data_type: DataType,
    endianness: Endianness,
    buf: &mut &[u8],
) -> Result<Value> {
    let big = endianness == Endianness::Big;
    Ok(match data_type {
        DataType::Bool => Value::Bool(read_exact(buf, 1)?[0] != 0),
        DataType::I32 => {
            let b: [u8; 4] = read_exact(buf, 4)?.try_into().unwrap();
            Value::I32(if big { i32::from_be_bytes(b) } else { i32::from_le_bytes(b) })
        }
        DataType::I64 => {
            let b: [u8; 8] = read_exact(buf, 8)?.try_into().unwrap();
            Value::I64(if big { i64::from_be_bytes(b) } else { i64::from_le_bytes(b) })
        }
        DataType::F32 => {
            let b: [u8; 4] = read_exact(buf, 4)?.try_into().unwrap();
            Value::F32(if big { f32::from_be_bytes(b) } else { f32::from_le_bytes(b) })
        }
        DataType::F64 => {
            let b: [u8; 8] = read_exact(buf, 8)?.try_into().unwrap();
            Value::F64(if big { f64::from_be_bytes(b) } else { f64::from_le_bytes(b) })
        }
        DataType::Text => {
            let len_bytes: [u8; 4] = read_exact(buf, 4)?.try_into().unwrap();
            let len = if big {
                i32::from_be_bytes(len_bytes)
            } else {
                i32::from_le_bytes(len_bytes)
            };
            if len < 0 {
                return Err(TsReadError::Decode("negative text length".into()));
            }
            Value::Text(read_exact(buf, len as usize)?.to_vec())
        }
    })
}
