//! Run-length encoding for booleans/integers: repeated
//! `(i32 run_length, value bytes)` records, each expanding to
//! `run_length` copies of the same value.

use super::{decode_fixed, read_exact, Decoder};
use crate::error::Result;
use crate::types::{DataType, Endianness, Value};

pub struct RleDecoder {
    endianness: Endianness,
    remaining: u32,
    current: Option<Value>,
}

impl RleDecoder {
    pub fn new() -> Self {
        Self {
            endianness: Endianness::Little,
            remaining: 0,
            current: None,
        }
    }
}

impl Default for RleDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for RleDecoder {
    fn reset(&mut self) {
        self.remaining = 0;
        self.current = None;
    }

    fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    fn has_next(&self, buf: &[u8]) -> bool {
        self.remaining > 0 || !buf.is_empty()
    }

    fn next(&mut self, buf: &mut &[u8], data_type: DataType) -> Result<Value> {
        if self.remaining == 0 {
            let big = self.endianness == Endianness::Big;
            let len_bytes: [u8; 4] = read_exact(buf, 4)?.try_into().unwrap();
            let run_length = if big {
                u32::from_be_bytes(len_bytes)
            } else {
                u32::from_le_bytes(len_bytes)
            };
            let value = decode_fixed(data_type, self.endianness, buf)?;
            self.current = Some(value);
            self.remaining = run_length;
        }
        self.remaining -= 1;
        Ok(self.current.clone().expect("run value set above"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_a_run_into_repeated_values() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(&7i32.to_le_bytes());
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&9i32.to_le_bytes());

        let mut slice = &buf[..];
        let mut dec = RleDecoder::new();
        let mut out = Vec::new();
        while dec.has_next(slice) {
            out.push(dec.next(&mut slice, DataType::I32).unwrap());
        }
        assert_eq!(
            out,
            vec![
                Value::I32(7),
                Value::I32(7),
                Value::I32(7),
                Value::I32(9),
                Value::I32(9),
            ]
        );
    }
}
