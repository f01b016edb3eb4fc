//! Fixed-width native encoding: each value is written back-to-back in its
//! natural byte width (length-prefixed for `TEXT`). No state beyond the
//! current endianness.

use super::{decode_fixed, Decoder};
use crate::error::Result;
use crate::types::{DataType, Endianness, Value};

pub struct PlainDecoder {
    endianness: Endianness,
}

impl PlainDecoder {
    pub fn new() -> Self {
        Self {
            endianness: Endianness::Little,
        }
    }
}

impl Default for PlainDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for PlainDecoder {
    fn reset(&mut self) {}

    fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    fn has_next(&self, buf: &[u8]) -> bool {
        !buf.is_empty()
    }

    fn next(&mut self, buf: &mut &[u8], data_type: DataType) -> Result<Value> {
        decode_fixed(data_type, self.endianness, buf)
    }
}
