//! `ChunkHeader`: bit-exact layout of the header that precedes a chunk's
//! pages on disk.
//!
//! Wire layout: marker byte `0x01`, length-prefixed UTF-8
//! `measurement_uid`, `i32 body_size`, `i32 num_pages`, `u8 compression`,
//! `u8 encoding`, `u8 data_type`, `u8 endianness`.

use crate::error::{Result, TsReadError};
use crate::types::{DataType, Endianness};
use std::io::{Read, Write};

pub const CHUNK_MARKER: u8 = 0x01;

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkHeader {
    pub measurement_uid: String,
    pub body_size: i32,
    pub num_pages: i32,
    pub compression: u8,
    pub encoding: u8,
    pub data_type: DataType,
    pub endianness: Endianness,
}

impl ChunkHeader {
    pub fn write_to(&self, mut w: impl Write) -> Result<()> {
        w.write_all(&[CHUNK_MARKER])?;
        let uid = self.measurement_uid.as_bytes();
        w.write_all(&(uid.len() as i32).to_le_bytes())?;
        w.write_all(uid)?;
        w.write_all(&self.body_size.to_le_bytes())?;
        w.write_all(&self.num_pages.to_le_bytes())?;
        w.write_all(&[self.compression, self.encoding, self.data_type.as_u8(), self.endianness as u8])?;
        Ok(())
    }

    pub fn read_from(mut r: impl Read) -> Result<Self> {
        let mut marker = [0u8; 1];
        r.read_exact(&mut marker)?;
        if marker[0] != CHUNK_MARKER {
            return Err(TsReadError::CorruptChunk(format!(
                "unexpected chunk marker byte {}",
                marker[0]
            )));
        }

        let mut len_buf = [0u8; 4];
        r.read_exact(&mut len_buf)?;
        let uid_len = i32::from_le_bytes(len_buf);
        if uid_len < 0 {
            return Err(TsReadError::CorruptChunk(
                "negative measurement_uid length".into(),
            ));
        }
        let mut uid_bytes = vec![0u8; uid_len as usize];
        r.read_exact(&mut uid_bytes)?;
        let measurement_uid = String::from_utf8(uid_bytes)
            .map_err(|e| TsReadError::CorruptChunk(format!("measurement_uid not utf-8: {e}")))?;

        let mut i32_buf = [0u8; 4];
        r.read_exact(&mut i32_buf)?;
        let body_size = i32::from_le_bytes(i32_buf);
        r.read_exact(&mut i32_buf)?;
        let num_pages = i32::from_le_bytes(i32_buf);

        let mut tail = [0u8; 4];
        r.read_exact(&mut tail)?;
        let [compression, encoding, data_type_code, endianness_code] = tail;

        Ok(Self {
            measurement_uid,
            body_size,
            num_pages,
            compression,
            encoding,
            data_type: DataType::from_u8(data_type_code)?,
            endianness: Endianness::from_u8(endianness_code)?,
        })
    }
}
