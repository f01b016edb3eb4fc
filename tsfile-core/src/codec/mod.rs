//! Page-body compression plug-in point ("Uncompressor" in the external
//! interface list). Chunks name their codec by a one-byte id in
//! `ChunkHeader::compression`; decoding looks the id up here.

use crate::error::{Result, TsReadError};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodecId {
    Store = 0,
    Zstd = 1,
}

impl CodecId {
    pub fn from_u8(b: u8) -> Result<Self> {
        match b {
            0 => Ok(CodecId::Store),
            1 => Ok(CodecId::Zstd),
            other => Err(TsReadError::CorruptChunk(format!(
                "unknown compression codec id {other}"
            ))),
        }
    }
}

pub trait Compressor: Send + Sync {
    fn id(&self) -> CodecId;
    fn compress(&self, src: &mut dyn Read, dst: &mut dyn Write, level: i32) -> Result<u64>;
    fn decompress(&self, src: &mut dyn Read, dst: &mut dyn Write) -> Result<u64>;
}

pub mod store;
pub mod zstdc;

pub fn get_compressor(codec: u8) -> Result<&'static dyn Compressor> {
    match CodecId::from_u8(codec)? {
        CodecId::Store => Ok(&store::Store),
        CodecId::Zstd => Ok(&zstdc::ZstdCompressor),
    }
}
