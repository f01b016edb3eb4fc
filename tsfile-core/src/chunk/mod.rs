//! A materialised chunk: the header plus its raw page bytes, as
//! `ChunkLoader::load` hands back to a `ChunkReader` (§4.6).

pub mod reader;

use crate::container::chunk_header::ChunkHeader;

pub use reader::ChunkReader;

/// `Chunk { header, body_buffer, deleted_at, endianness }` from §4.6.
/// `endianness` lives on `header` already, so it isn't duplicated here.
pub struct Chunk {
    pub header: ChunkHeader,
    pub body: Vec<u8>,
    pub deleted_at: i64,
}
