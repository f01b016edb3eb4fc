pub mod index;
pub mod loader;
pub mod resource;
pub mod series_reader;

pub use index::index_file;
pub use loader::{ChunkLoader, FileReaderCache};
pub use resource::{FileResource, ReadOnlyMemChunk};
pub use series_reader::FileSeriesReader;
