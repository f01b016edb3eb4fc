#![forbid(unsafe_code)]

//! Read path of a columnar time-series file engine: given one or more
//! on-disk files plus in-memory buffers, resolve a query for a single
//! measurement series into an ordered stream of timestamped values,
//! honouring deletions, per-chunk pruning by statistics, and
//! merge-by-priority across overlapping sources.
//!
//! The SQL front end, grouping/aggregation, network session layer,
//! config loading, the write path, and the schema catalogue are external
//! collaborators this crate only defines narrow seams for (§1): see
//! [`catalogue`] and [`modification`] for those seams.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod config;
pub mod types;
pub mod stats;
pub mod filter;
pub mod container;
pub mod codec;
pub mod decode;
pub mod page;
pub mod chunk;
pub mod chunk_meta;
pub mod batch_reader;
pub mod file;
pub mod merge;
pub mod modification;
pub mod catalogue;
pub mod series;

pub use crate::chunk_meta::ChunkMetaData;
pub use crate::error::Result;
pub use crate::series::SeriesReader;
pub use crate::stats::Statistics;
pub use crate::types::{DataType, TimeValuePair, Value};

pub mod prelude {
    pub use crate::batch_reader::IBatchReader;
    pub use crate::catalogue::{MetadataCatalogue, ResourceFilter};
    pub use crate::config::ReaderConfig;
    pub use crate::filter::Filter;
    pub use crate::modification::ModificationStore;
    pub use crate::types::{DataType, TimeValuePair, Value};
    pub use crate::Result;
    pub use crate::SeriesReader;
}
