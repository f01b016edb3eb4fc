use thiserror::Error;

/// Error taxonomy for the read path. Variants are kinds, not call sites —
/// callers match on them to decide retry/abort policy.
#[derive(Error, Debug)]
pub enum TsReadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt chunk: {0}")]
    CorruptChunk(String),

    #[error("unknown data type code: {0}")]
    UnknownType(u8),

    #[error("cannot merge statistics of different types: {0} vs {1}")]
    StatisticsTypeMismatch(&'static str, &'static str),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("out-of-order point lookup: requested ts {requested} < previous ts {previous}")]
    OutOfOrderLookup { previous: i64, requested: i64 },

    #[error("reader used after close()")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, TsReadError>;
