pub mod priority;
pub mod unseq;

pub use priority::{IPointReader, PriorityMergeReader};
pub use unseq::UnseqResourceMergeReader;
