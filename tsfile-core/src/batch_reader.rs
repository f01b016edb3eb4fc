//! The consumer-facing `IBatchReader` capability (§6) and the adapter that
//! turns any batch reader into the point-at-a-time `IPointReader`
//! capability the merge layer (C7/C8) needs. Keeping the adaptation in one
//! place means `ChunkReader`, `FileSeriesReader` and `SeriesReader` only
//! have to implement batches once each.

use crate::error::Result;
use crate::merge::priority::IPointReader;
use crate::page::batch::BatchData;
use crate::types::TimeValuePair;

pub trait IBatchReader: Send {
    fn has_next_batch(&mut self) -> Result<bool>;
    fn next_batch(&mut self) -> Result<BatchData>;
    fn close(&mut self);
}

/// Walks a `BatchData` cursor at a time, pulling a fresh (possibly empty)
/// batch from the wrapped reader whenever the current one runs dry.
/// Empty batches are skipped rather than surfaced, matching C4's "treat
/// empty batches as skip, try next page".
pub struct BatchPointReader {
    reader: Box<dyn IBatchReader>,
    batch: Option<BatchData>,
}

impl BatchPointReader {
    pub fn new(reader: Box<dyn IBatchReader>) -> Self {
        Self { reader, batch: None }
    }

    fn ensure_batch(&mut self) -> Result<bool> {
        loop {
            if let Some(b) = &self.batch {
                if b.has_next() {
                    return Ok(true);
                }
            }
            if !self.reader.has_next_batch()? {
                self.batch = None;
                return Ok(false);
            }
            let b = self.reader.next_batch()?;
            if b.has_next() {
                self.batch = Some(b);
                return Ok(true);
            }
            // empty batch after filtering: loop around for the next one.
        }
    }
}

impl IPointReader for BatchPointReader {
    fn has_next(&mut self) -> Result<bool> {
        self.ensure_batch()
    }

    fn current(&self) -> TimeValuePair {
        let b = self
            .batch
            .as_ref()
            .expect("current() called without a prior has_next() == true");
        TimeValuePair {
            timestamp: b.current_time(),
            value: b.current_value().clone(),
        }
    }

    fn advance(&mut self) -> Result<()> {
        if let Some(b) = &mut self.batch {
            b.advance();
        }
        Ok(())
    }

    fn close(&mut self) {
        self.reader.close();
    }
}
