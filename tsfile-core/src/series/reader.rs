//! `SeriesReader` (C9): the public facade combining a sequential-file
//! reader with the unsequential merge reader behind one `IBatchReader`.
//! Modifications are already folded into chunk metadata by the time
//! either side is constructed — the sequential side at chunk-metadata
//! load time, the unsequential side in `UnseqResourceMergeReader::build`
//! (§4.9) — so this facade only resolves the cross-side tie.
//!
//! State machine (§4.9): `Init -> Ready -> Eof`, with `Ready -> Ready` on
//! each batch; any subordinate error moves to `Failed`, after which every
//! call fails fast with the same error shape (`Cancelled`) rather than
//! risking a partial result.

use crate::batch_reader::{BatchPointReader, IBatchReader};
use crate::error::{Result, TsReadError};
use crate::merge::priority::IPointReader;
use crate::page::batch::BatchData;
use crate::types::{DataType, TimeValuePair};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Init,
    Ready,
    Eof,
    Failed,
}

pub struct SeriesReader {
    data_type: DataType,
    sequential: BatchPointReader,
    unsequential: BatchPointReader,
    batch_size: usize,
    state: State,
    closed: bool,
}

impl SeriesReader {
    pub fn new(
        data_type: DataType,
        sequential: Box<dyn IBatchReader>,
        unsequential: Box<dyn IBatchReader>,
        batch_size: usize,
    ) -> Self {
        Self {
            data_type,
            sequential: BatchPointReader::new(sequential),
            unsequential: BatchPointReader::new(unsequential),
            batch_size,
            state: State::Init,
            closed: false,
        }
    }

    /// Pulls and consumes the next point from whichever side currently
    /// has the smaller timestamp; on a tie the unsequential side wins
    /// (it carries the newer version, §4.9) and the shadowed sequential
    /// point at the same timestamp is dropped alongside it.
    fn pull_one(&mut self) -> Result<Option<TimeValuePair>> {
        let seq_has = self.sequential.has_next()?;
        let unseq_has = self.unsequential.has_next()?;
        match (seq_has, unseq_has) {
            (false, false) => Ok(None),
            (true, false) => {
                let p = self.sequential.current();
                self.sequential.advance()?;
                Ok(Some(p))
            }
            (false, true) => {
                let p = self.unsequential.current();
                self.unsequential.advance()?;
                Ok(Some(p))
            }
            (true, true) => {
                let seq_p = self.sequential.current();
                let unseq_p = self.unsequential.current();
                if unseq_p.timestamp <= seq_p.timestamp {
                    self.unsequential.advance()?;
                    if unseq_p.timestamp == seq_p.timestamp {
                        self.sequential.advance()?;
                    }
                    Ok(Some(unseq_p))
                } else {
                    self.sequential.advance()?;
                    Ok(Some(seq_p))
                }
            }
        }
    }
}

impl IBatchReader for SeriesReader {
    fn has_next_batch(&mut self) -> Result<bool> {
        if self.closed || self.state == State::Failed {
            return Err(TsReadError::Cancelled);
        }
        let outcome: Result<bool> = (|| Ok(self.sequential.has_next()? || self.unsequential.has_next()?))();
        match outcome {
            Ok(has_more) => {
                self.state = if has_more { State::Ready } else { State::Eof };
                Ok(has_more)
            }
            Err(e) => {
                self.state = State::Failed;
                Err(e)
            }
        }
    }

    fn next_batch(&mut self) -> Result<BatchData> {
        if self.closed || self.state == State::Failed {
            return Err(TsReadError::Cancelled);
        }
        let mut batch = BatchData::new(self.data_type);
        let outcome: Result<()> = (|| {
            while batch.len() < self.batch_size {
                match self.pull_one()? {
                    Some(p) => {
                        batch.put_time(p.timestamp);
                        batch.put(p.value);
                    }
                    None => break,
                }
            }
            Ok(())
        })();

        match outcome {
            Ok(()) => {
                self.state = if batch.is_empty() { State::Eof } else { State::Ready };
                Ok(batch)
            }
            Err(e) => {
                self.state = State::Failed;
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.sequential.close();
        self.unsequential.close();
        self.closed = true;
    }
}
