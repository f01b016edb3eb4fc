//! `PriorityMergeReader` (C7): merges N point readers by ascending
//! timestamp, breaking ties in favour of the higher-priority source and
//! discarding the shadowed duplicates. Grounded on a `BinaryHeap`-driven
//! k-way merge of sorted sub-streams (the shape found in
//! `other_examples`' heap-based sorted-run merge), adapted to carry a
//! priority alongside the usual `(timestamp, reader_id)` heap key.

use crate::error::{Result, TsReadError};
use crate::types::{TimeValuePair, Value};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// The capability every sub-reader of a merge exposes: explicit
/// has_next/current/advance cursors rather than a hidden "current batch",
/// per the design note on replacing mutable shared iterators.
pub trait IPointReader: Send {
    fn has_next(&mut self) -> Result<bool>;
    fn current(&self) -> TimeValuePair;
    fn advance(&mut self) -> Result<()>;
    fn close(&mut self);
}

struct HeapEntry {
    timestamp: i64,
    priority: u64,
    reader_id: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp
            && self.priority == other.priority
            && self.reader_id == other.reader_id
    }
}
impl Eq for HeapEntry {}

/// Ordered so `BinaryHeap::pop()` returns the smallest timestamp first;
/// among equal timestamps, the higher priority first; among equal
/// priorities, the lower `reader_id` (first-registered reader) first —
/// the "implementation-defined but stable" tie-break the spec allows.
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| other.reader_id.cmp(&self.reader_id))
    }
}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub struct PriorityMergeReader {
    readers: Vec<Box<dyn IPointReader>>,
    priorities: Vec<u64>,
    heap: BinaryHeap<HeapEntry>,
    /// The winning `(timestamp, value, reader_id)` resolved by the last
    /// `has_next`, held until `advance()` actually consumes it.
    current: Option<(i64, Value, usize)>,
    closed: bool,
}

impl Default for PriorityMergeReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityMergeReader {
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
            priorities: Vec::new(),
            heap: BinaryHeap::new(),
            current: None,
            closed: false,
        }
    }

    /// Registers a new sub-reader at the given priority. Safe to call
    /// after construction — `UnseqResourceMergeReader` adds sources
    /// lazily as the merge progresses (§4.8's eager-by-chunk feed).
    pub fn add_reader(&mut self, mut reader: Box<dyn IPointReader>, priority: u64) -> Result<()> {
        let id = self.readers.len();
        if reader.has_next()? {
            let t = reader.current().timestamp;
            self.heap.push(HeapEntry {
                timestamp: t,
                priority,
                reader_id: id,
            });
        }
        self.readers.push(reader);
        self.priorities.push(priority);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty() && self.current.is_none()
    }

    /// The timestamp that would be emitted next, without consuming it.
    /// Used by `UnseqResourceMergeReader` to decide when to open the next
    /// pending chunk.
    pub fn peek_timestamp(&mut self) -> Result<Option<i64>> {
        self.resolve_current()?;
        Ok(self.current.as_ref().map(|(t, _, _)| *t))
    }

    fn resolve_current(&mut self) -> Result<()> {
        if self.closed {
            return Err(TsReadError::Cancelled);
        }
        if self.current.is_some() {
            return Ok(());
        }
        let Some(top) = self.heap.pop() else {
            return Ok(());
        };
        let ts = top.timestamp;
        let winner_value = self.readers[top.reader_id].current().value;
        self.current = Some((ts, winner_value, top.reader_id));

        // Drain and discard any other entries at the same timestamp —
        // they are shadowed by the higher-priority winner above.
        while let Some(peek) = self.heap.peek() {
            if peek.timestamp != ts {
                break;
            }
            let dup = self.heap.pop().expect("peeked above");
            let rid = dup.reader_id;
            self.readers[rid].advance()?;
            if self.readers[rid].has_next()? {
                let t = self.readers[rid].current().timestamp;
                self.heap.push(HeapEntry {
                    timestamp: t,
                    priority: self.priorities[rid],
                    reader_id: rid,
                });
            }
        }
        Ok(())
    }
}

impl IPointReader for PriorityMergeReader {
    fn has_next(&mut self) -> Result<bool> {
        self.resolve_current()?;
        Ok(self.current.is_some())
    }

    fn current(&self) -> TimeValuePair {
        let (t, v, _) = self
            .current
            .clone()
            .expect("current() called without a prior has_next() == true");
        TimeValuePair {
            timestamp: t,
            value: v,
        }
    }

    fn advance(&mut self) -> Result<()> {
        if self.closed {
            return Err(TsReadError::Cancelled);
        }
        let (_, _, rid) = self
            .current
            .take()
            .expect("advance() called without a current point");
        self.readers[rid].advance()?;
        if self.readers[rid].has_next()? {
            let t = self.readers[rid].current().timestamp;
            self.heap.push(HeapEntry {
                timestamp: t,
                priority: self.priorities[rid],
                reader_id: rid,
            });
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        for r in &mut self.readers {
            r.close();
        }
        self.closed = true;
    }
}
