//! Filters prune blocks by statistics before decoding, and accept/reject
//! individual points once decoded.
//!
//! A time filter `t > k` eliminates any block whose `max_time <= k`; a
//! value filter over `[lo, hi]` eliminates any block with
//! `stats.max < lo || stats.min > hi`. Pruning must be sound: rejecting a
//! block on its statistics is only safe when no point in the block could
//! possibly satisfy the filter.

use crate::stats::Statistics;
use crate::types::Value;

pub trait Filter: Send + Sync {
    /// Returns `false` only when it is certain no point in
    /// `[start_time, end_time]` with the given statistics can satisfy the
    /// filter. Returning `true` when unsure is always safe; returning
    /// `false` when unsure is a correctness bug.
    fn accepts_stats(&self, stats: &Statistics, start_time: i64, end_time: i64) -> bool;

    fn accepts_point(&self, time: i64, value: &Value) -> bool;
}

/// `time_column OP bound`.
#[derive(Clone, Copy, Debug)]
pub enum TimeOp {
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Clone, Copy, Debug)]
pub struct TimeFilter {
    pub op: TimeOp,
    pub bound: i64,
}

impl TimeFilter {
    pub fn new(op: TimeOp, bound: i64) -> Self {
        Self { op, bound }
    }

    fn accepts_time(&self, t: i64) -> bool {
        match self.op {
            TimeOp::Gt => t > self.bound,
            TimeOp::Ge => t >= self.bound,
            TimeOp::Lt => t < self.bound,
            TimeOp::Le => t <= self.bound,
        }
    }
}

impl Filter for TimeFilter {
    fn accepts_stats(&self, _stats: &Statistics, start_time: i64, end_time: i64) -> bool {
        match self.op {
            // t > bound: nothing qualifies once the block's max_time <= bound.
            TimeOp::Gt => end_time > self.bound,
            TimeOp::Ge => end_time >= self.bound,
            // t < bound: nothing qualifies once the block's min_time >= bound.
            TimeOp::Lt => start_time < self.bound,
            TimeOp::Le => start_time <= self.bound,
        }
    }

    fn accepts_point(&self, time: i64, _value: &Value) -> bool {
        self.accepts_time(time)
    }
}

/// `value_column` within `[lo, hi]` inclusive, for numeric types.
#[derive(Clone, Debug)]
pub struct ValueFilter {
    pub lo: f64,
    pub hi: f64,
}

impl ValueFilter {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }
}

impl Filter for ValueFilter {
    fn accepts_stats(&self, stats: &Statistics, _start_time: i64, _end_time: i64) -> bool {
        let (Some(min), Some(max)) = (stats.min(), stats.max()) else {
            return true;
        };
        let (Some(min), Some(max)) = (min.as_f64(), max.as_f64()) else {
            // Non-numeric column (e.g. TEXT): this filter never prunes it.
            return true;
        };
        !(max < self.lo || min > self.hi)
    }

    fn accepts_point(&self, _time: i64, value: &Value) -> bool {
        match value.as_f64() {
            Some(v) => v >= self.lo && v <= self.hi,
            None => true,
        }
    }
}

/// Conjunction of two filters. `accepts_stats` is conservative: the block
/// must pass both sides to be pruned-in.
pub struct And {
    pub left: Box<dyn Filter>,
    pub right: Box<dyn Filter>,
}

impl And {
    pub fn new(left: Box<dyn Filter>, right: Box<dyn Filter>) -> Self {
        Self { left, right }
    }
}

impl Filter for And {
    fn accepts_stats(&self, stats: &Statistics, start_time: i64, end_time: i64) -> bool {
        self.left.accepts_stats(stats, start_time, end_time)
            && self.right.accepts_stats(stats, start_time, end_time)
    }

    fn accepts_point(&self, time: i64, value: &Value) -> bool {
        self.left.accepts_point(time, value) && self.right.accepts_point(time, value)
    }
}
