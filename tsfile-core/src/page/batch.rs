//! `BatchData`: parallel `(times[], values[])` arrays with a moving
//! cursor. Replaces the teacher's "current buffer" hidden state with an
//! explicit cursor the caller drives.

use crate::types::{DataType, Value};

pub struct BatchData {
    pub data_type: DataType,
    times: Vec<i64>,
    values: Vec<Value>,
    cursor: usize,
}

impl BatchData {
    pub const SIZE_LIMIT: usize = 10_000;

    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            times: Vec::new(),
            values: Vec::new(),
            cursor: 0,
        }
    }

    pub fn put_time(&mut self, t: i64) {
        self.times.push(t);
    }

    pub fn put(&mut self, v: Value) {
        self.values.push(v);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursor >= self.times.len()
    }

    pub fn has_next(&self) -> bool {
        self.cursor < self.times.len()
    }

    pub fn current_time(&self) -> i64 {
        self.times[self.cursor]
    }

    pub fn current_value(&self) -> &Value {
        &self.values[self.cursor]
    }

    pub fn advance(&mut self) {
        self.cursor += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_walks_parallel_arrays_in_lockstep() {
        let mut b = BatchData::new(DataType::I64);
        for (t, v) in [(1i64, 10i64), (2, 20), (3, 30)] {
            b.put_time(t);
            b.put(Value::I64(v));
        }
        let mut seen = Vec::new();
        while b.has_next() {
            seen.push((b.current_time(), b.current_value().clone()));
            b.advance();
        }
        assert_eq!(
            seen,
            vec![
                (1, Value::I64(10)),
                (2, Value::I64(20)),
                (3, Value::I64(30)),
            ]
        );
        assert!(b.is_empty());
    }

    #[test]
    fn freshly_built_empty_batch_reports_empty() {
        let b = BatchData::new(DataType::F64);
        assert!(b.is_empty());
        assert!(!b.has_next());
    }
}
