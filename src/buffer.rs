//! Growable two-column (time, temperature) result storage.
//!
//! Every curve segment of the TTT, CCT and user-cooling computations
//! accumulates into one of these without pre-knowing its final length.
//! Capacity grows ahead of writes: once a write lands at or beyond 75% of
//! the current capacity the buffer doubles (or jumps straight to twice the
//! written row when doubling is not enough), always before the write and
//! always preserving existing data. Capacity never shrinks within a run.

use crate::errors::{PhasekinError, PhasekinResult};
use ndarray::{s, Array2};

/// Column index for time values, seconds.
pub const TIME: usize = 0;
/// Column index for temperature (or fraction) values.
pub const TEMP: usize = 1;

/// A capacity-tracked (time, temperature) pair store.
#[derive(Debug, Clone)]
pub struct ResultBuffer {
    data: Array2<f64>,
    len: usize,
}

impl ResultBuffer {
    /// Allocate a zero-filled buffer with room for `initial_rows` rows.
    pub fn new(initial_rows: usize) -> Self {
        Self {
            data: Array2::zeros((initial_rows.max(1), 2)),
            len: 0,
        }
    }

    /// Number of rows written so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Physical row capacity.
    pub fn capacity(&self) -> usize {
        self.data.nrows()
    }

    /// Grow to at least `rows` of capacity. Shrinking is a contract
    /// violation and fails with `InvalidResize`.
    pub fn reserve(&mut self, rows: usize) -> PhasekinResult<()> {
        if rows < self.capacity() {
            return Err(PhasekinError::InvalidResize {
                requested: rows,
                capacity: self.capacity(),
            });
        }
        if rows > self.capacity() {
            self.reallocate(rows);
        }
        Ok(())
    }

    /// Write one element. Growth triggers *before* the write once `row`
    /// reaches 75% of capacity.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(col < 2, "result buffers have exactly two columns");
        self.grow_for(row);
        self.data[[row, col]] = value;
        self.len = self.len.max(row + 1);
    }

    /// Append a (time, temperature) pair at the current logical end.
    pub fn append(&mut self, time: f64, temp: f64) {
        let row = self.len;
        self.grow_for(row);
        self.data[[row, TIME]] = time;
        self.data[[row, TEMP]] = temp;
        self.len = row + 1;
    }

    /// The logical contents with trailing all-zero rows removed, as
    /// parallel (time, temperature) vectors of equal length.
    pub fn trim(&self) -> (Vec<f64>, Vec<f64>) {
        let mut end = self.len;
        while end > 0 {
            let row = end - 1;
            if self.data[[row, TIME]] != 0.0 || self.data[[row, TEMP]] != 0.0 {
                break;
            }
            end -= 1;
        }
        let time = self.data.slice(s![..end, TIME]).to_vec();
        let temp = self.data.slice(s![..end, TEMP]).to_vec();
        (time, temp)
    }

    fn grow_for(&mut self, row: usize) {
        let capacity = self.capacity();
        let threshold = (3 * capacity) / 4;
        if row >= threshold {
            let doubled = 2 * capacity;
            let target = if row >= doubled { 2 * (row + 1) } else { doubled };
            self.reallocate(target);
        }
    }

    fn reallocate(&mut self, rows: usize) {
        let mut grown = Array2::zeros((rows, 2));
        grown
            .slice_mut(s![..self.data.nrows(), ..])
            .assign(&self.data);
        self.data = grown;
    }
}
