//! Ring buffer for rolling statistics
//!
//! Stores fixed number of elements for rolling window calculations.
//! Oldest sample is evicted first once the buffer is full.
//! Zero allocation after initialization.

use std::fmt::Debug;

/// Ring buffer with fixed capacity
#[derive(Debug, Clone)]
pub struct RingBuffer<T, const N: usize> {
    buffer: [T; N],
    head: usize,
    count: usize,
}

impl<T: Copy + Default + Debug, const N: usize> RingBuffer<T, N> {
    /// Create new ring buffer
    pub fn new() -> Self {
        Self {
            buffer: [T::default(); N],
            head: 0,
            count: 0,
        }
    }

    /// Add value, overwriting the oldest one when full
    #[inline]
    pub fn push(&mut self, value: T) {
        self.buffer[self.head] = value;
        self.head = (self.head + 1) % N;
        if self.count < N {
            self.count += 1;
        }
    }

    /// Iterate stored values oldest first
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let start = (self.head + N - self.count) % N;
        (0..self.count).map(move |i| &self.buffer[(start + i) % N])
    }

    /// Get stored count
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == N
    }
}

impl<T: Copy + Default + Debug, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

// Statistics over millisecond samples
impl<const N: usize> RingBuffer<f64, N> {
    /// Arithmetic mean, `None` when empty
    #[inline]
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.iter().sum::<f64>() / self.count as f64)
    }

    /// Population standard deviation, `None` when empty
    pub fn std_dev(&self) -> Option<f64> {
        let mean = self.mean()?;
        let variance = self
            .iter()
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / self.count as f64;
        Some(variance.sqrt())
    }
}
