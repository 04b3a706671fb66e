//! Fixed-capacity sample ring buffer.

use crate::distribution::{self, MinMax};
use crate::error::{StatsError, StatsResult};

/// Fixed-capacity ring buffer of cycle-time samples (nanoseconds, as `f64`).
///
/// The write cursor wraps modulo the capacity. [`push`](Self::push) reports
/// `true` exactly when the cursor wraps back to zero, i.e. once per full
/// traversal of the buffer, which is when a fresh window of samples is
/// available for drift correction.
///
/// # RT-Safety
///
/// - Storage is allocated once in [`with_capacity`](Self::with_capacity)
/// - `push` is O(1) and allocation-free
/// - Statistics are O(n) over the written samples and allocation-free
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    /// Sample storage
    samples: Box<[f64]>,

    /// Next write position, always in `[0, capacity)`
    cursor: usize,

    /// Total number of pushes since creation or the last reset
    pushes: u64,
}

impl SampleBuffer {
    /// Create a buffer holding `capacity` samples.
    ///
    /// A zero capacity is accepted here; pushing into it is an error.
    ///
    /// # RT-Safety
    ///
    /// This constructor allocates. Call during initialization only.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity].into_boxed_slice(),
            cursor: 0,
            pushes: 0,
        }
    }

    /// Write `value` at the cursor and advance it.
    ///
    /// Returns `true` when this push completed a full traversal of the buffer
    /// (the N-th, 2N-th, ... push for capacity N).
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::ZeroCapacity`] if the buffer has no storage.
    #[inline]
    pub fn push(&mut self, value: f64) -> StatsResult<bool> {
        let capacity = self.samples.len();
        let slot = self
            .samples
            .get_mut(self.cursor)
            .ok_or(StatsError::ZeroCapacity)?;
        *slot = value;

        self.cursor = (self.cursor + 1) % capacity;
        self.pushes = self.pushes.saturating_add(1);
        Ok(self.cursor == 0)
    }

    /// Buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Number of valid samples, `min(pushes, capacity)`.
    #[inline]
    pub fn len(&self) -> usize {
        usize::try_from(self.pushes).map_or(self.capacity(), |p| p.min(self.capacity()))
    }

    /// Whether no sample has been written yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pushes == 0 || self.samples.is_empty()
    }

    /// Whether every slot holds a written sample.
    #[inline]
    pub fn is_full(&self) -> bool {
        !self.samples.is_empty() && self.len() == self.capacity()
    }

    /// Current write position.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Total number of pushes since creation or the last reset.
    #[inline]
    pub fn total_pushes(&self) -> u64 {
        self.pushes
    }

    /// Number of completed full traversals.
    #[inline]
    pub fn traversals(&self) -> u64 {
        match u64::try_from(self.capacity()) {
            Ok(0) | Err(_) => 0,
            Ok(capacity) => self.pushes / capacity,
        }
    }

    /// The written samples.
    ///
    /// Before the first wrap this is the prefix written so far; afterwards it
    /// is the whole buffer (in storage order, not chronological order).
    pub fn samples(&self) -> &[f64] {
        self.samples.get(..self.len()).unwrap_or(&[])
    }

    /// Mean of the written samples.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::EmptyDistribution`] if nothing has been written.
    pub fn average(&self) -> StatsResult<f64> {
        distribution::average(self.samples())
    }

    /// Population variance of the written samples.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::EmptyDistribution`] if nothing has been written.
    pub fn variance(&self) -> StatsResult<f64> {
        distribution::variance(self.samples())
    }

    /// Population standard deviation of the written samples.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::EmptyDistribution`] if nothing has been written.
    pub fn standard_deviation(&self) -> StatsResult<f64> {
        distribution::standard_deviation(self.samples())
    }

    /// Smallest and largest written sample.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::EmptyDistribution`] if nothing has been written.
    pub fn minmax(&self) -> StatsResult<MinMax> {
        distribution::minmax(self.samples())
    }

    /// Forget all samples, keeping the storage.
    pub fn reset(&mut self) {
        self.samples.fill(0.0);
        self.cursor = 0;
        self.pushes = 0;
    }
}
