//! Accumulation buffer.
use crate::{error::GenrepError, FeatureBatch};
use anyhow::Result;

/// Fixed-capacity collection of the raw transitions observed since the last
/// generative model training cycle.
///
/// Unlike a replay buffer it does not wrap around: once full, it is drained
/// with [`AccumulationBuffer::take`], which hands out all rows and starts over
/// with a fresh zero-filled buffer.
pub struct AccumulationBuffer {
    rows: FeatureBatch,
    capacity: usize,
    index: usize,
    n_resets: usize,
}

impl AccumulationBuffer {
    /// Constructs an empty buffer.
    pub fn new(capacity: usize, width: usize) -> Self {
        Self {
            rows: FeatureBatch::zeros(capacity, width),
            capacity,
            index: 0,
            n_resets: 0,
        }
    }

    /// Writes a row at the accumulation index and advances the index.
    pub fn push(&mut self, row: &[f32]) -> Result<()> {
        if self.is_full() {
            return Err(GenrepError::InvalidConfig(format!(
                "accumulation buffer is full ({} rows)",
                self.capacity
            ))
            .into());
        }
        self.rows.set_row(self.index, row)?;
        self.index += 1;
        Ok(())
    }

    /// The number of rows written since the last reset.
    pub fn len(&self) -> usize {
        self.index
    }

    /// Returns `true` if no row has been written since the last reset.
    pub fn is_empty(&self) -> bool {
        self.index == 0
    }

    /// Capacity in rows.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if the accumulation index reached the capacity.
    pub fn is_full(&self) -> bool {
        self.index >= self.capacity
    }

    /// The number of times the buffer has been drained.
    pub fn n_resets(&self) -> usize {
        self.n_resets
    }

    /// Hands out all rows and resets the buffer to zeros.
    pub fn take(&mut self) -> FeatureBatch {
        let width = self.rows.width();
        let rows = std::mem::replace(&mut self.rows, FeatureBatch::zeros(self.capacity, width));
        self.index = 0;
        self.n_resets += 1;
        rows
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fill_and_take() -> Result<()> {
        let mut buffer = AccumulationBuffer::new(3, 2);
        for i in 0..3 {
            assert!(!buffer.is_full());
            buffer.push(&[i as f32, 1.0])?;
        }
        assert!(buffer.is_full());
        assert!(buffer.push(&[0.0, 0.0]).is_err());

        let rows = buffer.take();
        assert_eq!(rows.as_slice(), &[0.0, 1.0, 1.0, 1.0, 2.0, 1.0]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.n_resets(), 1);

        // The new buffer starts zero-filled
        buffer.push(&[5.0, 5.0])?;
        let rows = buffer.take();
        assert_eq!(rows.as_slice(), &[5.0, 5.0, 0.0, 0.0, 0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_row_width() {
        let mut buffer = AccumulationBuffer::new(3, 2);
        assert!(buffer.push(&[1.0]).is_err());
        assert!(buffer.is_empty());
    }
}
