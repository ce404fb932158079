//! Box-shaped observation and action spaces.
use crate::error::GenrepError;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A box in `R^n`, given by elementwise lower and upper bounds.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BoxSpace {
    /// Lower bounds.
    pub low: Vec<f32>,

    /// Upper bounds.
    pub high: Vec<f32>,
}

impl BoxSpace {
    /// Constructs a box space.
    pub fn new(low: Vec<f32>, high: Vec<f32>) -> Result<Self> {
        if low.len() != high.len() {
            return Err(GenrepError::DimensionMismatch("box space".to_string(), low.len(), high.len()).into());
        }
        Ok(Self { low, high })
    }

    /// Dimension of the space.
    pub fn dim(&self) -> usize {
        self.low.len()
    }

    /// Uniformly samples a point in the box.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Vec<f32> {
        self.low
            .iter()
            .zip(self.high.iter())
            .map(|(lo, hi)| lo + (hi - lo) * rng.f32())
            .collect()
    }

    /// Clips a point into the box.
    pub fn clip(&self, x: &[f32]) -> Vec<f32> {
        x.iter()
            .zip(self.low.iter().zip(self.high.iter()))
            .map(|(x, (lo, hi))| x.max(*lo).min(*hi))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sample_in_box() -> Result<()> {
        let space = BoxSpace::new(vec![-2.0, 0.0], vec![2.0, 1.0])?;
        let mut rng = fastrand::Rng::with_seed(42);
        for _ in 0..100 {
            let x = space.sample(&mut rng);
            assert_eq!(x.len(), 2);
            assert!(x[0] >= -2.0 && x[0] <= 2.0);
            assert!(x[1] >= 0.0 && x[1] <= 1.0);
        }
        assert_eq!(space.clip(&[5.0, -1.0]), vec![2.0, 0.0]);
        Ok(())
    }
}
