//! Field bounds and the transition normalizer.
use crate::{error::GenrepError, BoxSpace, FeatureBatch, TransitionLayout};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Lower bound of the reward range used when none is configured.
pub const DEFAULT_REWARD_LOW: f32 = -20.0;

/// Upper bound of the reward range used when none is configured.
pub const DEFAULT_REWARD_HIGH: f32 = 0.0;

/// Per-field `(low, high)` bounds of a transition.
///
/// The state bounds are shared by `state` and `next_state`; the done flag is
/// always bounded by `(0, 1)`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Bounds {
    state_low: Vec<f32>,
    state_high: Vec<f32>,
    action_low: Vec<f32>,
    action_high: Vec<f32>,
    reward_low: f32,
    reward_high: f32,
}

impl Bounds {
    /// Constructs bounds, rejecting any pair with `high <= low`.
    pub fn new(
        state_low: Vec<f32>,
        state_high: Vec<f32>,
        action_low: Vec<f32>,
        action_high: Vec<f32>,
        reward_low: f32,
        reward_high: f32,
    ) -> Result<Self> {
        check_pairs("state", &state_low, &state_high)?;
        check_pairs("action", &action_low, &action_high)?;
        check_pairs("reward", &[reward_low], &[reward_high])?;

        Ok(Self {
            state_low,
            state_high,
            action_low,
            action_high,
            reward_low,
            reward_high,
        })
    }

    /// Bounds taken from the observation and action spaces of an environment,
    /// with the default reward range `[-20, 0]`.
    pub fn from_spaces(obs_space: &BoxSpace, act_space: &BoxSpace) -> Result<Self> {
        Self::new(
            obs_space.low.clone(),
            obs_space.high.clone(),
            act_space.low.clone(),
            act_space.high.clone(),
            DEFAULT_REWARD_LOW,
            DEFAULT_REWARD_HIGH,
        )
    }

    /// Layout of transitions with these bounds.
    pub fn layout(&self) -> TransitionLayout {
        TransitionLayout::new(self.state_low.len(), self.action_low.len())
    }

    /// Lower and upper bound of every column of a feature row.
    pub fn columns(&self) -> (Vec<f32>, Vec<f32>) {
        let mut low = Vec::with_capacity(self.layout().width());
        let mut high = Vec::with_capacity(self.layout().width());
        low.extend_from_slice(&self.state_low);
        low.extend_from_slice(&self.action_low);
        low.extend_from_slice(&self.state_low);
        low.push(self.reward_low);
        low.push(0.0);
        high.extend_from_slice(&self.state_high);
        high.extend_from_slice(&self.action_high);
        high.extend_from_slice(&self.state_high);
        high.push(self.reward_high);
        high.push(1.0);
        (low, high)
    }
}

fn check_pairs(field: &str, low: &[f32], high: &[f32]) -> Result<()> {
    if low.len() != high.len() {
        return Err(GenrepError::DimensionMismatch(field.to_string(), low.len(), high.len()).into());
    }
    if low.is_empty() {
        return Err(GenrepError::InvalidConfig(format!("no bounds given for {}", field)).into());
    }
    for (index, (&low, &high)) in low.iter().zip(high.iter()).enumerate() {
        // Also rejects NaN.
        if !(high > low) || !(high - low).is_finite() {
            return Err(GenrepError::InvalidBounds {
                field: field.to_string(),
                index,
                low,
                high,
            }
            .into());
        }
    }
    Ok(())
}

/// Target range of normalized values.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum NormRange {
    /// `[0, 1]`, matching Bernoulli visible units.
    Unit,

    /// `[-1, 1]`, matching a `tanh` output layer.
    Symmetric,
}

/// Maps feature rows to and from a bounded range, column by column.
///
/// Values outside `[low, high]` are not clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalizer {
    low: Vec<f32>,
    span: Vec<f32>,
    range: NormRange,
    done_col: usize,
}

impl Normalizer {
    /// Constructs a normalizer for the given bounds and target range.
    pub fn new(bounds: &Bounds, range: NormRange) -> Self {
        let (low, high) = bounds.columns();
        let span = low.iter().zip(high.iter()).map(|(l, h)| h - l).collect();
        Self {
            low,
            span,
            range,
            done_col: bounds.layout().done_col(),
        }
    }

    /// Target range.
    pub fn range(&self) -> NormRange {
        self.range
    }

    /// Width of the rows this normalizer accepts.
    pub fn width(&self) -> usize {
        self.low.len()
    }

    fn check_width(&self, batch: &FeatureBatch) -> Result<()> {
        if batch.width() != self.width() {
            return Err(GenrepError::FeatureWidthMismatch {
                expected: self.width(),
                actual: batch.width(),
            }
            .into());
        }
        Ok(())
    }

    /// `y = (x - low) / (high - low)`, then `2y - 1` for [`NormRange::Symmetric`].
    pub fn normalize(&self, batch: &FeatureBatch) -> Result<FeatureBatch> {
        self.check_width(batch)?;
        let range = self.range;
        Ok(batch.map_columns(|j, x| {
            let y = (x - self.low[j]) / self.span[j];
            match range {
                NormRange::Unit => y,
                NormRange::Symmetric => 2.0 * y - 1.0,
            }
        }))
    }

    /// Inverse of [`Normalizer::normalize`]; the done flag is rounded to `0` or `1`.
    pub fn descale(&self, batch: &FeatureBatch) -> Result<FeatureBatch> {
        self.check_width(batch)?;
        let range = self.range;
        let done_col = self.done_col;
        Ok(batch.map_columns(|j, y| {
            let y = match range {
                NormRange::Unit => y,
                NormRange::Symmetric => (y + 1.0) / 2.0,
            };
            let x = y * self.span[j] + self.low[j];
            if j == done_col {
                x.round().max(0.0).min(1.0)
            } else {
                x
            }
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Transition;

    fn pendulum_bounds() -> Bounds {
        Bounds::new(
            vec![-1.0, -1.0, -8.0],
            vec![1.0, 1.0, 8.0],
            vec![-2.0],
            vec![2.0],
            -20.0,
            0.0,
        )
        .unwrap()
    }

    fn batch() -> FeatureBatch {
        let layout = TransitionLayout::default();
        let trs = vec![
            Transition {
                state: vec![0.5, -0.3, 7.0],
                action: vec![-1.5],
                next_state: vec![0.4, -0.2, 6.5],
                reward: -3.25,
                done: 0.0,
            },
            Transition {
                state: vec![-1.0, 1.0, -8.0],
                action: vec![2.0],
                next_state: vec![1.0, -1.0, 8.0],
                reward: -20.0,
                done: 1.0,
            },
        ];
        FeatureBatch::from_transitions(&trs, &layout).unwrap()
    }

    fn assert_close(a: &FeatureBatch, b: &FeatureBatch) {
        for (x, y) in a.as_slice().iter().zip(b.as_slice().iter()) {
            assert!((x - y).abs() < 1e-5, "{} != {}", x, y);
        }
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(Bounds::new(vec![1.0], vec![1.0], vec![-1.0], vec![1.0], -20.0, 0.0).is_err());
        assert!(Bounds::new(vec![0.0], vec![1.0], vec![1.0], vec![-1.0], -20.0, 0.0).is_err());
        assert!(Bounds::new(vec![0.0], vec![1.0], vec![-1.0], vec![1.0], 0.0, -20.0).is_err());
        assert!(Bounds::new(vec![0.0, 0.0], vec![1.0], vec![-1.0], vec![1.0], -20.0, 0.0).is_err());
        assert!(Bounds::new(vec![f32::NAN], vec![1.0], vec![-1.0], vec![1.0], -20.0, 0.0).is_err());
    }

    #[test]
    fn test_round_trip_unit() -> Result<()> {
        let norm = Normalizer::new(&pendulum_bounds(), NormRange::Unit);
        let x = batch();
        let y = norm.normalize(&x)?;
        assert!(y.as_slice().iter().all(|v| *v >= 0.0 && *v <= 1.0));
        assert_close(&norm.descale(&y)?, &x);
        Ok(())
    }

    #[test]
    fn test_round_trip_symmetric() -> Result<()> {
        let norm = Normalizer::new(&pendulum_bounds(), NormRange::Symmetric);
        let x = batch();
        let y = norm.normalize(&x)?;
        assert!(y.as_slice().iter().all(|v| *v >= -1.0 && *v <= 1.0));
        // The second transition sits on the bounds
        assert_eq!(y.row(1)[0], -1.0);
        assert_eq!(y.row(1)[4], 1.0);
        assert_close(&norm.descale(&y)?, &x);
        Ok(())
    }

    #[test]
    fn test_pure() -> Result<()> {
        let norm = Normalizer::new(&pendulum_bounds(), NormRange::Unit);
        let x = batch();
        let x_copy = x.clone();
        let _ = norm.normalize(&x)?;
        assert_eq!(x, x_copy);
        Ok(())
    }

    #[test]
    fn test_descale_rounds_done() -> Result<()> {
        let norm = Normalizer::new(&pendulum_bounds(), NormRange::Symmetric);
        let mut y = FeatureBatch::zeros(3, 9);
        let mut row = vec![0f32; 9];
        for (i, d) in [-0.9f32, 0.2, 3.0].iter().enumerate() {
            row[8] = *d;
            y.set_row(i, &row)?;
        }
        assert_eq!(norm.descale(&y)?.column(8), vec![0.0, 1.0, 1.0]);
        Ok(())
    }

    #[test]
    fn test_out_of_range_not_clamped() -> Result<()> {
        let norm = Normalizer::new(&pendulum_bounds(), NormRange::Unit);
        let mut x = FeatureBatch::zeros(1, 9);
        x.set_row(0, &[3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])?;
        assert_eq!(norm.normalize(&x)?.row(0)[0], 2.0);
        Ok(())
    }

    #[test]
    fn test_first_column_at_upper_bound() -> Result<()> {
        let layout = TransitionLayout::new(3, 1);
        let trs: Vec<Transition> = (0..500)
            .map(|i| Transition {
                state: vec![1.0, 0.0, 0.0],
                action: vec![(i % 5) as f32 - 2.0],
                next_state: vec![1.0, 0.0, 0.0],
                reward: -1.0,
                done: 0.0,
            })
            .collect();
        let x = FeatureBatch::from_transitions(&trs, &layout)?;

        for range in [NormRange::Unit, NormRange::Symmetric].iter() {
            let y = Normalizer::new(&pendulum_bounds(), *range).normalize(&x)?;
            assert_eq!(y.len(), 500);
            assert!(y.column(0).iter().all(|v| *v == 1.0));
        }
        Ok(())
    }

    #[test]
    fn test_width_mismatch() {
        let norm = Normalizer::new(&pendulum_bounds(), NormRange::Unit);
        assert!(norm.normalize(&FeatureBatch::zeros(2, 8)).is_err());
    }
}
