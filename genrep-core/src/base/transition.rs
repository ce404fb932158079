//! Transitions and their fixed-width feature representation.
//!
//! A transition `(o_t, a_t, o_t+1, r_t, d_t)` is laid out as a single feature
//! row in the order `state | action | next_state | reward | done`. Every
//! component that reads or writes feature rows (normalizer, generative models,
//! the trainer) relies on this order.
use crate::error::GenrepError;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Field widths of a feature row.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct TransitionLayout {
    /// Dimension of the observation.
    pub state_dim: usize,

    /// Dimension of the action.
    pub action_dim: usize,
}

impl Default for TransitionLayout {
    fn default() -> Self {
        Self {
            state_dim: 3,
            action_dim: 1,
        }
    }
}

impl TransitionLayout {
    /// Constructs a layout.
    pub fn new(state_dim: usize, action_dim: usize) -> Self {
        Self {
            state_dim,
            action_dim,
        }
    }

    /// Width of a feature row.
    pub fn width(&self) -> usize {
        2 * self.state_dim + self.action_dim + 2
    }

    /// Widths of `(state, action, next_state, reward, done)`.
    pub fn partition(&self) -> [usize; 5] {
        [self.state_dim, self.action_dim, self.state_dim, 1, 1]
    }

    /// Column offset of each field, in the order of [`TransitionLayout::partition`].
    pub fn offsets(&self) -> [usize; 5] {
        let p = self.partition();
        let mut offsets = [0; 5];
        for i in 1..5 {
            offsets[i] = offsets[i - 1] + p[i - 1];
        }
        offsets
    }

    /// Column of the reward.
    pub fn reward_col(&self) -> usize {
        self.width() - 2
    }

    /// Column of the done flag.
    pub fn done_col(&self) -> usize {
        self.width() - 1
    }
}

/// A single transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Observation `o_t`.
    pub state: Vec<f32>,

    /// Action `a_t`.
    pub action: Vec<f32>,

    /// Observation `o_t+1`.
    pub next_state: Vec<f32>,

    /// Reward `r_t`.
    pub reward: f32,

    /// `1.0` if the episode terminated (not truncated) at this step, otherwise `0.0`.
    pub done: f32,
}

impl Transition {
    /// Flattens the transition into a feature row.
    pub fn to_row(&self, layout: &TransitionLayout) -> Result<Vec<f32>> {
        check_len("state", layout.state_dim, self.state.len())?;
        check_len("action", layout.action_dim, self.action.len())?;
        check_len("next_state", layout.state_dim, self.next_state.len())?;

        let mut row = Vec::with_capacity(layout.width());
        row.extend_from_slice(&self.state);
        row.extend_from_slice(&self.action);
        row.extend_from_slice(&self.next_state);
        row.push(self.reward);
        row.push(self.done);
        Ok(row)
    }
}

fn check_len(name: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(GenrepError::DimensionMismatch(name.to_string(), expected, actual).into());
    }
    Ok(())
}

/// A row-major matrix of feature rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBatch {
    data: Vec<f32>,
    width: usize,
}

impl FeatureBatch {
    /// A batch of `n_rows` rows filled with zeros.
    ///
    /// A batch of width `0` holds no values and has no rows.
    pub fn zeros(n_rows: usize, width: usize) -> Self {
        Self {
            data: vec![0f32; n_rows * width],
            width,
        }
    }

    /// Constructs a batch from row-major data.
    pub fn from_vec(data: Vec<f32>, width: usize) -> Result<Self> {
        if width == 0 || data.len() % width != 0 {
            return Err(GenrepError::DimensionMismatch(
                "feature batch".to_string(),
                width,
                data.len(),
            )
            .into());
        }
        Ok(Self { data, width })
    }

    /// Constructs a batch from transitions.
    pub fn from_transitions(transitions: &[Transition], layout: &TransitionLayout) -> Result<Self> {
        let mut data = Vec::with_capacity(transitions.len() * layout.width());
        for tr in transitions.iter() {
            data.extend(tr.to_row(layout)?);
        }
        Ok(Self {
            data,
            width: layout.width(),
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.data.len().checked_div(self.width).unwrap_or(0)
    }

    /// Returns `true` if the batch has no rows.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Width of a row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Row-major data.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Consumes the batch and returns its row-major data.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// The `i`-th row.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.width..(i + 1) * self.width]
    }

    /// Overwrites the `i`-th row.
    pub fn set_row(&mut self, i: usize, row: &[f32]) -> Result<()> {
        check_len("feature row", self.width, row.len())?;
        self.data[i * self.width..(i + 1) * self.width].copy_from_slice(row);
        Ok(())
    }

    /// Values of column `j`.
    pub fn column(&self, j: usize) -> Vec<f32> {
        if self.width == 0 {
            return vec![];
        }
        self.data.chunks(self.width).map(|row| row[j]).collect()
    }

    /// Returns a new batch with the rows of `other` appended.
    pub fn concat(&self, other: &FeatureBatch) -> Result<Self> {
        check_len("feature row", self.width, other.width)?;
        let mut data = Vec::with_capacity(self.data.len() + other.data.len());
        data.extend_from_slice(&self.data);
        data.extend_from_slice(&other.data);
        Ok(Self {
            data,
            width: self.width,
        })
    }

    /// Returns a new batch with rows taken in the order of `ixs`.
    pub fn select(&self, ixs: &[usize]) -> Self {
        let mut data = Vec::with_capacity(ixs.len() * self.width);
        for &ix in ixs.iter() {
            data.extend_from_slice(self.row(ix));
        }
        Self {
            data,
            width: self.width,
        }
    }

    /// Returns the first `n` rows, or all rows if the batch is shorter.
    pub fn head(&self, n: usize) -> Self {
        let n = n.min(self.len());
        Self {
            data: self.data[..n * self.width].to_vec(),
            width: self.width,
        }
    }

    /// Applies `f(column, value)` to every element and returns the result.
    pub fn map_columns<F>(&self, f: F) -> Self
    where
        F: Fn(usize, f32) -> f32,
    {
        let width = self.width;
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(i, &x)| f(i % width, x))
            .collect();
        Self { data, width }
    }
}

/// A batch of transitions split into five aligned containers.
///
/// This is what a policy consumes; the generative model hands it out from
/// [`TransitionSampler::sample`](crate::TransitionSampler::sample).
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionBatch {
    /// Observations, `len * state_dim` values in row-major order.
    pub state: Vec<f32>,

    /// Actions, `len * action_dim` values in row-major order.
    pub action: Vec<f32>,

    /// Next observations, `len * state_dim` values in row-major order.
    pub next_state: Vec<f32>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Done flags.
    pub done: Vec<f32>,

    /// Layout of the transitions.
    pub layout: TransitionLayout,
}

impl TransitionBatch {
    /// Splits feature rows into the five fields.
    pub fn from_features(batch: &FeatureBatch, layout: &TransitionLayout) -> Result<Self> {
        if batch.width() != layout.width() {
            return Err(GenrepError::FeatureWidthMismatch {
                expected: layout.width(),
                actual: batch.width(),
            }
            .into());
        }

        let n = batch.len();
        let [sd, ad, _, _, _] = layout.partition();
        let [o_state, o_action, o_next_state, _, _] = layout.offsets();
        let mut state = Vec::with_capacity(n * sd);
        let mut action = Vec::with_capacity(n * ad);
        let mut next_state = Vec::with_capacity(n * sd);
        let mut reward = Vec::with_capacity(n);
        let mut done = Vec::with_capacity(n);

        for i in 0..n {
            let row = batch.row(i);
            state.extend_from_slice(&row[o_state..o_state + sd]);
            action.extend_from_slice(&row[o_action..o_action + ad]);
            next_state.extend_from_slice(&row[o_next_state..o_next_state + sd]);
            reward.push(row[layout.reward_col()]);
            done.push(row[layout.done_col()]);
        }

        Ok(Self {
            state,
            action,
            next_state,
            reward,
            done,
            layout: *layout,
        })
    }

    /// Number of transitions.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }

    /// Unpack the data `(o_t, a_t, o_t+1, r_t, d_t)`.
    pub fn unpack(self) -> (Vec<f32>, Vec<f32>, Vec<f32>, Vec<f32>, Vec<f32>) {
        (
            self.state,
            self.action,
            self.next_state,
            self.reward,
            self.done,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn transition(x: f32) -> Transition {
        Transition {
            state: vec![x, x + 1.0, x + 2.0],
            action: vec![x + 3.0],
            next_state: vec![x + 4.0, x + 5.0, x + 6.0],
            reward: x + 7.0,
            done: 1.0,
        }
    }

    #[test]
    fn test_layout() {
        let layout = TransitionLayout::default();
        assert_eq!(layout.width(), 9);
        assert_eq!(layout.partition(), [3, 1, 3, 1, 1]);
        assert_eq!(layout.offsets(), [0, 3, 4, 7, 8]);
        assert_eq!(layout.partition().iter().sum::<usize>(), layout.width());
    }

    #[test]
    fn test_zero_width() {
        let batch = FeatureBatch::zeros(4, 0);
        assert_eq!(batch.len(), 0);
        assert!(batch.is_empty());
        assert!(batch.column(0).is_empty());
        assert_eq!(batch.head(2).len(), 0);
        assert!(FeatureBatch::from_vec(vec![], 0).is_err());
    }

    #[test]
    fn test_split_rows() -> Result<()> {
        let layout = TransitionLayout::default();
        let batch = FeatureBatch::from_transitions(&[transition(0.0), transition(10.0)], &layout)?;
        assert_eq!(batch.len(), 2);

        let tb = TransitionBatch::from_features(&batch, &layout)?;
        assert_eq!(tb.state, vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(tb.action, vec![3.0, 13.0]);
        assert_eq!(tb.next_state, vec![4.0, 5.0, 6.0, 14.0, 15.0, 16.0]);
        assert_eq!(tb.reward, vec![7.0, 17.0]);
        assert_eq!(tb.done, vec![1.0, 1.0]);
        Ok(())
    }

    #[test]
    fn test_wrong_state_dim() {
        let layout = TransitionLayout::default();
        let mut tr = transition(0.0);
        tr.state.pop();
        assert!(tr.to_row(&layout).is_err());
    }

    #[test]
    fn test_select_and_head() -> Result<()> {
        let batch = FeatureBatch::from_vec((0..6).map(|x| x as f32).collect(), 2)?;
        let selected = batch.select(&[2, 0]);
        assert_eq!(selected.as_slice(), &[4.0, 5.0, 0.0, 1.0]);
        assert_eq!(batch.head(10).len(), 3);
        assert_eq!(batch.head(1).as_slice(), &[0.0, 1.0]);
        Ok(())
    }
}
