//! Utilities.
use anyhow::Result;
use candle_core::{DType, Device, Tensor, D};
use genrep_core::{error::GenrepError, FeatureBatch, TransitionBatch, TransitionLayout};

/// `log(1 + exp(x))`, computed without overflow for large `x`.
pub fn softplus(xs: &Tensor) -> Result<Tensor> {
    let tail = ((xs.abs()?.neg()?.exp()? + 1.0)?).log()?;
    Ok((xs.relu()? + tail)?)
}

/// Draws binary samples with success probabilities `p`.
pub fn bernoulli(p: &Tensor) -> Result<Tensor> {
    let u = Tensor::rand(0f32, 1f32, p.shape(), p.device())?;
    Ok(u.lt(p)?.to_dtype(DType::F32)?)
}

/// Converts feature rows into a tensor of shape `(n_rows, width)`.
pub fn features_to_tensor(batch: &FeatureBatch, device: &Device) -> Result<Tensor> {
    Ok(Tensor::from_slice(
        batch.as_slice(),
        (batch.len(), batch.width()),
        device,
    )?)
}

/// Converts a tensor of shape `(n_rows, width)` into feature rows.
pub fn tensor_to_features(xs: &Tensor) -> Result<FeatureBatch> {
    let (_, width) = xs.dims2()?;
    let data = xs
        .to_dtype(DType::F32)?
        .flatten_all()?
        .to_vec1::<f32>()?;
    FeatureBatch::from_vec(data, width)
}

/// Checks the width of feature rows fed to a model.
pub(crate) fn check_width(expected: usize, batch: &FeatureBatch) -> Result<()> {
    if batch.width() != expected {
        return Err(GenrepError::FeatureWidthMismatch {
            expected,
            actual: batch.width(),
        }
        .into());
    }
    Ok(())
}

/// A batch of transitions as five aligned tensors.
///
/// `state` and `next_state` have shape `(batch_size, state_dim)`, `action` has
/// shape `(batch_size, action_dim)`, `reward` and `done` have shape `(batch_size, 1)`.
#[derive(Debug, Clone)]
pub struct TransitionTensors {
    /// Observations.
    pub state: Tensor,

    /// Actions.
    pub action: Tensor,

    /// Next observations.
    pub next_state: Tensor,

    /// Rewards.
    pub reward: Tensor,

    /// Done flags, `1` for true terminal transitions.
    pub done: Tensor,
}

impl TransitionTensors {
    /// Splits a tensor of feature rows into its five fields.
    pub fn from_features(xs: &Tensor, layout: &TransitionLayout) -> Result<Self> {
        let (_, width) = xs.dims2()?;
        if width != layout.width() {
            return Err(GenrepError::FeatureWidthMismatch {
                expected: layout.width(),
                actual: width,
            }
            .into());
        }
        let offsets = layout.offsets();
        let sizes = layout.partition();
        let field = |i: usize| xs.narrow(D::Minus1, offsets[i], sizes[i]);

        Ok(Self {
            state: field(0)?,
            action: field(1)?,
            next_state: field(2)?,
            reward: field(3)?,
            done: field(4)?,
        })
    }

    /// Moves a [`TransitionBatch`] onto a device.
    pub fn from_batch(batch: TransitionBatch, device: &Device) -> Result<Self> {
        let n = batch.len();
        let layout = batch.layout;
        let (state, action, next_state, reward, done) = batch.unpack();
        let tensor = |data: Vec<f32>, dim: usize| Tensor::from_vec(data, (n, dim), device);

        Ok(Self {
            state: tensor(state, layout.state_dim)?,
            action: tensor(action, layout.action_dim)?,
            next_state: tensor(next_state, layout.state_dim)?,
            reward: tensor(reward, 1)?,
            done: tensor(done, 1)?,
        })
    }

    /// The number of transitions.
    pub fn len(&self) -> Result<usize> {
        Ok(self.state.dims2()?.0)
    }
}
