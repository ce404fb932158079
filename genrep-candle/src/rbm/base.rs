//! RBM over normalized feature rows.
use super::RbmConfig;
use crate::{
    opt::Optimizer,
    util::{bernoulli, check_width, features_to_tensor, softplus, tensor_to_features},
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{Init, VarBuilder, VarMap};
use genrep_core::{
    error::GenrepError, Bounds, CheckpointKey, FeatureBatch, GenerativeReplay, NormRange,
    Normalizer, TransitionBatch, TransitionLayout, TransitionSampler,
};
use log::{info, trace};
use std::convert::TryFrom;

/// Restricted Boltzmann machine with binary visible and hidden units.
///
/// Visible units are the columns of a feature row normalized into `[0, 1]`.
/// Trained with contrastive divergence: the loss is the gap between the free
/// energy of the data and that of the end of a `k`-step Gibbs chain.
pub struct Rbm {
    device: Device,
    varmap: VarMap,

    /// Visible bias, `(1, n_vis)`.
    v_bias: Tensor,

    /// Hidden bias, `(1, n_hid)`.
    h_bias: Tensor,

    /// Weights, `(n_hid, n_vis)`.
    w: Tensor,

    n_hid: usize,
    k: usize,
    layout: TransitionLayout,
    normalizer: Normalizer,
    opt: Optimizer,
}

impl Rbm {
    /// Constructs an RBM with standard normal initial parameters.
    ///
    /// Fails if `n_vis` differs from the width of a feature row of `bounds`.
    pub fn build(config: RbmConfig, bounds: &Bounds) -> Result<Self> {
        let layout = bounds.layout();
        if config.n_vis != layout.width() {
            return Err(GenrepError::FeatureWidthMismatch {
                expected: layout.width(),
                actual: config.n_vis,
            }
            .into());
        }
        if config.n_hid == 0 || config.k == 0 {
            return Err(GenrepError::InvalidConfig("n_hid and k must be positive".into()).into());
        }

        let device = candle_core::Device::try_from(config.device)?;
        let varmap = VarMap::new();
        let (v_bias, h_bias, w) = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            let init = Init::Randn {
                mean: 0.0,
                stdev: 1.0,
            };
            (
                vb.get_with_hints((1, config.n_vis), "v", init)?,
                vb.get_with_hints((1, config.n_hid), "h", init)?,
                vb.get_with_hints((config.n_hid, config.n_vis), "W", init)?,
            )
        };
        let opt = config.opt_config.build(&varmap)?;

        Ok(Self {
            device,
            varmap,
            v_bias,
            h_bias,
            w,
            n_hid: config.n_hid,
            k: config.k,
            layout,
            normalizer: Normalizer::new(bounds, NormRange::Unit),
            opt,
        })
    }

    /// Samples binary hidden states given visible states.
    pub fn visible_to_hidden(&self, v: &Tensor) -> Result<Tensor> {
        let p = candle_nn::ops::sigmoid(&v.matmul(&self.w.t()?)?.broadcast_add(&self.h_bias)?)?;
        bernoulli(&p)
    }

    /// Samples binary visible states given hidden states.
    pub fn hidden_to_visible(&self, h: &Tensor) -> Result<Tensor> {
        let p = candle_nn::ops::sigmoid(&h.matmul(&self.w)?.broadcast_add(&self.v_bias)?)?;
        bernoulli(&p)
    }

    /// Runs `k` steps of block Gibbs sampling from `v`.
    ///
    /// Returns `v` and the visible state at the end of the chain.
    pub fn forward(&self, v: &Tensor) -> Result<(Tensor, Tensor)> {
        let mut h = self.visible_to_hidden(v)?;
        let mut v_gibbs = v.clone();
        for _ in 0..self.k {
            v_gibbs = self.hidden_to_visible(&h)?;
            h = self.visible_to_hidden(&v_gibbs)?;
        }
        Ok((v.clone(), v_gibbs))
    }

    /// Mean free energy `-mean(v . v_bias + sum softplus(W v + h_bias))` of a batch.
    pub fn free_energy(&self, v: &Tensor) -> Result<Tensor> {
        let v_term = v.matmul(&self.v_bias.t()?)?.squeeze(D::Minus1)?;
        let h_term = softplus(&v.matmul(&self.w.t()?)?.broadcast_add(&self.h_bias)?)?
            .sum(D::Minus1)?;
        Ok((h_term + v_term)?.neg()?.mean_all()?)
    }

    /// Mean free energy of normalized feature rows.
    pub fn free_energy_value(&self, batch: &FeatureBatch) -> Result<f32> {
        check_width(self.layout.width(), batch)?;
        let v = features_to_tensor(batch, &self.device)?;
        Ok(self.free_energy(&v)?.to_scalar::<f32>()?)
    }

    /// Draws `batch_size` visible states from standard normal hidden states,
    /// as raw feature rows.
    pub fn sample(&self, batch_size: usize) -> Result<FeatureBatch> {
        let h = Tensor::randn(0f32, 1f32, (batch_size, self.n_hid), &self.device)?;
        let v = self.hidden_to_visible(&h)?;
        self.normalizer.descale(&tensor_to_features(&v)?)
    }
}

impl TransitionSampler for Rbm {
    fn sample(&mut self, batch_size: usize) -> Result<TransitionBatch> {
        let rows = Rbm::sample(self, batch_size)?;
        TransitionBatch::from_features(&rows, &self.layout)
    }
}

impl GenerativeReplay for Rbm {
    fn tag(&self) -> &'static str {
        "RBM"
    }

    fn layout(&self) -> &TransitionLayout {
        &self.layout
    }

    fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    fn train_step(&mut self, batch: &FeatureBatch) -> Result<f32> {
        check_width(self.layout.width(), batch)?;
        let v = features_to_tensor(batch, &self.device)?;
        let (v, v_gibbs) = self.forward(&v)?;
        let loss = (self.free_energy(&v)? - self.free_energy(&v_gibbs.detach())?)?;
        self.opt.backward_step(&loss)?;
        let loss = loss.to_scalar::<f32>()?;
        trace!("RBM loss: {}", loss);
        Ok(loss)
    }

    fn sample_features(&mut self, batch_size: usize) -> Result<FeatureBatch> {
        Rbm::sample(self, batch_size)
    }

    fn save(&self, key: &CheckpointKey) -> Result<()> {
        self.varmap.save(key.model_path())?;
        self.opt.save(key.optimizer_path())?;
        info!("Save RBM to {:?}", key.model_path());
        Ok(())
    }

    fn load(&mut self, key: &CheckpointKey) -> Result<()> {
        self.varmap.load(key.model_path())?;
        self.opt.load(key.optimizer_path())?;
        info!("Load RBM from {:?}", key.model_path());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

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

    fn constant_rows(n: usize, value: f32) -> FeatureBatch {
        FeatureBatch::from_vec(vec![value; n * 9], 9).unwrap()
    }

    #[test]
    fn test_sample_widths() -> Result<()> {
        let mut rbm = Rbm::build(RbmConfig::default(), &pendulum_bounds())?;
        let batch = TransitionSampler::sample(&mut rbm, 16)?;
        assert_eq!(batch.len(), 16);
        assert_eq!(batch.state.len(), 16 * 3);
        assert_eq!(batch.action.len(), 16);
        assert_eq!(batch.next_state.len(), 16 * 3);
        assert_eq!(batch.reward.len(), 16);
        assert!(batch.done.iter().all(|d| *d == 0.0 || *d == 1.0));
        // Binary visible units descale to the bounds
        assert!(batch.action.iter().all(|a| *a == -2.0 || *a == 2.0));
        Ok(())
    }

    #[test]
    fn test_width_mismatch() -> Result<()> {
        assert!(Rbm::build(RbmConfig::default().n_vis(8), &pendulum_bounds()).is_err());

        let mut rbm = Rbm::build(RbmConfig::default(), &pendulum_bounds())?;
        let err = rbm.train_step(&FeatureBatch::zeros(4, 8)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GenrepError>(),
            Some(GenrepError::FeatureWidthMismatch {
                expected: 9,
                actual: 8
            })
        ));
        Ok(())
    }

    #[test]
    fn test_free_energy_is_pure() -> Result<()> {
        let rbm = Rbm::build(RbmConfig::default(), &pendulum_bounds())?;
        let rows = constant_rows(8, 0.5);
        let f1 = rbm.free_energy_value(&rows)?;
        let f2 = rbm.free_energy_value(&rows)?;
        assert_eq!(f1.to_bits(), f2.to_bits());
        Ok(())
    }

    #[test]
    fn test_checkpoint_round_trip() -> Result<()> {
        let dir = TempDir::new("rbm")?;
        let key = CheckpointKey::new(dir.path(), "test", "Pendulum-v0", "RBM");
        let rows = constant_rows(8, 0.5);

        let mut rbm = Rbm::build(RbmConfig::default(), &pendulum_bounds())?;
        for _ in 0..3 {
            rbm.train_step(&constant_rows(32, 0.0))?;
        }
        let f = rbm.free_energy_value(&rows)?;
        rbm.save(&key)?;
        assert!(key.model_path().exists());
        assert!(key.optimizer_path().exists());

        let mut rbm_ = Rbm::build(RbmConfig::default(), &pendulum_bounds())?;
        rbm_.load(&key)?;
        let f_ = rbm_.free_energy_value(&rows)?;
        assert_eq!(f.to_bits(), f_.to_bits());
        Ok(())
    }

    /// Mean of the visible units of model samples drawn from normal hidden
    /// states, over several draws.
    fn sample_mean(rbm: &Rbm) -> Result<f32> {
        let mut total = 0.0;
        for _ in 0..16 {
            let h = Tensor::randn(0f32, 1f32, (256, rbm.n_hid), &rbm.device)?;
            total += rbm.hidden_to_visible(&h)?.mean_all()?.to_scalar::<f32>()?;
        }
        Ok(total / 16.0)
    }

    #[test]
    fn test_contrastive_divergence_on_zeros() -> Result<()> {
        // On all-zero data the free energy of zeros should fall relative to
        // the free energy of ones, and model samples should move toward zeros.
        let mut rbm = Rbm::build(RbmConfig::default(), &pendulum_bounds())?;
        let zeros = constant_rows(128, 0.0);
        let ones = constant_rows(128, 1.0);
        let gap = |rbm: &Rbm| -> Result<f32> {
            Ok(rbm.free_energy_value(&zeros)? - rbm.free_energy_value(&ones)?)
        };

        let gap_before = gap(&rbm)?;
        let mean_before = sample_mean(&rbm)?;
        for _ in 0..200 {
            let loss = rbm.train_step(&zeros)?;
            assert!(loss.is_finite());
        }
        let gap_after = gap(&rbm)?;
        let mean_after = sample_mean(&rbm)?;
        assert!(gap_after < gap_before, "{} >= {}", gap_after, gap_before);
        assert!(mean_after < mean_before, "{} >= {}", mean_after, mean_before);
        Ok(())
    }
}
