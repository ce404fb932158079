//! VAE over normalized feature rows.
use super::VaeConfig;
use crate::{
    mlp::Mlp,
    model::SubModel1,
    opt::Optimizer,
    util::{check_width, features_to_tensor, tensor_to_features},
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use genrep_core::{
    error::GenrepError, Bounds, CheckpointKey, FeatureBatch, GenerativeReplay, NormRange,
    Normalizer, TransitionBatch, TransitionLayout, TransitionSampler,
};
use log::{info, trace};
use std::convert::TryFrom;

/// Variational autoencoder of feature rows normalized into `[-1, 1]`.
pub struct Vae {
    device: Device,
    varmap: VarMap,
    encoder: Mlp,
    decoder: Mlp,
    z_dim: usize,
    layout: TransitionLayout,
    normalizer: Normalizer,
    opt: Optimizer,
}

impl Vae {
    /// Constructs a VAE.
    ///
    /// Fails if `feature_dim` differs from the width of a feature row of `bounds`.
    pub fn build(config: VaeConfig, bounds: &Bounds) -> Result<Self> {
        let layout = bounds.layout();
        if config.feature_dim != layout.width() {
            return Err(GenrepError::FeatureWidthMismatch {
                expected: layout.width(),
                actual: config.feature_dim,
            }
            .into());
        }
        if config.h_dim == 0 || config.z_dim == 0 {
            return Err(GenrepError::InvalidConfig("h_dim and z_dim must be positive".into()).into());
        }

        let device = candle_core::Device::try_from(config.device)?;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let encoder = Mlp::build(vb.pp("encoder"), config.encoder_config())?;
        let decoder = Mlp::build(vb.pp("decoder"), config.decoder_config())?;
        let opt = config.opt_config.build(&varmap)?;

        Ok(Self {
            device,
            varmap,
            encoder,
            decoder,
            z_dim: config.z_dim,
            layout,
            normalizer: Normalizer::new(bounds, NormRange::Symmetric),
            opt,
        })
    }

    /// Returns `(mu, logvar)` of the approximate posterior.
    pub fn encode(&self, x: &Tensor) -> Result<(Tensor, Tensor)> {
        let h = self.encoder.forward(x)?;
        let mu = h.narrow(D::Minus1, 0, self.z_dim)?;
        let logvar = h.narrow(D::Minus1, self.z_dim, self.z_dim)?;
        Ok((mu, logvar))
    }

    /// `z = mu + exp(0.5 * logvar) * eps` with fresh standard normal `eps`.
    pub fn reparameterize(&self, mu: &Tensor, logvar: &Tensor) -> Result<Tensor> {
        let std = (logvar * 0.5)?.exp()?;
        let eps = std.randn_like(0.0, 1.0)?;
        Ok((mu + (std * eps)?)?)
    }

    /// Returns the reconstruction of `x` with the posterior parameters.
    pub fn forward(&self, x: &Tensor) -> Result<(Tensor, Tensor, Tensor)> {
        let (mu, logvar) = self.encode(x)?;
        let z = self.reparameterize(&mu, &logvar)?;
        let recon = self.decoder.forward(&z)?;
        Ok((recon, mu, logvar))
    }

    /// Summed squared reconstruction error plus the KL divergence from the
    /// standard normal prior.
    pub fn loss(&self, recon: &Tensor, x: &Tensor, mu: &Tensor, logvar: &Tensor) -> Result<Tensor> {
        let sse = (recon - x)?.sqr()?.sum_all()?;
        let kld = ((logvar + 1.0)? - mu.sqr()?)?;
        let kld = ((kld - logvar.exp()?)?.sum_all()? * -0.5)?;
        Ok((sse + kld)?)
    }

    /// Decodes `batch_size` standard normal latent vectors into raw feature rows.
    pub fn sample(&self, batch_size: usize) -> Result<FeatureBatch> {
        let z = Tensor::randn(0f32, 1f32, (batch_size, self.z_dim), &self.device)?;
        let x = self.decoder.forward(&z)?;
        self.normalizer.descale(&tensor_to_features(&x)?)
    }
}

impl TransitionSampler for Vae {
    fn sample(&mut self, batch_size: usize) -> Result<TransitionBatch> {
        let rows = Vae::sample(self, batch_size)?;
        TransitionBatch::from_features(&rows, &self.layout)
    }
}

impl GenerativeReplay for Vae {
    fn tag(&self) -> &'static str {
        "VAE"
    }

    fn layout(&self) -> &TransitionLayout {
        &self.layout
    }

    fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    fn train_step(&mut self, batch: &FeatureBatch) -> Result<f32> {
        check_width(self.layout.width(), batch)?;
        let x = features_to_tensor(batch, &self.device)?;
        let (recon, mu, logvar) = self.forward(&x)?;
        let loss = self.loss(&recon, &x, &mu, &logvar)?;
        self.opt.backward_step(&loss)?;
        let loss = loss.to_scalar::<f32>()?;
        trace!("VAE loss: {}", loss);
        Ok(loss)
    }

    fn sample_features(&mut self, batch_size: usize) -> Result<FeatureBatch> {
        Vae::sample(self, batch_size)
    }

    fn save(&self, key: &CheckpointKey) -> Result<()> {
        self.varmap.save(key.model_path())?;
        self.opt.save(key.optimizer_path())?;
        info!("Save VAE to {:?}", key.model_path());
        Ok(())
    }

    fn load(&mut self, key: &CheckpointKey) -> Result<()> {
        self.varmap.load(key.model_path())?;
        self.opt.load(key.optimizer_path())?;
        info!("Load VAE from {:?}", key.model_path());
        Ok(())
    }
}
