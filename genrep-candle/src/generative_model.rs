//! Selection between the generative models.
use crate::{
    rbm::{Rbm, RbmConfig},
    vae::{Vae, VaeConfig},
};
use anyhow::Result;
use genrep_core::{
    Bounds, CheckpointKey, FeatureBatch, GenerativeReplay, Normalizer, TransitionBatch,
    TransitionLayout, TransitionSampler,
};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`GenerativeModel`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum GenerativeModelConfig {
    /// Restricted Boltzmann machine.
    Rbm(RbmConfig),

    /// Variational autoencoder.
    Vae(VaeConfig),
}

impl Default for GenerativeModelConfig {
    fn default() -> Self {
        Self::Rbm(RbmConfig::default())
    }
}

impl GenerativeModelConfig {
    /// Constructs [`GenerativeModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`GenerativeModelConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// One of the generative models, chosen at run time.
pub enum GenerativeModel {
    /// Restricted Boltzmann machine.
    Rbm(Rbm),

    /// Variational autoencoder.
    Vae(Vae),
}

impl GenerativeModel {
    /// Builds the model described by `config`.
    pub fn build(config: GenerativeModelConfig, bounds: &Bounds) -> Result<Self> {
        match config {
            GenerativeModelConfig::Rbm(config) => Ok(Self::Rbm(Rbm::build(config, bounds)?)),
            GenerativeModelConfig::Vae(config) => Ok(Self::Vae(Vae::build(config, bounds)?)),
        }
    }

    fn inner(&self) -> &dyn GenerativeReplay {
        match self {
            Self::Rbm(m) => m,
            Self::Vae(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn GenerativeReplay {
        match self {
            Self::Rbm(m) => m,
            Self::Vae(m) => m,
        }
    }
}

impl TransitionSampler for GenerativeModel {
    fn sample(&mut self, batch_size: usize) -> Result<TransitionBatch> {
        self.inner_mut().sample(batch_size)
    }
}

impl GenerativeReplay for GenerativeModel {
    fn tag(&self) -> &'static str {
        self.inner().tag()
    }

    fn layout(&self) -> &TransitionLayout {
        self.inner().layout()
    }

    fn normalizer(&self) -> &Normalizer {
        self.inner().normalizer()
    }

    fn train_step(&mut self, batch: &FeatureBatch) -> Result<f32> {
        self.inner_mut().train_step(batch)
    }

    fn sample_features(&mut self, batch_size: usize) -> Result<FeatureBatch> {
        self.inner_mut().sample_features(batch_size)
    }

    fn save(&self, key: &CheckpointKey) -> Result<()> {
        self.inner().save(key)
    }

    fn load(&mut self, key: &CheckpointKey) -> Result<()> {
        self.inner_mut().load(key)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use genrep_core::NormRange;
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

    #[test]
    fn test_dispatch() -> Result<()> {
        let rbm = GenerativeModel::build(GenerativeModelConfig::default(), &pendulum_bounds())?;
        assert_eq!(rbm.tag(), "RBM");
        assert_eq!(rbm.normalizer().range(), NormRange::Unit);

        let config = GenerativeModelConfig::Vae(VaeConfig::default());
        let mut vae = GenerativeModel::build(config, &pendulum_bounds())?;
        assert_eq!(vae.tag(), "VAE");
        assert_eq!(vae.normalizer().range(), NormRange::Symmetric);
        assert_eq!(vae.sample_features(4)?.width(), 9);
        Ok(())
    }

    #[test]
    fn test_serde_config() -> Result<()> {
        let dir = TempDir::new("generative_model_config")?;
        let path = dir.path().join("model.yaml");
        let config = GenerativeModelConfig::Vae(VaeConfig::default().z_dim(4));
        config.save(&path)?;
        assert_eq!(GenerativeModelConfig::load(&path)?, config);
        Ok(())
    }
}
