//! Configuration of VAE.
use crate::{mlp::MlpConfig, opt::OptimizerConfig, Activation, Device};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Vae`](super::Vae).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct VaeConfig {
    /// Width of a feature row.
    pub feature_dim: usize,

    /// The number of hidden units of the encoder and the decoder.
    pub h_dim: usize,

    /// Dimension of the latent space.
    pub z_dim: usize,

    /// Negative slope of the leaky ReLU in the encoder.
    pub encoder_slope: f64,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,

    /// Device where the parameters live.
    pub device: Device,
}

impl Default for VaeConfig {
    fn default() -> Self {
        Self {
            feature_dim: 9,
            h_dim: 5,
            z_dim: 3,
            encoder_slope: 0.2,
            opt_config: OptimizerConfig::default(),
            device: Device::Cpu,
        }
    }
}

impl VaeConfig {
    /// Sets the width of a feature row.
    pub fn feature_dim(mut self, v: usize) -> Self {
        self.feature_dim = v;
        self
    }

    /// Sets the number of hidden units.
    pub fn h_dim(mut self, v: usize) -> Self {
        self.h_dim = v;
        self
    }

    /// Sets the dimension of the latent space.
    pub fn z_dim(mut self, v: usize) -> Self {
        self.z_dim = v;
        self
    }

    /// Sets the configuration of the optimizer.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Encoder: `feature_dim -> h_dim -> 2 * z_dim`.
    pub(super) fn encoder_config(&self) -> MlpConfig {
        MlpConfig::new(self.feature_dim, vec![self.h_dim], 2 * self.z_dim)
            .activation(Activation::LeakyRelu(self.encoder_slope))
    }

    /// Decoder: `z_dim -> h_dim -> feature_dim`, bounded by `tanh`.
    pub(super) fn decoder_config(&self) -> MlpConfig {
        MlpConfig::new(self.z_dim, vec![self.h_dim], self.feature_dim)
            .activation(Activation::Relu)
            .activation_out(Activation::Tanh)
    }

    /// Constructs [`VaeConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`VaeConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
