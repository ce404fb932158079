//! Configuration of RBM.
use crate::{opt::OptimizerConfig, Device};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Rbm`](super::Rbm).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct RbmConfig {
    /// The number of visible units, equal to the width of a feature row.
    pub n_vis: usize,

    /// The number of hidden units.
    pub n_hid: usize,

    /// The number of Gibbs sampling steps per training step.
    pub k: usize,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,

    /// Device where the parameters live.
    pub device: Device,
}

impl Default for RbmConfig {
    fn default() -> Self {
        Self {
            n_vis: 9,
            n_hid: 3,
            k: 1,
            opt_config: OptimizerConfig::default(),
            device: Device::Cpu,
        }
    }
}

impl RbmConfig {
    /// Sets the number of visible units.
    pub fn n_vis(mut self, v: usize) -> Self {
        self.n_vis = v;
        self
    }

    /// Sets the number of hidden units.
    pub fn n_hid(mut self, v: usize) -> Self {
        self.n_hid = v;
        self
    }

    /// Sets the number of Gibbs sampling steps.
    pub fn k(mut self, v: usize) -> Self {
        self.k = v;
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

    /// Constructs [`RbmConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`RbmConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_rbm_config() -> Result<()> {
        let config = RbmConfig::default()
            .n_hid(8)
            .k(2)
            .opt_config(OptimizerConfig::default().learning_rate(0.001));

        let dir = TempDir::new("rbm_config")?;
        let path = dir.path().join("rbm_config.yaml");
        config.save(&path)?;
        let config_ = RbmConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
