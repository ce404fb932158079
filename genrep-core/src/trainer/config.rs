//! Configuration of [`OnlineTrainer`](super::OnlineTrainer).
use crate::error::GenrepError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`OnlineTrainer`](super::OnlineTrainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct OnlineTrainerConfig {
    /// The number of environment steps.
    pub max_timesteps: usize,

    /// Environment steps during which actions are sampled uniformly and the
    /// policy is not trained.
    pub start_timesteps: usize,

    /// Interval of evaluation in environment steps.
    pub eval_interval: usize,

    /// The number of episodes per evaluation.
    pub n_eval_episodes: usize,

    /// Interval of saving the generative model in training cycles.
    pub save_cadence: usize,

    /// Capacity of the accumulation buffer, in real transitions.
    pub capacity: usize,

    /// Synthetic rows appended to the accumulation buffer after the exploration
    /// phase. `None` means `capacity / 2`.
    pub synthetic_rows: Option<usize>,

    /// Gradient steps per training cycle.
    pub n_inner_iters: usize,

    /// Rows per gradient step.
    pub minibatch_size: usize,

    /// Seed of the shuffling of the accumulation buffer.
    pub seed: u64,

    /// Where to save the generative model. `None` disables saving.
    pub model_dir: Option<String>,

    /// Where to save the agent after each evaluation. `None` disables saving.
    pub policy_dir: Option<String>,

    /// Human readable identifier of the run, used in checkpoint file names.
    pub run_id: String,

    /// Name of the environment, used in checkpoint file names.
    pub env_name: String,
}

impl Default for OnlineTrainerConfig {
    fn default() -> Self {
        Self {
            max_timesteps: 2_000_000,
            start_timesteps: 10_000,
            eval_interval: 5_000,
            n_eval_episodes: 10,
            save_cadence: 100,
            capacity: 500,
            synthetic_rows: None,
            n_inner_iters: 10,
            minibatch_size: 128,
            seed: 0,
            model_dir: None,
            policy_dir: None,
            run_id: "default".to_string(),
            env_name: "Pendulum-v0".to_string(),
        }
    }
}

impl OnlineTrainerConfig {
    /// Sets the number of environment steps.
    pub fn max_timesteps(mut self, v: usize) -> Self {
        self.max_timesteps = v;
        self
    }

    /// Sets the length of the exploration phase in environment steps.
    pub fn start_timesteps(mut self, v: usize) -> Self {
        self.start_timesteps = v;
        self
    }

    /// Sets the interval of evaluation in environment steps.
    pub fn eval_interval(mut self, v: usize) -> Self {
        self.eval_interval = v;
        self
    }

    /// Sets the number of episodes per evaluation.
    pub fn n_eval_episodes(mut self, v: usize) -> Self {
        self.n_eval_episodes = v;
        self
    }

    /// Sets the interval of saving the generative model in training cycles.
    pub fn save_cadence(mut self, v: usize) -> Self {
        self.save_cadence = v;
        self
    }

    /// Sets the capacity of the accumulation buffer.
    pub fn capacity(mut self, v: usize) -> Self {
        self.capacity = v;
        self
    }

    /// Sets the number of synthetic rows added per training cycle.
    pub fn synthetic_rows(mut self, v: usize) -> Self {
        self.synthetic_rows = Some(v);
        self
    }

    /// Sets the number of gradient steps per training cycle.
    pub fn n_inner_iters(mut self, v: usize) -> Self {
        self.n_inner_iters = v;
        self
    }

    /// Sets the number of rows per gradient step.
    pub fn minibatch_size(mut self, v: usize) -> Self {
        self.minibatch_size = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the directory of generative model checkpoints.
    pub fn model_dir(mut self, v: impl Into<String>) -> Self {
        self.model_dir = Some(v.into());
        self
    }

    /// Sets the directory where the agent is saved.
    pub fn policy_dir(mut self, v: impl Into<String>) -> Self {
        self.policy_dir = Some(v.into());
        self
    }

    /// Sets the run identifier.
    pub fn run_id(mut self, v: impl Into<String>) -> Self {
        self.run_id = v.into();
        self
    }

    /// Sets the environment name.
    pub fn env_name(mut self, v: impl Into<String>) -> Self {
        self.env_name = v.into();
        self
    }

    /// Synthetic rows per training cycle after the exploration phase.
    pub fn n_synthetic_rows(&self) -> usize {
        self.synthetic_rows.unwrap_or(self.capacity / 2)
    }

    /// Checks that every interval and size is positive.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("capacity", self.capacity),
            ("n_inner_iters", self.n_inner_iters),
            ("minibatch_size", self.minibatch_size),
            ("save_cadence", self.save_cadence),
            ("eval_interval", self.eval_interval),
            ("n_eval_episodes", self.n_eval_episodes),
        ];
        for (name, v) in positive.iter() {
            if *v == 0 {
                return Err(GenrepError::InvalidConfig(format!("{} must be positive", name)).into());
            }
        }
        Ok(())
    }

    /// Constructs [`OnlineTrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`OnlineTrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_trainer_config() -> Result<()> {
        let config = OnlineTrainerConfig::default()
            .max_timesteps(1000)
            .capacity(100)
            .model_dir("some/directory")
            .run_id("main");

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");
        config.save(&path)?;
        let config_ = OnlineTrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        assert_eq!(config_.n_synthetic_rows(), 50);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(OnlineTrainerConfig::default().validate().is_ok());
        assert!(OnlineTrainerConfig::default().capacity(0).validate().is_err());
        assert!(OnlineTrainerConfig::default().minibatch_size(0).validate().is_err());
    }
}
