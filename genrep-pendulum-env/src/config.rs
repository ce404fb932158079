//! Configuration of the pendulum.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
/// Configuration of [`PendulumEnv`](super::PendulumEnv).
pub struct PendulumEnvConfig {
    /// Episodes are truncated after this number of steps.
    pub max_episode_steps: usize,

    /// Bound of the angular velocity.
    pub max_speed: f32,

    /// Bound of the torque.
    pub max_torque: f32,

    /// Time step.
    pub dt: f32,

    /// Gravitational acceleration.
    pub g: f32,

    /// Mass.
    pub m: f32,

    /// Length.
    pub l: f32,
}

impl Default for PendulumEnvConfig {
    fn default() -> Self {
        Self {
            max_episode_steps: 200,
            max_speed: 8.0,
            max_torque: 2.0,
            dt: 0.05,
            g: 10.0,
            m: 1.0,
            l: 1.0,
        }
    }
}

impl PendulumEnvConfig {
    /// Sets the maximum number of steps in an episode.
    pub fn max_episode_steps(mut self, v: usize) -> Self {
        self.max_episode_steps = v;
        self
    }

    /// Sets the gravitational acceleration.
    pub fn g(mut self, v: f32) -> Self {
        self.g = v;
        self
    }

    /// Constructs [`PendulumEnvConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PendulumEnvConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
