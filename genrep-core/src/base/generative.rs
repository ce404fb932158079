//! Generative replay interface.
//!
//! A generative replay engine learns the distribution of observed transitions
//! and manufactures synthetic transitions on demand, in place of a replay
//! buffer storing raw transitions.
use super::{FeatureBatch, TransitionBatch, TransitionLayout};
use crate::Normalizer;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Source of transition batches for a policy.
pub trait TransitionSampler {
    /// Draws `batch_size` transitions, split into the five aligned containers
    /// `(state, action, next_state, reward, done)`.
    fn sample(&mut self, batch_size: usize) -> Result<TransitionBatch>;
}

/// A generative model of transitions, trained online.
///
/// Each implementation fixes the range of its [`Normalizer`] to match the
/// output nonlinearity of the model; callers go through
/// [`GenerativeReplay::normalize`] and [`GenerativeReplay::descale`] so that
/// the two ranges cannot be mixed up.
pub trait GenerativeReplay: TransitionSampler {
    /// Short identifier of the model, used in checkpoint and metric file names.
    fn tag(&self) -> &'static str;

    /// Layout of the feature rows the model is trained on.
    fn layout(&self) -> &TransitionLayout;

    /// Normalizer whose range matches the model.
    fn normalizer(&self) -> &Normalizer;

    /// Maps raw feature rows into the model's input range.
    fn normalize(&self, batch: &FeatureBatch) -> Result<FeatureBatch> {
        self.normalizer().normalize(batch)
    }

    /// Maps rows in the model's range back to raw values.
    fn descale(&self, batch: &FeatureBatch) -> Result<FeatureBatch> {
        self.normalizer().descale(batch)
    }

    /// Performs a single gradient step on a normalized mini-batch and
    /// returns the scalar loss.
    fn train_step(&mut self, batch: &FeatureBatch) -> Result<f32>;

    /// Draws `batch_size` synthetic transitions as raw (descaled) feature rows.
    fn sample_features(&mut self, batch_size: usize) -> Result<FeatureBatch>;

    /// Saves the model parameters and the optimizer state.
    fn save(&self, key: &CheckpointKey) -> Result<()>;

    /// Restores the model parameters and the optimizer state.
    fn load(&mut self, key: &CheckpointKey) -> Result<()>;
}

/// Location of a pair of checkpoint files.
///
/// Model parameters go to `{dir}/{run_id}_{env_name}_{tag}.safetensors`, the
/// optimizer state to `{dir}/{run_id}_{env_name}_{tag}_optimizer.safetensors`.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointKey {
    dir: PathBuf,
    stem: String,
}

impl CheckpointKey {
    /// Constructs a key.
    pub fn new(dir: impl AsRef<Path>, run_id: &str, env_name: &str, tag: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            stem: format!("{}_{}_{}", run_id, env_name, tag),
        }
    }

    /// Directory of the checkpoint files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the model parameters.
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(format!("{}.safetensors", self.stem))
    }

    /// Path of the optimizer state.
    pub fn optimizer_path(&self) -> PathBuf {
        self.dir.join(format!("{}_optimizer.safetensors", self.stem))
    }
}
