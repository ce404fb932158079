//! Environment.
use super::{BoxSpace, Step};
use crate::record::Record;
use anyhow::Result;

/// Represents an environment, typically an MDP with a continuous action.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<Vec<f32>>;

    /// Performes an environment step.
    ///
    /// The returned [`Step`] has `is_truncated == true` when the episode reached
    /// [`Env::max_episode_steps`].
    fn step(&mut self, act: &[f32]) -> Result<(Step, Record)>;

    /// Bounds of the observation.
    fn observation_space(&self) -> &BoxSpace;

    /// Bounds of the action.
    fn action_space(&self) -> &BoxSpace;

    /// Samples an action uniformly from the action space.
    fn sample_action(&mut self) -> Vec<f32>;

    /// The maximum number of steps in an episode.
    fn max_episode_steps(&self) -> usize;
}
