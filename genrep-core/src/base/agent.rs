//! Agent.
use super::{Policy, TransitionSampler};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy.
///
/// The agent does not own a replay buffer. At every optimization step it is
/// handed the generative replay engine, from which it draws batches of
/// synthetic transitions.
pub trait Agent: Policy {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Performs an optimization step and returns some information.
    ///
    /// `replay` is the source of transitions used for updating model parameters.
    fn opt(&mut self, replay: &mut dyn TransitionSampler) -> Result<Record>;

    /// Save the parameters of the agent in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
