#![warn(missing_docs)]
//! Generative replay for reinforcement learning.
//!
//! Instead of storing raw transitions in a finite replay buffer, a small
//! generative model learns the distribution of observed transitions online
//! and is sampled to manufacture synthetic transitions for policy training.
//! This crate holds the backend-independent parts: the transition data model,
//! the normalizer, the [`GenerativeReplay`] interface and the
//! [`OnlineTrainer`] that drives environment interaction, generative model
//! training and policy training.
pub mod error;
pub mod record;

mod base;
pub use base::{
    done_flag, Agent, BoxSpace, CheckpointKey, Configurable, Env, FeatureBatch,
    GenerativeReplay, Policy, Step, Transition, TransitionBatch, TransitionLayout,
    TransitionSampler,
};

mod bounds;
pub use bounds::{Bounds, NormRange, Normalizer, DEFAULT_REWARD_HIGH, DEFAULT_REWARD_LOW};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{AccumulationBuffer, OnlineTrainer, OnlineTrainerConfig};
