//! Online generative replay on the pendulum.
//!
//! This crate puts the pieces together:
//!
//! * [genrep-core](genrep_core) has the environment and agent traits, the
//!   transition normalizer and the [`OnlineTrainer`](genrep_core::OnlineTrainer),
//!   which trains a generative model of transitions while the agent interacts
//!   with the environment.
//! * [genrep-candle](genrep_candle) has the RBM and VAE transition models
//!   written with [candle](https://crates.io/crates/candle-core).
//! * [genrep-pendulum-env](genrep_pendulum_env) is the inverted pendulum
//!   swing-up environment.
//!
//! [`UniformAgent`] is a policy consumer that acts uniformly at random and
//! draws synthetic batches from the generative model at every step. [`run`]
//! wires a whole training run from a [`RunConfig`].
mod agent;
mod run;
pub use agent::{UniformAgent, UniformAgentConfig};
pub use run::{run, RunConfig, EVAL_SEED_OFFSET};
