//! Inverted pendulum swing-up environment.
//!
//! The observation is `[cos θ, sin θ, θ̇]` and the action is a torque in
//! `[-max_torque, max_torque]`. The reward is
//! `-(normalize(θ)² + 0.1 θ̇² + 0.001 u²)`, so it lies in `[-16.27, 0]` with
//! the default parameters. Episodes never terminate; they are truncated after
//! `max_episode_steps` steps.
mod config;
mod dynamics;
mod env;
pub use config::PendulumEnvConfig;
pub use dynamics::{angle_normalize, next_state};
pub use env::PendulumEnv;
