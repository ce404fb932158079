//! Core functionalities.
mod agent;
mod env;
mod generative;
mod policy;
mod space;
mod step;
mod transition;
pub use agent::Agent;
pub use env::Env;
pub use generative::{CheckpointKey, GenerativeReplay, TransitionSampler};
pub use policy::{Configurable, Policy};
pub use space::BoxSpace;
pub use step::{done_flag, Step};
pub use transition::{FeatureBatch, Transition, TransitionBatch, TransitionLayout};
