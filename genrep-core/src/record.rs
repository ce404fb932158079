//! Types and traits for recording training metrics.
//!
//! * [`Record`] - A container of key-value pairs produced by the trainer, the agent
//!   and the environment
//! * [`Recorder`] - Consumes records and persists them on [`Recorder::flush`]
//! * [`MetricsRecorder`] - Keeps the evaluation return, episode reward and
//!   generative loss series and writes them as CSV files
//! * [`BufferedRecorder`] - Keeps every record in memory
//!
//! The trainer tags every record with the current environment step under the
//! key [`STEP_KEY`].
mod base;
mod buffered_recorder;
mod metrics_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use metrics_recorder::{MetricsRecorder, Series};
pub use recorder::Recorder;

/// Key of the environment step in records written by the trainer.
pub const STEP_KEY: &str = "env_steps";

/// Key of the average evaluation return.
pub const EVAL_RETURN_KEY: &str = "eval_return";

/// Key of the cumulative reward of an episode.
pub const EPISODE_REWARD_KEY: &str = "episode_reward";

/// Key of the loss of a generative model training cycle.
pub const GENERATIVE_LOSS_KEY: &str = "generative_loss";
