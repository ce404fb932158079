//! Environment step.

/// Represents an action, observation and reward tuple `(a_t, o_t+1, r_t)`
/// with episode-end flags.
///
/// An environment emits a [`Step`] object at every interaction step.
/// The trainer combines it with `o_t` to create a transition `(o_t, a_t, o_t+1, r_t, d_t)`.
#[derive(Debug, Clone)]
pub struct Step {
    /// Action.
    pub act: Vec<f32>,

    /// Observation.
    pub obs: Vec<f32>,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if episode is terminated.
    pub is_terminated: bool,

    /// Flag denoting if episode is truncated by the time limit.
    pub is_truncated: bool,
}

impl Step {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: Vec<f32>,
        act: Vec<f32>,
        reward: f32,
        is_terminated: bool,
        is_truncated: bool,
    ) -> Self {
        Step {
            act,
            obs,
            reward,
            is_terminated,
            is_truncated,
        }
    }

    #[inline]
    /// Terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}

/// Done flag stored in a transition for the generative model.
///
/// An episode that ends at the time limit is not a true terminal state, so it is
/// stored as `0.0` to avoid bootstrapping from an artificial terminal.
pub fn done_flag(is_done: bool, episode_steps: usize, max_episode_steps: usize) -> f32 {
    if is_done && episode_steps < max_episode_steps {
        1.0
    } else {
        0.0
    }
}
