//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{Agent, Env};
use anyhow::Result;
use log::info;

/// Runs a fixed number of episodes on a dedicated environment and returns
/// the average return (cumulative reward) across all episodes.
///
/// # Examples
///
/// ```ignore
/// let config = PendulumEnvConfig::default();
/// let mut evaluator = DefaultEvaluator::<PendulumEnv>::new(&config, seed + 100, 10)?;
/// let avg_return = evaluator.evaluate(&mut agent)?;
/// ```
pub struct DefaultEvaluator<E: Env> {
    /// The number of episodes to run during evaluation.
    n_episodes: usize,

    /// The environment instance used for evaluation.
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<A: Agent>(&mut self, agent: &mut A) -> Result<f32> {
        let mut r_total = 0f32;

        for _ in 0..self.n_episodes {
            let mut prev_obs = self.env.reset()?;

            loop {
                let act = agent.sample(&prev_obs);
                let (step, _) = self.env.step(&act)?;
                r_total += step.reward;
                if step.is_done() {
                    break;
                }
                prev_obs = step.obs;
            }
        }

        let avg_return = r_total / self.n_episodes as f32;
        info!("---------------------------------------");
        info!(
            "Evaluation over {} episodes: {:.3}",
            self.n_episodes, avg_return
        );
        info!("---------------------------------------");

        Ok(avg_return)
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    ///
    /// * `config` - Configuration for the environment
    /// * `seed` - Random seed for environment initialization
    /// * `n_episodes` - Number of episodes to run during evaluation
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        Ok(Self {
            n_episodes,
            env: E::build(config, seed)?,
        })
    }
}
