use crate::{next_state, PendulumEnvConfig};
use anyhow::Result;
use genrep_core::{record::Record, BoxSpace, Env, Step};
use log::trace;
use std::f32::consts::PI;

/// Inverted pendulum swing-up environment.
pub struct PendulumEnv {
    config: PendulumEnvConfig,
    rng: fastrand::Rng,
    obs_space: BoxSpace,
    act_space: BoxSpace,
    th: f32,
    thdot: f32,
    steps: usize,
}

impl PendulumEnv {
    fn obs(&self) -> Vec<f32> {
        vec![self.th.cos(), self.th.sin(), self.thdot]
    }
}

impl Env for PendulumEnv {
    type Config = PendulumEnvConfig;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let max_speed = config.max_speed;
        let max_torque = config.max_torque;
        Ok(Self {
            config: config.clone(),
            rng: fastrand::Rng::with_seed(seed as u64),
            obs_space: BoxSpace::new(vec![-1.0, -1.0, -max_speed], vec![1.0, 1.0, max_speed])?,
            act_space: BoxSpace::new(vec![-max_torque], vec![max_torque])?,
            th: 0.0,
            thdot: 0.0,
            steps: 0,
        })
    }

    fn reset(&mut self) -> Result<Vec<f32>> {
        self.th = PI * (2.0 * self.rng.f32() - 1.0);
        self.thdot = 2.0 * self.rng.f32() - 1.0;
        self.steps = 0;
        trace!("Reset to th = {}, thdot = {}", self.th, self.thdot);
        Ok(self.obs())
    }

    fn step(&mut self, act: &[f32]) -> Result<(Step, Record)> {
        let act = self.act_space.clip(act);
        let u = act.first().copied().unwrap_or(0.0);
        let (th, thdot, reward) = next_state(&self.config, self.th, self.thdot, u);
        self.th = th;
        self.thdot = thdot;
        self.steps += 1;

        let is_truncated = self.steps >= self.config.max_episode_steps;
        let step = Step::new(self.obs(), act, reward, false, is_truncated);
        Ok((step, Record::empty()))
    }

    fn observation_space(&self) -> &BoxSpace {
        &self.obs_space
    }

    fn action_space(&self) -> &BoxSpace {
        &self.act_space
    }

    fn sample_action(&mut self) -> Vec<f32> {
        self.act_space.sample(&mut self.rng)
    }

    fn max_episode_steps(&self) -> usize {
        self.config.max_episode_steps
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_episode() -> Result<()> {
        let config = PendulumEnvConfig::default().max_episode_steps(20);
        let mut env = PendulumEnv::build(&config, 42)?;
        let obs = env.reset()?;
        assert_eq!(obs.len(), 3);
        assert!(((obs[0].powi(2) + obs[1].powi(2)) - 1.0).abs() < 1e-5);

        for i in 1..=20 {
            let act = env.sample_action();
            assert!(act[0] >= -2.0 && act[0] <= 2.0);
            let (step, _) = env.step(&act)?;
            assert!(!step.is_terminated);
            assert_eq!(step.is_truncated, i == 20);
            assert!(step.reward <= 0.0 && step.reward > -16.3);
            assert!(step.obs[2].abs() <= 8.0);
        }
        Ok(())
    }

    #[test]
    fn test_action_clipped() -> Result<()> {
        let config = PendulumEnvConfig::default();
        let mut env = PendulumEnv::build(&config, 0)?;
        env.reset()?;
        let (step, _) = env.step(&[5.0])?;
        assert_eq!(step.act, vec![2.0]);
        Ok(())
    }

    #[test]
    fn test_seeded() -> Result<()> {
        let config = PendulumEnvConfig::default();
        let mut env1 = PendulumEnv::build(&config, 7)?;
        let mut env2 = PendulumEnv::build(&config, 7)?;
        assert_eq!(env1.reset()?, env2.reset()?);
        assert_eq!(env1.sample_action(), env2.sample_action());
        Ok(())
    }
}
