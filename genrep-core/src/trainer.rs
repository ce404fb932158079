//! Train [`Agent`] with generative replay.
mod accumulator;
mod config;
use crate::{
    done_flag,
    error::GenrepError,
    record::{
        Record, RecordValue, RecordValue::Scalar, Recorder, EPISODE_REWARD_KEY, EVAL_RETURN_KEY,
        GENERATIVE_LOSS_KEY, STEP_KEY,
    },
    Agent, CheckpointKey, Env, Evaluator, GenerativeReplay, Transition,
};
pub use accumulator::AccumulationBuffer;
use anyhow::Result;
pub use config::OnlineTrainerConfig;
use log::{info, trace, warn};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::{
    path::Path,
    sync::{Arc, Mutex},
};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the online training loop.
///
/// # Training loop
///
/// 0. Evaluate the agent once before training, recorded at step `0`.
/// 1. Reset the environment.
/// 2. Take an action: a uniformly sampled one while `t < start_timesteps`,
///    otherwise the one proposed by the agent.
/// 3. Push the raw transition `(o_t, a_t, o_t+1, r_t, d_t)` into the
///    [`AccumulationBuffer`]. `d_t` is `0` when the episode ended at the time limit.
/// 4. If the buffer is full, run a training cycle of the generative model
///    (see [`OnlineTrainer::train_generative_model`]). Synthetic rows are
///    mixed in only when `t >= start_timesteps`.
/// 5. If `t >= start_timesteps`, perform an optimization step of the agent,
///    which draws synthetic transitions from the generative model.
/// 6. At the end of an episode, record its cumulative reward and reset the environment.
/// 7. Every `eval_interval` steps, evaluate the agent.
/// 8. Back to step 2 until `max_timesteps` steps were taken or a stop is requested.
///
/// Records are flushed on every exit path, including errors and interrupts.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|action|B[Env]
///     B -->|Step|C[AccumulationBuffer]
///     C -->|real rows|D[GenerativeReplay]
///     D -->|synthetic rows|C
///     D -->|TransitionBatch|A
/// ```
pub struct OnlineTrainer {
    config: OnlineTrainerConfig,

    /// Shuffles the rows of a training cycle.
    rng: StdRng,

    /// The number of training cycles of the generative model so far.
    cycles: usize,
}

fn is_stopped(stop: &Arc<Mutex<bool>>) -> bool {
    // A poisoned lock means the signal handler panicked, so stop as well.
    stop.lock().map(|v| *v).unwrap_or(true)
}

impl OnlineTrainer {
    /// Constructs a trainer.
    pub fn build(config: OnlineTrainerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            cycles: 0,
        })
    }

    /// The number of training cycles of the generative model so far.
    pub fn cycles(&self) -> usize {
        self.cycles
    }

    /// Configuration.
    pub fn config(&self) -> &OnlineTrainerConfig {
        &self.config
    }

    /// Runs a training cycle of the generative model on the rows of `buffer`
    /// and resets the buffer.
    ///
    /// `env_steps` is the number of steps taken, so the step that filled the
    /// buffer has index `env_steps - 1`. If that step was past the exploration
    /// phase, synthetic rows drawn from the model are appended to the real rows
    /// first. Every inner iteration reshuffles the
    /// normalized rows and trains on the first `minibatch_size` of them. The
    /// returned record holds the mean loss of the cycle.
    pub fn train_generative_model<G>(
        &mut self,
        model: &mut G,
        buffer: &mut AccumulationBuffer,
        env_steps: usize,
    ) -> Result<Record>
    where
        G: GenerativeReplay + ?Sized,
    {
        let mut rows = buffer.take();
        let n_real = rows.len();
        if env_steps > self.config.start_timesteps {
            let n_synthetic = self.config.n_synthetic_rows();
            if n_synthetic > 0 {
                let synthetic = model.sample_features(n_synthetic)?;
                rows = rows.concat(&synthetic)?;
            }
        }
        let rows = model.normalize(&rows)?;

        let n_iters = self.config.n_inner_iters;
        let batch_size = self.config.minibatch_size.min(rows.len());
        let mut ixs: Vec<usize> = (0..rows.len()).collect();
        let mut loss_sum = 0f32;

        for _ in 0..n_iters {
            ixs.shuffle(&mut self.rng);
            let batch = rows.select(&ixs[..batch_size]);
            let loss = model.train_step(&batch)?;
            if !loss.is_finite() {
                return Err(GenrepError::NonFiniteLoss {
                    loss,
                    cycle: self.cycles,
                }
                .into());
            }
            loss_sum += loss;
        }

        self.cycles += 1;
        let loss = loss_sum / n_iters as f32;
        trace!(
            "Cycle {}: {} real rows, {} synthetic rows",
            self.cycles,
            n_real,
            rows.len() - n_real
        );
        info!("Generative model loss: {:.5} (cycle {})", loss, self.cycles);

        if self.cycles % self.config.save_cadence == 0 {
            self.save_model(model);
        }

        Ok(Record::from_slice(&[
            (STEP_KEY, RecordValue::Step(env_steps)),
            (GENERATIVE_LOSS_KEY, Scalar(loss)),
        ]))
    }

    fn checkpoint_key<G: GenerativeReplay + ?Sized>(&self, model: &G) -> Option<CheckpointKey> {
        self.config.model_dir.as_ref().map(|dir| {
            CheckpointKey::new(dir, &self.config.run_id, &self.config.env_name, model.tag())
        })
    }

    fn save_model<G: GenerativeReplay + ?Sized>(&self, model: &G) {
        let key = match self.checkpoint_key(model) {
            Some(key) => key,
            None => return,
        };
        let result = std::fs::create_dir_all(key.dir())
            .map_err(anyhow::Error::from)
            .and_then(|_| model.save(&key));
        match result {
            Ok(()) => info!("Saved the generative model in {:?}", key.model_path()),
            Err(e) => warn!(
                "Failed to save the generative model in {:?}: {}",
                key.model_path(),
                e
            ),
        }
    }

    fn save_agent<A: Agent>(&self, agent: &A) {
        let dir = match self.config.policy_dir.as_ref() {
            Some(dir) => Path::new(dir).join(format!(
                "{}_{}",
                self.config.run_id, self.config.env_name
            )),
            None => return,
        };
        match agent.save_params(&dir) {
            Ok(()) => info!("Saved the agent in {:?}", &dir),
            Err(e) => warn!("Failed to save the agent in {:?}: {}", &dir, e),
        }
    }

    fn evaluate<E, A, D>(&self, agent: &mut A, evaluator: &mut D, env_steps: usize) -> Result<Record>
    where
        E: Env,
        A: Agent,
        D: Evaluator<E>,
    {
        agent.eval();
        let eval_return = evaluator.evaluate(agent)?;
        agent.train();
        Ok(Record::from_slice(&[
            (STEP_KEY, RecordValue::Step(env_steps)),
            (EVAL_RETURN_KEY, Scalar(eval_return)),
        ]))
    }

    /// Train the agent.
    ///
    /// The loop ends after `max_timesteps` environment steps, or at the next
    /// iteration after `stop` is set to `true`. `recorder` is flushed before
    /// returning, also when an error occurred.
    pub fn train<E, A, G, D>(
        &mut self,
        env: &mut E,
        agent: &mut A,
        model: &mut G,
        evaluator: &mut D,
        recorder: &mut dyn Recorder,
        stop: &Arc<Mutex<bool>>,
    ) -> Result<()>
    where
        E: Env,
        A: Agent,
        G: GenerativeReplay,
        D: Evaluator<E>,
    {
        let result = self.train_loop(env, agent, model, evaluator, recorder, stop);
        let flushed = recorder.flush();
        match (result, flushed) {
            (Err(e), Err(e_flush)) => {
                warn!("Failed to flush records: {}", e_flush);
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), flushed) => flushed,
        }
    }

    fn train_loop<E, A, G, D>(
        &mut self,
        env: &mut E,
        agent: &mut A,
        model: &mut G,
        evaluator: &mut D,
        recorder: &mut dyn Recorder,
        stop: &Arc<Mutex<bool>>,
    ) -> Result<()>
    where
        E: Env,
        A: Agent,
        G: GenerativeReplay,
        D: Evaluator<E>,
    {
        let layout = *model.layout();
        let obs_dim = env.observation_space().dim();
        let act_dim = env.action_space().dim();
        if obs_dim != layout.state_dim {
            return Err(
                GenrepError::DimensionMismatch("state".to_string(), layout.state_dim, obs_dim)
                    .into(),
            );
        }
        if act_dim != layout.action_dim {
            return Err(GenrepError::DimensionMismatch(
                "action".to_string(),
                layout.action_dim,
                act_dim,
            )
            .into());
        }

        let mut buffer = AccumulationBuffer::new(self.config.capacity, layout.width());
        let max_episode_steps = env.max_episode_steps();

        agent.train();
        recorder.write(self.evaluate::<E, _, _>(agent, evaluator, 0)?);

        let mut obs = env.reset()?;
        let mut episode_reward = 0f32;
        let mut episode_steps = 0;
        let mut episode_num = 0;

        for t in 0..self.config.max_timesteps {
            if is_stopped(stop) {
                info!("Training stopped at step {}", t);
                break;
            }
            let env_steps = t + 1;
            episode_steps += 1;

            let act = if t < self.config.start_timesteps {
                env.sample_action()
            } else {
                agent.sample(&obs)
            };
            let (step, _) = env.step(&act)?;
            let is_done = step.is_done();
            episode_reward += step.reward;

            let transition = Transition {
                state: obs,
                action: act,
                next_state: step.obs.clone(),
                reward: step.reward,
                done: done_flag(is_done, episode_steps, max_episode_steps),
            };
            buffer.push(&transition.to_row(&layout)?)?;

            if buffer.is_full() {
                let record = self.train_generative_model(model, &mut buffer, env_steps)?;
                recorder.write(record);
            }

            if t >= self.config.start_timesteps {
                let mut record = agent.opt(model)?;
                if !record.is_empty() {
                    record.insert(STEP_KEY, RecordValue::Step(env_steps));
                    recorder.write(record);
                }
            }

            if is_done {
                info!(
                    "Total T: {} Episode Num: {} Episode T: {} Reward: {:.3}",
                    env_steps,
                    episode_num + 1,
                    episode_steps,
                    episode_reward
                );
                recorder.write(Record::from_slice(&[
                    (STEP_KEY, RecordValue::Step(env_steps)),
                    (EPISODE_REWARD_KEY, Scalar(episode_reward)),
                ]));
                obs = env.reset()?;
                episode_reward = 0.0;
                episode_steps = 0;
                episode_num += 1;
            } else {
                obs = step.obs;
            }

            if env_steps % self.config.eval_interval == 0 {
                recorder.write(self.evaluate::<E, _, _>(agent, evaluator, env_steps)?);
                self.save_agent(agent);
            }
        }

        Ok(())
    }
}
