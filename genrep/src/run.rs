//! Wiring of a training run.
use crate::{UniformAgent, UniformAgentConfig};
use anyhow::Result;
use genrep_candle::{GenerativeModel, GenerativeModelConfig};
use genrep_core::{
    error::GenrepError, record::MetricsRecorder, Bounds, CheckpointKey, Configurable,
    DefaultEvaluator, Env, GenerativeReplay, OnlineTrainer, OnlineTrainerConfig,
};
use genrep_pendulum_env::{PendulumEnv, PendulumEnvConfig};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
    sync::{Arc, Mutex},
};

/// Offset added to the seed of the training environment to seed the
/// evaluation environment.
pub const EVAL_SEED_OFFSET: i64 = 100;

/// Configuration of a training run.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Configuration of the training loop.
    pub trainer: OnlineTrainerConfig,

    /// Configuration of the generative model.
    pub model: GenerativeModelConfig,

    /// Configuration of the environment.
    pub env: PendulumEnvConfig,

    /// Configuration of the agent. The action bounds are taken from the
    /// environment.
    pub agent: UniformAgentConfig,

    /// Directory of the CSV files of the metrics.
    pub results_dir: String,

    /// Run id of a checkpoint in `trainer.model_dir` restored before training.
    pub load_model: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            trainer: OnlineTrainerConfig::default(),
            model: GenerativeModelConfig::default(),
            env: PendulumEnvConfig::default(),
            agent: UniformAgentConfig::default(),
            results_dir: ".".to_string(),
            load_model: None,
        }
    }
}

impl RunConfig {
    /// Sets the configuration of the training loop.
    pub fn trainer(mut self, v: OnlineTrainerConfig) -> Self {
        self.trainer = v;
        self
    }

    /// Sets the configuration of the generative model.
    pub fn model(mut self, v: GenerativeModelConfig) -> Self {
        self.model = v;
        self
    }

    /// Sets the configuration of the environment.
    pub fn env(mut self, v: PendulumEnvConfig) -> Self {
        self.env = v;
        self
    }

    /// Sets the configuration of the agent.
    pub fn agent(mut self, v: UniformAgentConfig) -> Self {
        self.agent = v;
        self
    }

    /// Sets the directory of the metrics.
    pub fn results_dir(mut self, v: impl Into<String>) -> Self {
        self.results_dir = v.into();
        self
    }

    /// Sets the run id of the checkpoint to restore.
    pub fn load_model(mut self, v: Option<String>) -> Self {
        self.load_model = v;
        self
    }

    /// Constructs [`RunConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`RunConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

fn restore_model(config: &RunConfig, model: &mut GenerativeModel, run_id: &str) -> Result<()> {
    let dir = config.trainer.model_dir.as_ref().ok_or_else(|| {
        GenrepError::InvalidConfig("load_model requires model_dir".to_string())
    })?;
    let key = CheckpointKey::new(dir, run_id, &config.trainer.env_name, model.tag());
    model.load(&key)?;
    info!("Loaded the generative model from {:?}", key.model_path());
    Ok(())
}

/// Builds the environments, the generative model and the agent, then trains
/// until `max_timesteps` steps are done or `stop` is set.
///
/// The metrics are written to `results_dir` also when training fails.
pub fn run(config: &RunConfig, stop: &Arc<Mutex<bool>>) -> Result<()> {
    let seed = config.trainer.seed as i64;
    let mut env = PendulumEnv::build(&config.env, seed)?;
    let mut evaluator = DefaultEvaluator::<PendulumEnv>::new(
        &config.env,
        seed + EVAL_SEED_OFFSET,
        config.trainer.n_eval_episodes,
    )?;

    let bounds = Bounds::from_spaces(env.observation_space(), env.action_space())?;
    let mut model = GenerativeModel::build(config.model.clone(), &bounds)?;
    if let Some(run_id) = config.load_model.as_ref() {
        restore_model(config, &mut model, run_id)?;
    }

    let act_space = env.action_space();
    let agent_config = config
        .agent
        .clone()
        .low(act_space.low.clone())
        .high(act_space.high.clone())
        .seed(config.trainer.seed);
    let mut agent = UniformAgent::build(agent_config);

    std::fs::create_dir_all(&config.results_dir)?;
    let mut recorder = MetricsRecorder::new(&config.results_dir, model.tag());

    info!("---------------------------------------");
    info!(
        "Model: {}, Env: {}, Seed: {}",
        model.tag(),
        config.trainer.env_name,
        config.trainer.seed
    );
    info!("---------------------------------------");

    let mut trainer = OnlineTrainer::build(config.trainer.clone())?;
    trainer.train(
        &mut env,
        &mut agent,
        &mut model,
        &mut evaluator,
        &mut recorder,
        stop,
    )
}
