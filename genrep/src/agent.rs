//! A policy consumer that acts uniformly at random.
use anyhow::Result;
use candle_core::Device;
use genrep_candle::util::TransitionTensors;
use genrep_core::{
    error::GenrepError,
    record::{Record, RecordValue},
    Agent, Configurable, Policy, TransitionSampler,
};
use log::trace;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

const PARAMS_FILE: &str = "uniform_agent.yaml";

/// Configuration of [`UniformAgent`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UniformAgentConfig {
    /// Lower bound of the action.
    pub low: Vec<f32>,

    /// Upper bound of the action.
    pub high: Vec<f32>,

    /// Number of synthetic transitions drawn per optimization step.
    pub batch_size: usize,

    /// Random seed.
    pub seed: u64,
}

impl Default for UniformAgentConfig {
    fn default() -> Self {
        Self {
            low: vec![-2.0],
            high: vec![2.0],
            batch_size: 256,
            seed: 0,
        }
    }
}

impl UniformAgentConfig {
    /// Sets the lower bound of the action.
    pub fn low(mut self, v: Vec<f32>) -> Self {
        self.low = v;
        self
    }

    /// Sets the upper bound of the action.
    pub fn high(mut self, v: Vec<f32>) -> Self {
        self.high = v;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`UniformAgentConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`UniformAgentConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Samples actions uniformly from a box and consumes synthetic batches from
/// the generative replay engine.
///
/// It has no parameters to learn. Each optimization step draws a batch of
/// synthetic transitions, moves it onto the device as [`TransitionTensors`]
/// and reports statistics of the batch, which shows what the generative
/// model produces.
pub struct UniformAgent {
    config: UniformAgentConfig,
    rng: fastrand::Rng,
    device: Device,
    train: bool,
    n_opts: usize,
}

impl UniformAgent {
    /// The number of optimization steps performed so far.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    fn check_batch(&self, tensors: &TransitionTensors) -> Result<()> {
        let n = tensors.len()?;
        if n != self.config.batch_size {
            return Err(
                GenrepError::DimensionMismatch("batch".to_string(), self.config.batch_size, n)
                    .into(),
            );
        }
        Ok(())
    }
}

impl Configurable for UniformAgent {
    type Config = UniformAgentConfig;

    fn build(config: Self::Config) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(config.seed),
            config,
            device: Device::Cpu,
            train: false,
            n_opts: 0,
        }
    }
}

impl Policy for UniformAgent {
    fn sample(&mut self, _obs: &[f32]) -> Vec<f32> {
        self.config
            .low
            .iter()
            .zip(self.config.high.iter())
            .map(|(&lo, &hi)| lo + (hi - lo) * self.rng.f32())
            .collect()
    }
}

impl Agent for UniformAgent {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt(&mut self, replay: &mut dyn TransitionSampler) -> Result<Record> {
        let batch = replay.sample(self.config.batch_size)?;
        let tensors = TransitionTensors::from_batch(batch, &self.device)?;
        self.check_batch(&tensors)?;

        let reward_mean = tensors.reward.mean_all()?.to_scalar::<f32>()?;
        let done_frac = tensors.done.mean_all()?.to_scalar::<f32>()?;
        self.n_opts += 1;
        trace!(
            "Opt {}: synthetic reward {:.3}, done {:.3}",
            self.n_opts,
            reward_mean,
            done_frac
        );

        Ok(Record::from_slice(&[
            ("synthetic_reward_mean", RecordValue::Scalar(reward_mean)),
            ("synthetic_done_frac", RecordValue::Scalar(done_frac)),
        ]))
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)?;
        self.config.save(path.join(PARAMS_FILE))
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.config = UniformAgentConfig::load(path.join(PARAMS_FILE))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use genrep_core::{FeatureBatch, TransitionBatch, TransitionLayout};
    use tempdir::TempDir;

    /// Hands out rows with reward `-1` and every other row done.
    struct FixedSampler;

    impl TransitionSampler for FixedSampler {
        fn sample(&mut self, batch_size: usize) -> Result<TransitionBatch> {
            let layout = TransitionLayout::new(3, 1);
            let mut data = vec![];
            for i in 0..batch_size {
                let mut row = vec![0f32; layout.width()];
                row[layout.reward_col()] = -1.0;
                row[layout.done_col()] = (i % 2) as f32;
                data.extend(row);
            }
            TransitionBatch::from_features(&FeatureBatch::from_vec(data, layout.width())?, &layout)
        }
    }

    #[test]
    fn test_sample_within_bounds() {
        let config = UniformAgentConfig::default()
            .low(vec![-2.0, 0.0])
            .high(vec![2.0, 0.5])
            .seed(3);
        let mut agent = UniformAgent::build(config);
        for _ in 0..100 {
            let act = agent.sample(&[0.0, 0.0, 0.0]);
            assert_eq!(act.len(), 2);
            assert!(act[0] >= -2.0 && act[0] <= 2.0);
            assert!(act[1] >= 0.0 && act[1] <= 0.5);
        }
    }

    #[test]
    fn test_opt() -> Result<()> {
        let mut agent = UniformAgent::build(UniformAgentConfig::default().batch_size(8));
        let record = agent.opt(&mut FixedSampler)?;
        assert_eq!(record.get_scalar("synthetic_reward_mean")?, -1.0);
        assert_eq!(record.get_scalar("synthetic_done_frac")?, 0.5);
        assert_eq!(agent.n_opts(), 1);
        Ok(())
    }

    #[test]
    fn test_mode() {
        let mut agent = UniformAgent::build(UniformAgentConfig::default());
        agent.train();
        assert!(agent.is_train());
        agent.eval();
        assert!(!agent.is_train());
    }

    #[test]
    fn test_save_load_params() -> Result<()> {
        let dir = TempDir::new("uniform_agent")?;
        let config = UniformAgentConfig::default().batch_size(32).seed(9);
        let agent = UniformAgent::build(config.clone());
        agent.save_params(&dir.path().join("agent"))?;

        let mut agent = UniformAgent::build(UniformAgentConfig::default());
        agent.load_params(&dir.path().join("agent"))?;
        assert_eq!(agent.config, config);
        Ok(())
    }
}
