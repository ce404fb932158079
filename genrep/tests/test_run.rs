use anyhow::Result;
use genrep::{run, RunConfig, UniformAgentConfig};
use genrep_candle::{rbm::RbmConfig, vae::VaeConfig, GenerativeModelConfig};
use genrep_core::OnlineTrainerConfig;
use genrep_pendulum_env::PendulumEnvConfig;
use std::{
    fs,
    path::Path,
    sync::{Arc, Mutex},
};
use tempdir::TempDir;

fn run_config(dir: &Path, model: GenerativeModelConfig) -> RunConfig {
    let trainer = OnlineTrainerConfig::default()
        .max_timesteps(300)
        .start_timesteps(100)
        .eval_interval(100)
        .n_eval_episodes(1)
        .capacity(50)
        .save_cadence(2)
        .n_inner_iters(2)
        .minibatch_size(16)
        .seed(1)
        .model_dir(dir.join("GR").to_string_lossy())
        .policy_dir(dir.join("policy").to_string_lossy())
        .run_id("test")
        .env_name("Pendulum-v0");

    RunConfig::default()
        .trainer(trainer)
        .model(model)
        .env(PendulumEnvConfig::default().max_episode_steps(50))
        .agent(UniformAgentConfig::default().batch_size(8))
        .results_dir(dir.join("results").to_string_lossy())
}

/// Number of data rows of a CSV file with a header.
fn n_rows(path: impl AsRef<Path>) -> Result<usize> {
    let text = fs::read_to_string(path)?;
    Ok(text.lines().count().saturating_sub(1))
}

fn check_outputs(dir: &Path, tag: &str) -> Result<()> {
    let results = dir.join("results");
    let lower = tag.to_lowercase();
    assert_eq!(n_rows(results.join(format!("avg_reward_{}_online.csv", lower)))?, 4);
    assert_eq!(n_rows(results.join(format!("rewards_{}_online.csv", lower)))?, 6);
    assert_eq!(n_rows(results.join(format!("{}_loss_online.csv", lower)))?, 6);

    let models = dir.join("GR");
    assert!(models
        .join(format!("test_Pendulum-v0_{}.safetensors", tag))
        .exists());
    assert!(models
        .join(format!("test_Pendulum-v0_{}_optimizer.safetensors", tag))
        .exists());
    assert!(dir
        .join("policy")
        .join("test_Pendulum-v0")
        .join("uniform_agent.yaml")
        .exists());
    Ok(())
}

#[test]
fn test_rbm_run() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new("genrep_rbm_run")?;
    let config = run_config(dir.path(), GenerativeModelConfig::Rbm(RbmConfig::default()));
    let stop = Arc::new(Mutex::new(false));

    run(&config, &stop)?;
    check_outputs(dir.path(), "RBM")?;

    // Restore the checkpoint and evaluate once
    let mut config = config.load_model(Some("test".to_string()));
    config.trainer = config.trainer.max_timesteps(0).run_id("restored");
    run(&config, &stop)?;

    let config = config.load_model(Some("missing".to_string()));
    assert!(run(&config, &stop).is_err());
    Ok(())
}

#[test]
fn test_vae_run() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new("genrep_vae_run")?;
    let config = run_config(dir.path(), GenerativeModelConfig::Vae(VaeConfig::default()));
    let stop = Arc::new(Mutex::new(false));

    run(&config, &stop)?;
    check_outputs(dir.path(), "VAE")?;
    Ok(())
}

#[test]
fn test_stopped_run_writes_metrics() -> Result<()> {
    let dir = TempDir::new("genrep_stopped_run")?;
    let config = run_config(dir.path(), GenerativeModelConfig::Rbm(RbmConfig::default()));
    let stop = Arc::new(Mutex::new(true));

    run(&config, &stop)?;

    // Only the evaluation before the first step
    let results = dir.path().join("results");
    assert_eq!(n_rows(results.join("avg_reward_rbm_online.csv"))?, 1);
    assert!(!dir.path().join("GR").exists());
    Ok(())
}
