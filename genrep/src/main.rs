use anyhow::Result;
use clap::{Parser, ValueEnum};
use genrep::{run, RunConfig, UniformAgentConfig};
use genrep_candle::{rbm::RbmConfig, vae::VaeConfig, GenerativeModelConfig};
use genrep_core::OnlineTrainerConfig;
use genrep_pendulum_env::PendulumEnvConfig;
use log::info;
use std::sync::{Arc, Mutex};

const MODEL_DIR: &str = "./models/GR";
const POLICY_DIR: &str = "./models";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Model {
    Rbm,
    Vae,
}

/// Train a policy consumer with online generative replay on the pendulum
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Generative model of transitions
    #[arg(long, value_enum, default_value_t = Model::Rbm)]
    model: Model,

    /// Name of the environment, used in file names
    #[arg(long, default_value = "Pendulum-v0")]
    env: String,

    /// Random seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Steps with uniformly random actions before the agent takes over
    #[arg(long, default_value_t = 10_000)]
    start_timesteps: usize,

    /// Evaluation interval in environment steps
    #[arg(long, default_value_t = 5_000)]
    eval_freq: usize,

    /// Number of environment steps
    #[arg(long, default_value_t = 2_000_000)]
    max_timesteps: usize,

    /// Number of real transitions accumulated per generative training cycle
    #[arg(long, default_value_t = 500)]
    vae_batch_size: usize,

    /// Save the generative model every this many training cycles
    #[arg(long, default_value_t = 100)]
    gr_save_freq: usize,

    /// Number of synthetic transitions per agent optimization step
    #[arg(long, default_value_t = 256)]
    batch_size: usize,

    /// Save the generative model and the agent
    #[arg(long, default_value_t = false)]
    save_model: bool,

    /// Restore the generative model of this run id before training,
    /// `default` for the current run id
    #[arg(long)]
    load_model: Option<String>,

    /// Run id used in checkpoint file names, defaults to the current time
    #[arg(long)]
    run_id: Option<String>,

    /// Directory of the generative model checkpoints
    #[arg(long, default_value = MODEL_DIR)]
    model_dir: String,

    /// Directory of the metrics
    #[arg(long, default_value = ".")]
    results_dir: String,

    /// Run configuration in YAML, overrides all other options
    #[arg(long)]
    config: Option<String>,
}

fn run_config(args: &Args) -> Result<RunConfig> {
    if let Some(path) = args.config.as_ref() {
        return RunConfig::load(path);
    }

    let run_id = match args.run_id.as_ref() {
        Some(run_id) => run_id.clone(),
        None => chrono::Local::now().format("%Y%m%d_%H%M%S").to_string(),
    };
    let load_model = args.load_model.as_ref().map(|s| match s.as_str() {
        "default" => run_id.clone(),
        _ => s.clone(),
    });

    let mut trainer = OnlineTrainerConfig::default()
        .max_timesteps(args.max_timesteps)
        .start_timesteps(args.start_timesteps)
        .eval_interval(args.eval_freq)
        .capacity(args.vae_batch_size)
        .save_cadence(args.gr_save_freq)
        .seed(args.seed)
        .run_id(run_id)
        .env_name(args.env.clone());
    if args.save_model || load_model.is_some() {
        trainer = trainer.model_dir(args.model_dir.clone());
    }
    if args.save_model {
        trainer = trainer.policy_dir(POLICY_DIR);
    }

    let model = match args.model {
        Model::Rbm => GenerativeModelConfig::Rbm(RbmConfig::default()),
        Model::Vae => GenerativeModelConfig::Vae(VaeConfig::default()),
    };

    Ok(RunConfig::default()
        .trainer(trainer)
        .model(model)
        .env(PendulumEnvConfig::default())
        .agent(UniformAgentConfig::default().batch_size(args.batch_size))
        .results_dir(args.results_dir.clone())
        .load_model(load_model))
}

/// Sets `stop` on ctrl-c.
fn spawn_interrupt_handler(stop: Arc<Mutex<bool>>) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    std::thread::spawn(move || {
        rt.block_on(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, stopping after the current step");
                if let Ok(mut s) = stop.lock() {
                    *s = true;
                }
            }
        })
    });
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = run_config(&args)?;

    let stop = Arc::new(Mutex::new(false));
    spawn_interrupt_handler(stop.clone())?;
    run(&config, &stop)?;

    Ok(())
}
