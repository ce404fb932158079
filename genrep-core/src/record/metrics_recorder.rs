use super::{
    Record, RecordValue, Recorder, EPISODE_REWARD_KEY, EVAL_RETURN_KEY, GENERATIVE_LOSS_KEY,
    STEP_KEY,
};
use anyhow::Result;
use log::{info, trace};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Time series kept by [`MetricsRecorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    /// Average return of an evaluation run.
    EvalReturn,

    /// Cumulative reward of a training episode.
    EpisodeReward,

    /// Mean loss of a generative model training cycle.
    GenerativeLoss,
}

impl Series {
    fn key(&self) -> &'static str {
        match self {
            Self::EvalReturn => EVAL_RETURN_KEY,
            Self::EpisodeReward => EPISODE_REWARD_KEY,
            Self::GenerativeLoss => GENERATIVE_LOSS_KEY,
        }
    }

    const ALL: [Series; 3] = [
        Series::EvalReturn,
        Series::EpisodeReward,
        Series::GenerativeLoss,
    ];
}

#[derive(Serialize)]
struct Row {
    step: usize,
    value: f32,
}

/// Collects `(step, value)` rows of the three training series and writes
/// them as CSV files on [`Recorder::flush`].
///
/// Records are routed by key: a record containing [`EVAL_RETURN_KEY`],
/// [`EPISODE_REWARD_KEY`] or [`GENERATIVE_LOSS_KEY`] adds a row to the
/// corresponding series, indexed by the [`RecordValue::Step`] under
/// [`STEP_KEY`]. Other keys are ignored.
///
/// File names follow the pattern `avg_reward_{tag}_online.csv`,
/// `rewards_{tag}_online.csv` and `{tag}_loss_online.csv`, where `tag` is the
/// lowercase tag of the generative model.
pub struct MetricsRecorder {
    dir: PathBuf,
    tag: String,
    eval_return: Vec<(usize, f32)>,
    episode_reward: Vec<(usize, f32)>,
    generative_loss: Vec<(usize, f32)>,
}

impl MetricsRecorder {
    /// Constructs a recorder writing into `dir`.
    pub fn new(dir: impl AsRef<Path>, tag: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            tag: tag.to_lowercase(),
            eval_return: vec![],
            episode_reward: vec![],
            generative_loss: vec![],
        }
    }

    /// Appends a row to a series.
    pub fn push(&mut self, series: Series, step: usize, value: f32) {
        self.series_mut(series).push((step, value));
    }

    /// Rows of a series.
    pub fn series(&self, series: Series) -> &[(usize, f32)] {
        match series {
            Series::EvalReturn => &self.eval_return,
            Series::EpisodeReward => &self.episode_reward,
            Series::GenerativeLoss => &self.generative_loss,
        }
    }

    fn series_mut(&mut self, series: Series) -> &mut Vec<(usize, f32)> {
        match series {
            Series::EvalReturn => &mut self.eval_return,
            Series::EpisodeReward => &mut self.episode_reward,
            Series::GenerativeLoss => &mut self.generative_loss,
        }
    }

    /// Path of the CSV file of a series.
    pub fn path(&self, series: Series) -> PathBuf {
        let name = match series {
            Series::EvalReturn => format!("avg_reward_{}_online.csv", self.tag),
            Series::EpisodeReward => format!("rewards_{}_online.csv", self.tag),
            Series::GenerativeLoss => format!("{}_loss_online.csv", self.tag),
        };
        self.dir.join(name)
    }

    fn write_csv(&self, series: Series) -> Result<()> {
        let path = self.path(series);
        let mut wtr = csv::Writer::from_path(&path)?;
        for &(step, value) in self.series(series).iter() {
            wtr.serialize(Row { step, value })?;
        }
        wtr.flush()?;
        trace!("Wrote {} rows to {:?}", self.series(series).len(), &path);
        Ok(())
    }
}

impl Recorder for MetricsRecorder {
    fn write(&mut self, record: Record) {
        let step = match record.get(STEP_KEY) {
            Some(RecordValue::Step(v)) => *v,
            _ => return,
        };

        for series in Series::ALL.iter() {
            if let Some(RecordValue::Scalar(v)) = record.get(series.key()) {
                self.push(*series, step, *v);
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        for series in Series::ALL.iter() {
            self.write_csv(*series)?;
        }
        info!("Saved metrics in {:?}", &self.dir);
        Ok(())
    }
}
