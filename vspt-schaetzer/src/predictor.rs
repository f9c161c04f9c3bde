//! The delay predictor: training, prediction and artifact handling.

use log::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use serde_derive::{Serialize, Deserialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use vspt_rechner::types::TrackingRecord;

use crate::errors::{Result, SchaetzerError};
use crate::features::FeatureEncoder;
use crate::forest::{Forest, SEED};

/// Fraction of rows held out for the test-side R² score.
const TEST_FRACTION: f64 = 0.2;

/// Training scores, for logging and operator feedback only. A low R²
/// never blocks training.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct TrainingReport {
    pub train_r2: f64,
    pub test_r2: f64,
    pub n_train: usize,
    pub n_test: usize
}

/// The full persisted model state: forest, both encoders, trained flag.
/// Saved and loaded only as one unit.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
struct Artifact {
    forest: Forest,
    encoder: FeatureEncoder,
    is_trained: bool
}

/// Predicts expected delay minutes for tracking records.
///
/// Starts untrained; `train` fits and persists the artifact, `predict`
/// lazily loads a previously persisted one. The in-memory state has no
/// internal locking - concurrent `train` calls must be serialized by
/// the caller.
pub struct DelayPredictor {
    state: Artifact,
    model_path: PathBuf
}
impl DelayPredictor {
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            state: Artifact::default(),
            model_path: model_path.into()
        }
    }
    pub fn is_trained(&self) -> bool {
        self.state.is_trained
    }
    /// Fits the encoders and forest on `records` (seeded 80/20 split),
    /// logs train/test R², persists the artifact and marks the
    /// predictor trained.
    ///
    /// This is the one loud operation in the crate: empty input is an
    /// `InsufficientData` error, and a failed artifact save is
    /// propagated, since training is an explicit operator action.
    pub fn train(&mut self, records: &[TrackingRecord]) -> Result<TrainingReport> {
        if records.is_empty() {
            return Err(SchaetzerError::InsufficientData);
        }
        info!("training on {} records", records.len());
        let (matrix, labels) = self.state.encoder.fit_transform(records);
        let mut idx: Vec<usize> = (0..matrix.len()).collect();
        idx.shuffle(&mut StdRng::seed_from_u64(SEED));
        let n_test = (matrix.len() as f64 * TEST_FRACTION) as usize;
        let (test_idx, train_idx) = idx.split_at(n_test);
        let pick = |ids: &[usize]| -> (Vec<Vec<f64>>, Vec<f64>) {
            (ids.iter().map(|&i| matrix[i].clone()).collect(),
             ids.iter().map(|&i| labels[i]).collect())
        };
        let (train_x, train_y) = pick(train_idx);
        let (test_x, test_y) = pick(test_idx);
        self.state.forest = Forest::default();
        self.state.forest.fit(&train_x, &train_y);
        let report = TrainingReport {
            train_r2: r_squared(&self.state.forest.predict(&train_x), &train_y),
            test_r2: r_squared(&self.state.forest.predict(&test_x), &test_y),
            n_train: train_x.len(),
            n_test: test_x.len()
        };
        info!("model trained; train R2 {:.3}, test R2 {:.3} ({} train / {} test rows)",
              report.train_r2, report.test_r2, report.n_train, report.n_test);
        self.state.is_trained = true;
        self.save()?;
        Ok(report)
    }
    /// Predicts a delay for every record, in order.
    ///
    /// Always returns exactly one value per input record: an untrained
    /// predictor first tries to load its artifact, and any failure
    /// (no artifact, unseen category, bad row) degrades to zeros with a
    /// warning instead of surfacing an error.
    pub fn predict(&mut self, records: &[TrackingRecord]) -> Vec<i64> {
        if !self.state.is_trained {
            if let Err(e) = self.load() {
                warn!("no usable model artifact ({}); predicting zeros", e);
                return vec![0; records.len()];
            }
        }
        match self.state.encoder.transform(records) {
            Ok(matrix) => {
                self.state.forest.predict(&matrix)
                    .into_iter()
                    .map(|p| p.round() as i64)
                    .collect()
            },
            Err(e) => {
                warn!("encoding failed ({}); predicting zeros", e);
                vec![0; records.len()]
            }
        }
    }
    /// Serializes the whole artifact atomically: written to a temp file
    /// next to the target, then renamed into place, so a partial
    /// artifact is never observed.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.model_path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let tmp = self.model_path.with_extension("tmp");
        let file = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer(file, &self.state)?;
        fs::rename(&tmp, &self.model_path)?;
        info!("model artifact saved to {}", self.model_path.display());
        Ok(())
    }
    /// Restores the artifact from disk. On any failure the predictor is
    /// left (or put back) in the untrained state.
    pub fn load(&mut self) -> Result<()> {
        let res = Self::read_artifact(&self.model_path);
        match res {
            Ok(state) => {
                self.state = state;
                info!("model artifact loaded from {}", self.model_path.display());
                Ok(())
            },
            Err(e) => {
                self.state.is_trained = false;
                Err(e)
            }
        }
    }
    fn read_artifact(path: &Path) -> Result<Artifact> {
        let file = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(file)?)
    }
}

/// Coefficient of determination. A constant actual vector scores 1.0
/// on a perfect fit and 0.0 otherwise.
fn r_squared(predicted: &[f64], actual: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|y| (y - mean) * (y - mean)).sum();
    let ss_res: f64 = predicted.iter().zip(actual)
        .map(|(p, y)| (y - p) * (y - p))
        .sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
