//! A small bagged ensemble of regression trees.
//!
//! Chosen for robustness to weak, integer-encoded categorical features
//! without per-dataset tuning. Anything honoring the same `fit`/`predict`
//! contract could stand in for it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_derive::{Serialize, Deserialize};

/// Default number of trees in the ensemble.
pub const N_TREES: usize = 100;
/// Default depth cap per tree.
pub const MAX_DEPTH: usize = 8;
/// Fraction of the training set drawn (with replacement) per tree.
pub const SAMPLE_RATIO: f64 = 0.8;
/// Fixed seed, for reproducible training runs.
pub const SEED: u64 = 42;

const MIN_SPLIT: usize = 2;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
enum Node {
    Leaf { value: f64 },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>
    }
}

fn mean(labels: &[f64]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    labels.iter().sum::<f64>() / labels.len() as f64
}

fn sum_squared_error(labels: &[f64]) -> f64 {
    let m = mean(labels);
    labels.iter().map(|y| (y - m) * (y - m)).sum()
}

/// One depth-limited regression tree, splitting on squared-error
/// reduction with mean-label leaves.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RegressionTree {
    root: Node
}
impl RegressionTree {
    fn fit(rows: &[Vec<f64>], labels: &[f64], max_depth: usize) -> Self {
        let idx: Vec<usize> = (0..rows.len()).collect();
        Self { root: Self::build(rows, labels, &idx, max_depth) }
    }
    fn build(rows: &[Vec<f64>], labels: &[f64], idx: &[usize], depth: usize) -> Node {
        let subset: Vec<f64> = idx.iter().map(|&i| labels[i]).collect();
        if depth == 0 || idx.len() < MIN_SPLIT * 2 || sum_squared_error(&subset) == 0.0 {
            return Node::Leaf { value: mean(&subset) };
        }
        let base_err = sum_squared_error(&subset);
        let n_features = rows[idx[0]].len();
        let mut best: Option<(usize, f64, f64)> = None;
        for feature in 0..n_features {
            let mut values: Vec<f64> = idx.iter().map(|&i| rows[i][feature]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            values.dedup();
            for pair in values.windows(2) {
                let threshold = (pair[0] + pair[1]) / 2.0;
                let (l, r): (Vec<(f64, f64)>, Vec<(f64, f64)>) = idx.iter()
                    .map(|&i| (rows[i][feature], labels[i]))
                    .partition(|&(v, _)| v <= threshold);
                // strip the (value, label) tuples back down to labels
                let l: Vec<f64> = l.into_iter().map(|(_, y)| y).collect();
                let r: Vec<f64> = r.into_iter().map(|(_, y)| y).collect();
                if l.len() < MIN_SPLIT || r.len() < MIN_SPLIT {
                    continue;
                }
                let err = sum_squared_error(&l) + sum_squared_error(&r);
                if err < base_err && best.as_ref().map(|b| err < b.2).unwrap_or(true) {
                    best = Some((feature, threshold, err));
                }
            }
        }
        let (feature, threshold, _) = match best {
            Some(b) => b,
            None => return Node::Leaf { value: mean(&subset) }
        };
        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = idx.iter()
            .copied()
            .partition(|&i| rows[i][feature] <= threshold);
        Node::Split {
            feature,
            threshold,
            left: Box::new(Self::build(rows, labels, &left_idx, depth - 1)),
            right: Box::new(Self::build(rows, labels, &right_idx, depth - 1))
        }
    }
    fn predict_one(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    node = if row.get(*feature).copied().unwrap_or(0.0) <= *threshold {
                        left
                    }
                    else {
                        right
                    };
                }
            }
        }
    }
}

/// The bagged ensemble. Each tree trains on a seeded bootstrap sample;
/// prediction is the mean over trees.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Forest {
    trees: Vec<RegressionTree>,
    n_trees: usize,
    max_depth: usize,
    sample_ratio: f64,
    seed: u64,
    fitted: bool
}
impl Forest {
    pub fn new(n_trees: usize, max_depth: usize, seed: u64) -> Self {
        Self {
            trees: Vec::new(),
            n_trees,
            max_depth,
            sample_ratio: SAMPLE_RATIO,
            seed,
            fitted: false
        }
    }
    pub fn fit(&mut self, rows: &[Vec<f64>], labels: &[f64]) {
        if rows.is_empty() {
            return;
        }
        self.trees.clear();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let sample_size = ((rows.len() as f64 * self.sample_ratio) as usize).max(1);
        for _ in 0..self.n_trees {
            let mut boot_rows = Vec::with_capacity(sample_size);
            let mut boot_labels = Vec::with_capacity(sample_size);
            for _ in 0..sample_size {
                let i = rng.gen_range(0..rows.len());
                boot_rows.push(rows[i].clone());
                boot_labels.push(labels[i]);
            }
            self.trees.push(RegressionTree::fit(&boot_rows, &boot_labels, self.max_depth));
        }
        self.fitted = true;
    }
    pub fn predict_one(&self, row: &[f64]) -> f64 {
        if !self.fitted || self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_one(row)).sum();
        sum / self.trees.len() as f64
    }
    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict_one(r)).collect()
    }
    pub fn is_fitted(&self) -> bool {
        self.fitted
    }
}
impl Default for Forest {
    fn default() -> Self {
        Self::new(N_TREES, MAX_DEPTH, SEED)
    }
}
