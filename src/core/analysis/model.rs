use crate::core::data::{encode_feature, encode_labels, Column, Table};
use crate::error::{AnalysisError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::path::Path;
use tracing::{debug, info};

/// Targets with at most this many distinct values are classified.
pub const CLASSIFICATION_MAX_DISTINCT: usize = 10;
pub const TEST_FRACTION: f64 = 0.2;
pub const SPLIT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Classification,
    Regression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Accuracy,
    Rmse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    pub model_type: TaskKind,
    pub metric: Metric,
    pub score: f64,
}

/// Row indices of a held-out split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldOutSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl HeldOutSplit {
    /// Shuffle `0..n_rows` with a seeded RNG and hold out `ceil(n * fraction)` rows.
    pub fn new(n_rows: usize, test_fraction: f64, seed: u64) -> Result<Self> {
        let n_test = (n_rows as f64 * test_fraction).ceil() as usize;
        if n_test == 0 || n_test >= n_rows {
            return Err(AnalysisError::invalid_argument(format!(
                "Not enough rows to split for training and testing ({} usable rows).",
                n_rows
            )));
        }

        let mut rows: Vec<usize> = (0..n_rows).collect();
        rows.shuffle(&mut StdRng::seed_from_u64(seed));
        let train = rows.split_off(n_test);
        Ok(Self { train, test: rows })
    }
}

pub fn model(csv_path: impl AsRef<Path>, x_columns: &[String], y_column: &str) -> Result<ModelReport> {
    let table = Table::from_csv_path(csv_path)?;
    train_and_evaluate(&table, x_columns, y_column)
}

/// Classification for text targets or targets with few distinct values.
pub fn decide_task(target: &Column, rows: &[usize]) -> TaskKind {
    if !target.is_numeric() || target.distinct_count(rows) <= CLASSIFICATION_MAX_DISTINCT {
        TaskKind::Classification
    } else {
        TaskKind::Regression
    }
}

pub fn train_and_evaluate(table: &Table, x_columns: &[String], y_column: &str) -> Result<ModelReport> {
    if x_columns.is_empty() {
        return Err(AnalysisError::invalid_argument(
            "x_columns must name at least one feature column.",
        ));
    }
    table.require_columns(x_columns.iter().map(String::as_str).chain([y_column]))?;

    let features = x_columns
        .iter()
        .map(|name| table.column(name))
        .collect::<Result<Vec<_>>>()?;
    let target = table.column(y_column)?;

    let rows: Vec<usize> = (0..table.n_rows())
        .filter(|&row| !target.is_missing(row) && features.iter().all(|c| !c.is_missing(row)))
        .collect();
    let split = HeldOutSplit::new(rows.len(), TEST_FRACTION, SPLIT_SEED)?;

    let encoded: Vec<Vec<f64>> = features.iter().map(|c| encode_feature(c, &rows)).collect();
    let matrix_rows: Vec<Vec<f64>> = (0..rows.len())
        .map(|i| encoded.iter().map(|feature| feature[i]).collect())
        .collect();

    let x_train = to_matrix(&matrix_rows, &split.train)?;
    let x_test = to_matrix(&matrix_rows, &split.test)?;

    let task = decide_task(target, &rows);
    debug!(
        "Training {:?} on {} rows ({} train / {} test), {} features",
        task,
        rows.len(),
        split.train.len(),
        split.test.len(),
        x_columns.len()
    );

    let report = match task {
        TaskKind::Classification => {
            let labels = encode_labels(target, &rows);
            let y_train = pick(&labels, &split.train);
            let y_test = pick(&labels, &split.test);

            let predicted = match single_class(&y_train) {
                // A forest needs two classes; one class predicts itself everywhere
                Some(class) => {
                    debug!("Training labels hold a single class; predicting it for every row");
                    vec![class; y_test.len()]
                }
                None => {
                    let params = RandomForestClassifierParameters::default().with_seed(SPLIT_SEED);
                    let forest: RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>> =
                        RandomForestClassifier::fit(&x_train, &y_train, params)
                            .map_err(model_error)?;
                    forest.predict(&x_test).map_err(model_error)?
                }
            };

            ModelReport {
                model_type: TaskKind::Classification,
                metric: Metric::Accuracy,
                score: accuracy(&y_test, &predicted),
            }
        }
        TaskKind::Regression => {
            let values: Vec<f64> = rows.iter().filter_map(|&row| numeric_at(target, row)).collect();
            let y_train = pick(&values, &split.train);
            let y_test = pick(&values, &split.test);

            let params = RandomForestRegressorParameters::default().with_seed(SPLIT_SEED);
            let forest: RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>> =
                RandomForestRegressor::fit(&x_train, &y_train, params).map_err(model_error)?;
            let predicted = forest.predict(&x_test).map_err(model_error)?;

            ModelReport {
                model_type: TaskKind::Regression,
                metric: Metric::Rmse,
                score: rmse(&y_test, &predicted),
            }
        }
    };

    info!(
        "Trained {:?} model for '{}': {:?} = {}",
        report.model_type, y_column, report.metric, report.score
    );
    Ok(report)
}

/// Fraction of exact matches.
pub fn accuracy(expected: &[u32], predicted: &[u32]) -> f64 {
    if expected.is_empty() {
        return 0.0;
    }
    let hits = expected.iter().zip(predicted).filter(|(a, b)| a == b).count();
    hits as f64 / expected.len() as f64
}

pub fn rmse(expected: &[f64], predicted: &[f64]) -> f64 {
    if expected.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = expected
        .iter()
        .zip(predicted)
        .map(|(a, b)| (a - b).powi(2))
        .sum();
    (sum_sq / expected.len() as f64).sqrt()
}

/// The only label present, if every training label is the same.
fn single_class(labels: &[u32]) -> Option<u32> {
    let first = *labels.first()?;
    labels.iter().all(|&label| label == first).then_some(first)
}

fn numeric_at(column: &Column, row: usize) -> Option<f64> {
    match column {
        Column::Numeric(values) => values[row],
        Column::Text(_) => None,
    }
}

fn pick<T: Copy>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| values[i]).collect()
}

fn to_matrix(rows: &[Vec<f64>], indices: &[usize]) -> Result<DenseMatrix<f64>> {
    let selected: Vec<Vec<f64>> = indices.iter().map(|&i| rows[i].clone()).collect();
    DenseMatrix::from_2d_vec(&selected).map_err(model_error)
}

fn model_error<E: std::fmt::Display>(err: E) -> AnalysisError {
    AnalysisError::Model(err.to_string())
}
