//! Offline training
//!
//! Fits the four category encoders over the training records, builds the
//! feature matrix in [`FEATURE_NAMES`](crate::features::FEATURE_NAMES) order
//! and fits the configured estimator. Encoders are frozen afterwards: labels
//! that only show up at inference time get the unseen code.

use crate::bundle::{Encoders, ModelBundle};
use crate::encoder::CategoryEncoder;
use crate::estimator::{Estimator, EstimatorKind, MeanBaseline, RentEstimator};
use crate::features::{target_vector, FeatureVector, FEATURE_COUNT};
use crate::forest::{ForestParams, RandomForest};
use crate::linear::LinearRegression;
use crate::listing::HistoricalListing;
use crate::{Error, Result};
use aprender::metrics;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub estimator: EstimatorKind,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Share of records held out for evaluation
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorKind::RandomForest,
            n_estimators: 200,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.test_fraction) {
            return Err(Error::InvalidConfig(format!(
                "test_fraction must be in [0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.estimator == EstimatorKind::RandomForest && self.n_estimators == 0 {
            return Err(Error::InvalidConfig("n_estimators must be at least 1".to_string()));
        }
        if self.min_samples_leaf == 0 {
            return Err(Error::InvalidConfig("min_samples_leaf must be at least 1".to_string()));
        }
        if self.max_depth == Some(0) {
            return Err(Error::InvalidConfig("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }

    fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            random_state: self.seed,
            bootstrap: true,
        }
    }
}

/// Held-out evaluation of a trained model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub mae: f64,
    pub r2: f64,
    pub n_train: usize,
    pub n_test: usize,
}

pub struct TrainingOutcome {
    pub bundle: ModelBundle,
    /// `None` when the test split is empty
    pub evaluation: Option<Evaluation>,
}

pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit encoders and estimator on all `records`.
    pub fn fit(&self, records: &[HistoricalListing]) -> Result<ModelBundle> {
        if records.is_empty() {
            return Err(Error::Training("no training records".to_string()));
        }
        let encoders = fit_encoders(records);
        let estimator = self.fit_estimator(records, &encoders)?;
        Ok(ModelBundle::full(estimator, encoders))
    }

    /// Shuffle with the configured seed, hold out `test_fraction` of the
    /// records, fit on the rest and report MAE / R² on the held-out part.
    ///
    /// Encoders are fitted over every record, so held-out rows never hit the
    /// unseen fallback.
    pub fn fit_and_evaluate(&self, records: &[HistoricalListing]) -> Result<TrainingOutcome> {
        if records.is_empty() {
            return Err(Error::Training("no training records".to_string()));
        }

        let (train_idx, test_idx) = train_test_split(records.len(), self.config.test_fraction, self.config.seed);
        let train: Vec<HistoricalListing> = train_idx.iter().map(|&i| records[i].clone()).collect();

        let encoders = fit_encoders(records);
        let estimator = self.fit_estimator(&train, &encoders)?;

        let evaluation = if test_idx.is_empty() {
            None
        } else {
            let mut predictions = Vec::with_capacity(test_idx.len());
            let mut actual = Vec::with_capacity(test_idx.len());
            for &i in &test_idx {
                let features = FeatureVector::from_record(&records[i], &encoders)?;
                predictions.push(estimator.predict(&features)?);
                actual.push(records[i].price);
            }
            let evaluation = Evaluation {
                mae: mean_absolute_error(&actual, &predictions),
                r2: r_squared(&actual, &predictions),
                n_train: train.len(),
                n_test: test_idx.len(),
            };
            info!(mae = evaluation.mae, r2 = evaluation.r2, n_test = evaluation.n_test, "Held-out evaluation");
            Some(evaluation)
        };

        Ok(TrainingOutcome {
            bundle: ModelBundle::full(estimator, encoders),
            evaluation,
        })
    }

    fn fit_estimator(&self, records: &[HistoricalListing], encoders: &Encoders) -> Result<Estimator> {
        if records.is_empty() {
            return Err(Error::Training("training split is empty".to_string()));
        }

        let rows = records
            .iter()
            .map(|r| FeatureVector::from_record(r, encoders))
            .collect::<Result<Vec<_>>>()?;
        let targets: Vec<f64> = records.iter().map(|r| r.price).collect();

        info!(
            estimator = ?self.config.estimator,
            n_samples = rows.len(),
            n_features = FEATURE_COUNT,
            "Fitting estimator"
        );

        let estimator = match self.config.estimator {
            EstimatorKind::RandomForest => {
                let forest = RandomForest::fit(&rows, &targets, self.config.forest_params())?;
                let depth = forest.validate()?;
                debug!(n_trees = forest.n_trees(), depth, "Fitted random forest");
                Estimator::RandomForest(forest)
            }
            EstimatorKind::Linear => Estimator::Linear(LinearRegression::fit(&rows, &targets)?),
            EstimatorKind::Mean => Estimator::Mean(MeanBaseline::fit(&targets)?),
        };
        Ok(estimator)
    }
}

/// Fit the four encoders. A category column that is absent from every record
/// yields an empty vocabulary.
pub fn fit_encoders(records: &[HistoricalListing]) -> Encoders {
    let fit = |column: fn(&HistoricalListing) -> Option<&str>| {
        CategoryEncoder::fit(records.iter().filter_map(column))
    };

    Encoders {
        location: fit(|r| r.location.as_deref()),
        connectivity: fit(|r| r.connectivity.as_deref()),
        utility: fit(|r| r.utility.as_deref()),
        lifestyle: fit(|r| r.lifestyle.as_deref()),
    }
}

/// Seeded shuffle split into (train, test) index sets.
///
/// The test side gets `ceil(n_samples * test_fraction)` rows, so any positive
/// fraction holds out at least one row. At least one row always stays on the
/// training side.
pub fn train_test_split(n_samples: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n_samples as f64 * test_fraction).ceil() as usize).min(n_samples.saturating_sub(1));
    let train = indices.split_off(n_test);
    (train, indices)
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    metrics::mae(&target_vector(predicted), &target_vector(actual)) as f64
}

/// Coefficient of determination. 0 when the actual values are constant.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    metrics::r_squared(&target_vector(predicted), &target_vector(actual)) as f64
}
