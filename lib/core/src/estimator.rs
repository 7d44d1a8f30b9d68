//! Rent estimators
//!
//! [`RentEstimator`] is the seam between feature encoding and the regression
//! model. [`Estimator`] is the closed set of models that can be persisted in a
//! bundle.

use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::forest::RandomForest;
use crate::linear::LinearRegression;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

pub trait RentEstimator: Send + Sync {
    /// Estimate the rent for one feature vector.
    ///
    /// A failed estimate is an error, never a silent zero.
    fn predict(&self, features: &FeatureVector) -> Result<f64>;
}

/// Constant predictor, typically the mean rent of the training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanBaseline {
    value: f64,
}

impl MeanBaseline {
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    pub fn fit(targets: &[f64]) -> Result<Self> {
        if targets.is_empty() {
            return Err(Error::Training("cannot fit with zero samples".to_string()));
        }
        Ok(Self::new(targets.iter().sum::<f64>() / targets.len() as f64))
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Model family selectable for training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    RandomForest,
    Linear,
    Mean,
}

impl std::str::FromStr for EstimatorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "random-forest" | "random_forest" | "forest" => Ok(EstimatorKind::RandomForest),
            "linear" => Ok(EstimatorKind::Linear),
            "mean" => Ok(EstimatorKind::Mean),
            other => Err(Error::InvalidConfig(format!("unknown estimator '{}'", other))),
        }
    }
}

/// A persisted regression model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimator {
    RandomForest(RandomForest),
    Linear(LinearRegression),
    Mean(MeanBaseline),
}

impl Estimator {
    pub fn kind(&self) -> EstimatorKind {
        match self {
            Estimator::RandomForest(_) => EstimatorKind::RandomForest,
            Estimator::Linear(_) => EstimatorKind::Linear,
            Estimator::Mean(_) => EstimatorKind::Mean,
        }
    }

    /// Check that the model can score [`FEATURE_COUNT`]-wide vectors.
    pub fn validate(&self) -> Result<()> {
        match self {
            Estimator::RandomForest(forest) => {
                forest.validate()?;
            }
            Estimator::Linear(linear) => {
                if linear.coefficients().len() != FEATURE_COUNT {
                    return Err(Error::ModelLoad(format!(
                        "linear model has {} coefficients, expected {}",
                        linear.coefficients().len(),
                        FEATURE_COUNT
                    )));
                }
            }
            Estimator::Mean(_) => {}
        }
        Ok(())
    }
}

impl RentEstimator for Estimator {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let estimate = match self {
            Estimator::RandomForest(forest) => forest.predict(features)?,
            Estimator::Linear(linear) => linear.predict(features),
            Estimator::Mean(mean) => mean.value(),
        };

        if !estimate.is_finite() {
            return Err(Error::Prediction(format!(
                "{:?} estimator produced a non-finite value",
                self.kind()
            )));
        }
        Ok(estimate)
    }
}
