//! Least squares with an intercept, solved by aprender's ridge regression.
//!
//! Columns are standardized first, and a small ridge penalty keeps the normal
//! equations positive definite when columns are collinear (size and area are
//! often identical). The fitted weights are mapped back to raw feature units,
//! so only coefficients and intercept are persisted.

use crate::features::{feature_matrix, target_vector, FeatureVector, FEATURE_COUNT};
use crate::{Error, Result};
use aprender::linear_model::Ridge;
use aprender::preprocessing::StandardScaler;
use aprender::traits::{Estimator as _, Transformer as _};
use serde::{Deserialize, Serialize};

const RIDGE_ALPHA: f32 = 1e-3;

/// Columns with a smaller spread are only centered by the scaler.
const MIN_SCALE: f32 = 1e-10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    pub fn fit(rows: &[FeatureVector], targets: &[f64]) -> Result<Self> {
        if rows.len() != targets.len() {
            return Err(Error::Training(format!(
                "feature rows ({}) and targets ({}) differ in length",
                rows.len(),
                targets.len()
            )));
        }
        if rows.is_empty() {
            return Err(Error::Training("cannot fit with zero samples".to_string()));
        }

        let x = feature_matrix(rows)?;
        let y = target_vector(targets);

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).map_err(|e| Error::Training(e.to_string()))?;

        let mut ridge = Ridge::new(RIDGE_ALPHA);
        ridge.fit(&scaled, &y).map_err(|e| Error::Training(e.to_string()))?;

        // beta_j * (x_j - mean_j) / scale_j  ==  coef_j * x_j - coef_j * mean_j
        let mut coefficients = Vec::with_capacity(FEATURE_COUNT);
        let mut intercept = ridge.intercept() as f64;
        let weights = ridge.coefficients().as_slice();
        for ((&beta, &mean), &std) in weights.iter().zip(scaler.mean()).zip(scaler.std()) {
            let scale = if std > MIN_SCALE { std as f64 } else { 1.0 };
            let coef = beta as f64 / scale;
            intercept -= coef * mean as f64;
            coefficients.push(coef);
        }

        Ok(Self {
            coefficients,
            intercept,
        })
    }

    pub fn predict(&self, features: &FeatureVector) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.as_slice())
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}
