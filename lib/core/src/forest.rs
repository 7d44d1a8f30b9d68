//! Random forest regression
//!
//! Bagged aprender CART regressors (MSE splits, leaves predict the mean
//! target), averaged at prediction time. Each tree draws its bootstrap sample
//! from its own seed (`random_state + tree index`), so a forest is
//! reproducible even though trees are fitted in parallel.

use crate::features::{feature_matrix, target_vector, FeatureVector, FEATURE_COUNT};
use crate::{Error, Result};
use aprender::primitives::Matrix;
use aprender::tree::DecisionTreeRegressor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hyperparameters of a random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub random_state: u64,
    /// Fit every tree on a bootstrap resample rather than the full data.
    #[serde(default = "default_bootstrap")]
    pub bootstrap: bool,
}

fn default_bootstrap() -> bool {
    true
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            random_state: 42,
            bootstrap: true,
        }
    }
}

impl ForestParams {
    fn tree(&self) -> DecisionTreeRegressor {
        let tree = DecisionTreeRegressor::new()
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf);
        match self.max_depth {
            Some(depth) => tree.with_max_depth(depth),
            None => tree,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTreeRegressor>,
    params: ForestParams,
}

impl RandomForest {
    pub fn fit(rows: &[FeatureVector], targets: &[f64], params: ForestParams) -> Result<Self> {
        let n_samples = rows.len();
        if n_samples != targets.len() {
            return Err(Error::Training(format!(
                "feature rows ({}) and targets ({}) differ in length",
                n_samples,
                targets.len()
            )));
        }
        if n_samples == 0 {
            return Err(Error::Training("cannot fit with zero samples".to_string()));
        }
        if params.n_estimators == 0 {
            return Err(Error::InvalidConfig("n_estimators must be at least 1".to_string()));
        }

        let trees = (0..params.n_estimators)
            .into_par_iter()
            .map(|i| -> Result<DecisionTreeRegressor> {
                let (x, y) = if params.bootstrap {
                    let seed = params.random_state.wrapping_add(i as u64);
                    let indices = bootstrap_sample(n_samples, seed);
                    let sample_rows: Vec<FeatureVector> = indices.iter().map(|&j| rows[j]).collect();
                    let sample_targets: Vec<f64> = indices.iter().map(|&j| targets[j]).collect();
                    (feature_matrix(&sample_rows)?, target_vector(&sample_targets))
                } else {
                    (feature_matrix(rows)?, target_vector(targets))
                };

                let mut tree = params.tree();
                tree.fit(&x, &y).map_err(|e| Error::Training(e.to_string()))?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { trees, params })
    }

    /// Average of the per-tree estimates.
    pub fn predict(&self, features: &FeatureVector) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(Error::Prediction("random forest has no trees".to_string()));
        }

        let values = features.as_slice().iter().map(|&v| v as f32).collect();
        let x = Matrix::from_vec(1, FEATURE_COUNT, values)
            .map_err(|e| Error::Prediction(e.to_string()))?;

        let total: f64 = self.trees.iter().map(|t| t.predict(&x)[0] as f64).sum();
        Ok(total / self.trees.len() as f64)
    }

    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Check that every tree is fitted and only splits on known features.
    /// Returns the depth of the deepest tree.
    pub fn validate(&self) -> Result<usize> {
        if self.trees.is_empty() {
            return Err(Error::ModelLoad("random forest has no trees".to_string()));
        }

        let mut deepest = 0;
        for tree in &self.trees {
            let value = serde_json::to_value(tree)?;
            let root = value
                .get("tree")
                .filter(|root| !root.is_null())
                .ok_or_else(|| Error::ModelLoad("random forest holds an unfitted tree".to_string()))?;
            deepest = deepest.max(node_depth(root)?);
        }
        Ok(deepest)
    }
}

fn bootstrap_sample(n_samples: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_samples).map(|_| rng.random_range(0..n_samples)).collect()
}

/// Walk a serialized tree without recursion; persisted trees can be deep.
fn node_depth(root: &Value) -> Result<usize> {
    let mut deepest = 0;
    let mut stack = vec![(root, 0usize)];

    while let Some((node, depth)) = stack.pop() {
        if node.get("Leaf").is_some() {
            deepest = deepest.max(depth);
            continue;
        }
        let split = node
            .get("Node")
            .ok_or_else(|| Error::ModelLoad("malformed regression tree node".to_string()))?;

        let feature = split.get("feature_idx").and_then(Value::as_u64);
        if !feature.is_some_and(|f| (f as usize) < FEATURE_COUNT) {
            return Err(Error::ModelLoad(
                "random forest splits on an unknown feature".to_string(),
            ));
        }

        for child in ["left", "right"] {
            let child = split
                .get(child)
                .ok_or_else(|| Error::ModelLoad("malformed regression tree node".to_string()))?;
            stack.push((child, depth + 1));
        }
    }
    Ok(deepest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(size: f64, code: f64) -> FeatureVector {
        FeatureVector::new([size, 2.0, size, 2.0, 1.0, code, 0.0, 0.0, 0.0])
    }

    fn step_data() -> (Vec<FeatureVector>, Vec<f64>) {
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..20 {
            let size = 400.0 + i as f64 * 50.0;
            rows.push(row(size, 0.0));
            targets.push(if size < 900.0 { 10_000.0 } else { 20_000.0 });
        }
        (rows, targets)
    }

    fn single_tree(params: ForestParams) -> ForestParams {
        ForestParams {
            n_estimators: 1,
            bootstrap: false,
            ..params
        }
    }

    #[test]
    fn test_tree_learns_step() {
        let (rows, targets) = step_data();
        let forest = RandomForest::fit(&rows, &targets, single_tree(ForestParams::default())).unwrap();

        assert_eq!(forest.validate().unwrap(), 1);
        assert_eq!(forest.predict(&row(500.0, 0.0)).unwrap(), 10_000.0);
        assert_eq!(forest.predict(&row(1200.0, 0.0)).unwrap(), 20_000.0);
    }

    #[test]
    fn test_constant_targets_make_single_leaf() {
        let rows = vec![row(100.0, 0.0), row(200.0, 1.0), row(300.0, 2.0)];
        let targets = vec![5.0, 5.0, 5.0];
        let forest = RandomForest::fit(&rows, &targets, single_tree(ForestParams::default())).unwrap();
        assert_eq!(forest.validate().unwrap(), 0);
        assert_eq!(forest.predict(&row(999.0, 9.0)).unwrap(), 5.0);
    }

    #[test]
    fn test_max_depth_respected() {
        let rows: Vec<FeatureVector> = (0..32).map(|i| row(i as f64, 0.0)).collect();
        let targets: Vec<f64> = (0..32).map(|i| (i * i) as f64).collect();
        let params = single_tree(ForestParams {
            max_depth: Some(3),
            ..ForestParams::default()
        });
        let forest = RandomForest::fit(&rows, &targets, params).unwrap();
        assert!(forest.validate().unwrap() <= 3);
    }

    #[test]
    fn test_forest_is_deterministic() {
        let (rows, targets) = step_data();
        let params = ForestParams {
            n_estimators: 16,
            ..ForestParams::default()
        };
        let a = RandomForest::fit(&rows, &targets, params.clone()).unwrap();
        let b = RandomForest::fit(&rows, &targets, params).unwrap();

        for listing in [row(420.0, 0.0), row(880.0, 0.0), row(1300.0, 0.0)] {
            assert_eq!(a.predict(&listing).unwrap(), b.predict(&listing).unwrap());
        }
    }

    #[test]
    fn test_forest_prediction_within_target_range() {
        let (rows, targets) = step_data();
        let forest = RandomForest::fit(
            &rows,
            &targets,
            ForestParams {
                n_estimators: 25,
                ..ForestParams::default()
            },
        )
        .unwrap();

        let low = forest.predict(&row(450.0, 0.0)).unwrap();
        let high = forest.predict(&row(1350.0, 0.0)).unwrap();
        assert!((10_000.0..=20_000.0).contains(&low));
        assert!(high > low);
    }

    #[test]
    fn test_validate_rejects_unknown_feature() {
        let (rows, targets) = step_data();
        let forest = RandomForest::fit(&rows, &targets, single_tree(ForestParams::default())).unwrap();

        let mut json = serde_json::to_value(&forest).unwrap();
        json["trees"][0]["tree"]["Node"]["feature_idx"] = serde_json::json!(FEATURE_COUNT);
        let tampered: RandomForest = serde_json::from_value(json).unwrap();
        assert!(matches!(tampered.validate(), Err(Error::ModelLoad(_))));
    }

    #[test]
    fn test_validate_rejects_unfitted_tree() {
        let forest: RandomForest = serde_json::from_value(serde_json::json!({
            "trees": [{"tree": null, "max_depth": null, "min_samples_split": 2, "min_samples_leaf": 1}],
            "params": ForestParams::default(),
        }))
        .unwrap();
        assert!(matches!(forest.validate(), Err(Error::ModelLoad(_))));
    }

    #[test]
    fn test_params_without_bootstrap_flag_default_to_bagging() {
        let params: ForestParams = serde_json::from_value(serde_json::json!({
            "n_estimators": 10,
            "max_depth": null,
            "min_samples_split": 2,
            "min_samples_leaf": 1,
            "random_state": 7
        }))
        .unwrap();
        assert!(params.bootstrap);
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        assert!(RandomForest::fit(&[], &[], ForestParams::default()).is_err());
        assert!(RandomForest::fit(&[row(1.0, 0.0)], &[1.0, 2.0], ForestParams::default()).is_err());
        let params = ForestParams {
            n_estimators: 0,
            ..ForestParams::default()
        };
        assert!(RandomForest::fit(&[row(1.0, 0.0)], &[1.0], params).is_err());
    }
}
