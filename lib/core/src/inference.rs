//! Rent inference
//!
//! [`InferenceService`] turns a [`Listing`] into a [`PredictionResult`]: the
//! estimator output, a fairness verdict against the asking rent, heuristic
//! livability/confidence scores and comparable flats.
//!
//! The service owns an `Option<Arc<ModelBundle>>`. Requests clone the `Arc`
//! and work on an immutable bundle; [`InferenceService::reload`] swaps in a
//! new one without affecting requests already running.

use crate::bundle::ModelBundle;
use crate::comparables::{round_to, ComparableFlat, ComparableSource, StaticComparables};
use crate::encoder::CategoryEncoder;
use crate::estimator::RentEstimator;
use crate::features::{CategoryCodes, FeatureVectorBuilder};
use crate::listing::Listing;
use crate::{Error, Result};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Relative difference below which an asking rent counts as fair.
pub const FAIRNESS_TOLERANCE: f64 = 0.05;

const AMENITY_SATURATION: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Fairness {
    Fair,
    Underpriced,
    Overpriced,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl Fairness {
    /// Compare an asking rent with the estimate. An asking rent of 0 means
    /// none was given.
    pub fn assess(predicted_rent: f64, asking_rent: f64) -> Self {
        if asking_rent == 0.0 {
            return Fairness::NotApplicable;
        }
        let diff = (predicted_rent - asking_rent).abs() / asking_rent;
        if diff < FAIRNESS_TOLERANCE {
            Fairness::Fair
        } else if predicted_rent > asking_rent {
            Fairness::Underpriced
        } else {
            Fairness::Overpriced
        }
    }
}

/// Where livability and confidence come from. Neither is produced by the
/// estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsSource {
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub predicted_rent: f64,
    pub fairness: Fairness,
    pub livability_score: f64,
    pub confidence: f64,
    pub metrics_source: MetricsSource,
    pub recommended_flats: Vec<ComparableFlat>,
}

pub struct InferenceService {
    bundle: RwLock<Option<Arc<ModelBundle>>>,
    comparables: Box<dyn ComparableSource>,
}

impl InferenceService {
    pub fn new(bundle: Option<ModelBundle>) -> Self {
        Self::with_comparables(bundle, Box::new(StaticComparables::new()))
    }

    pub fn with_comparables(bundle: Option<ModelBundle>, comparables: Box<dyn ComparableSource>) -> Self {
        Self {
            bundle: RwLock::new(bundle.map(Arc::new)),
            comparables,
        }
    }

    /// Service without a model. Every prediction fails with
    /// [`Error::ServiceUnavailable`] until [`reload`](Self::reload) is called.
    pub fn unloaded() -> Self {
        Self::new(None)
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.bundle.read().is_some()
    }

    #[inline]
    pub fn bundle(&self) -> Option<Arc<ModelBundle>> {
        self.bundle.read().clone()
    }

    pub fn reload(&self, bundle: ModelBundle) {
        *self.bundle.write() = Some(Arc::new(bundle));
    }

    pub fn predict_payload(&self, payload: &Value) -> Result<PredictionResult> {
        let listing = Listing::from_payload(payload)?;
        self.predict(&listing)
    }

    pub fn predict(&self, listing: &Listing) -> Result<PredictionResult> {
        let bundle = self.bundle().ok_or(Error::ServiceUnavailable)?;

        let codes = CategoryCodes::encode(listing, bundle.encoders())?;
        let features = FeatureVectorBuilder::assemble(listing, codes);
        let predicted_rent = bundle.estimator().predict(&features)?;
        let fairness = Fairness::assess(predicted_rent, listing.asking_rent);

        debug!(
            location = %listing.location,
            predicted_rent,
            asking_rent = listing.asking_rent,
            ?fairness,
            "Rent estimated"
        );

        Ok(PredictionResult {
            predicted_rent,
            fairness,
            livability_score: livability_score(listing),
            confidence: confidence(listing, &bundle),
            metrics_source: MetricsSource::Heuristic,
            recommended_flats: self.comparables.comparables(predicted_rent),
        })
    }
}

/// Map a tier label to [0, 1]. Unknown labels sit in the middle.
fn tier_level(label: &str) -> f64 {
    match label.trim().to_ascii_lowercase().as_str() {
        "low" | "poor" | "basic" | "budget" => 0.0,
        "high" | "good" | "excellent" | "premium" | "luxury" => 1.0,
        _ => 0.5,
    }
}

/// Heuristic livability in [7.0, 9.5] from amenity coverage and the
/// connectivity, utility and lifestyle tiers.
fn livability_score(listing: &Listing) -> f64 {
    let amenity_coverage =
        listing.amenities.count().min(AMENITY_SATURATION) as f64 / AMENITY_SATURATION as f64;
    let mean = (amenity_coverage
        + tier_level(listing.connectivity())
        + tier_level(listing.utility())
        + tier_level(listing.lifestyle()))
        / 4.0;
    round_to(7.0 + 2.5 * mean, 2)
}

/// Heuristic confidence in [85, 99]: the share of categorical inputs that
/// were part of the training vocabulary.
fn confidence(listing: &Listing, bundle: &ModelBundle) -> f64 {
    let seen = bundle.encoders().map_or(0, |e| {
        let known = |encoder: &CategoryEncoder, label: &str| encoder.contains(label) as usize;
        known(&e.location, &listing.location)
            + known(&e.connectivity, listing.connectivity())
            + known(&e.utility, listing.utility())
            + known(&e.lifestyle, listing.lifestyle())
    });
    round_to(85.0 + 14.0 * seen as f64 / 4.0, 1)
}
