//! # FairRent Core
//!
//! Core library for the FairRent rent estimator.
//!
//! This crate provides the inference contract and its training counterpart:
//!
//! - [`CategoryEncoder`] - Label to code mapping with a fixed unseen fallback
//! - [`FeatureVectorBuilder`] - Fixed-order feature vectors from listings
//! - [`Estimator`] - Random forest, linear and baseline rent estimators
//! - [`ModelBundle`] - An estimator plus the encoders it was trained with
//! - [`InferenceService`] - Estimate, fairness verdict and derived metrics
//! - [`TrainingPipeline`] - Fits a bundle from historical listings
//!
//! ## Example
//!
//! ```rust
//! use fairrent_core::{
//!     CategoryEncoder, Encoders, Estimator, Fairness, InferenceService, Listing,
//!     MeanBaseline, ModelBundle,
//! };
//!
//! let encoders = Encoders {
//!     location: CategoryEncoder::fit(["Pune", "Mumbai"]),
//!     connectivity: CategoryEncoder::fit(["medium"]),
//!     utility: CategoryEncoder::fit(["average"]),
//!     lifestyle: CategoryEncoder::fit(["standard"]),
//! };
//! let bundle = ModelBundle::full(Estimator::Mean(MeanBaseline::new(10_000.0)), encoders);
//! let service = InferenceService::new(Some(bundle));
//!
//! let listing = Listing::new("Pune", 850.0, 2).with_asking_rent(12_000.0);
//! let result = service.predict(&listing).unwrap();
//! assert_eq!(result.fairness, Fairness::Overpriced);
//! ```

pub mod error;
pub mod encoder;
pub mod listing;
pub mod features;
pub mod estimator;
pub mod forest;
pub mod linear;
pub mod bundle;
pub mod comparables;
pub mod inference;
pub mod training;

pub use error::{Error, Result};
pub use encoder::{CategoryEncoder, UNSEEN_CODE};
pub use listing::{Amenities, HistoricalListing, Listing};
pub use features::{CategoryCodes, FeatureVector, FeatureVectorBuilder, FEATURE_COUNT, FEATURE_NAMES};
pub use estimator::{Estimator, EstimatorKind, MeanBaseline, RentEstimator};
pub use forest::{ForestParams, RandomForest};
pub use linear::LinearRegression;
pub use bundle::{BundleRecord, Encoders, ModelBundle};
pub use comparables::{ComparableFlat, ComparableSource, StaticComparables};
pub use inference::{Fairness, InferenceService, MetricsSource, PredictionResult, FAIRNESS_TOLERANCE};
pub use training::{Evaluation, TrainingConfig, TrainingOutcome, TrainingPipeline};
