//! # FairRent
//!
//! Predicts a fair monthly rent for a flat listing and classifies the asking
//! rent as fair, underpriced or overpriced.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! fairrent train --data data/flats.csv --output models/rent_model.bundle
//! fairrent serve --model-path models/rent_model.bundle --http-port 5000
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use fairrent::prelude::*;
//!
//! let records = load_records("data/flats.csv").unwrap();
//! let bundle = TrainingPipeline::new(TrainingConfig::default())
//!     .unwrap()
//!     .fit(&records)
//!     .unwrap();
//!
//! let service = InferenceService::new(Some(bundle));
//! let listing = Listing::new("Pune", 850.0, 2).with_asking_rent(12_000.0);
//! let result = service.predict(&listing).unwrap();
//! println!("{} -> {:?}", result.predicted_rent, result.fairness);
//! ```
//!
//! ## Crate Structure
//!
//! - `fairrent-core` - encoders, features, estimators, inference and training
//! - `fairrent-storage` - model artifacts and CSV datasets
//! - `fairrent-api` - REST API

// Re-export core types
pub use fairrent_core::{
    CategoryEncoder, Encoders, Estimator, EstimatorKind, Fairness, FeatureVector,
    FeatureVectorBuilder, HistoricalListing, InferenceService, Listing, ModelBundle,
    PredictionResult, RentEstimator, TrainingConfig, TrainingPipeline,
    Error, Result,
};

// Re-export storage
pub use fairrent_storage::{load_bundle, load_records, save_bundle, ModelStore};

// Re-export API
pub use fairrent_api::{AppState, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Encoders, Estimator, EstimatorKind, Fairness, HistoricalListing,
        InferenceService, Listing, ModelBundle, PredictionResult,
        TrainingConfig, TrainingPipeline,
        Error, Result,
        load_records, ModelStore,
        AppState, RestApi,
    };
}
