//! Feature vector assembly
//!
//! The estimator consumes exactly [`FEATURE_COUNT`] values in the column order
//! of [`FEATURE_NAMES`]. Estimators are fitted on that order, so it must never
//! change between training and inference.

use crate::bundle::{Encoders, ModelBundle};
use crate::encoder::{CategoryEncoder, UNSEEN_CODE};
use crate::listing::{HistoricalListing, Listing};
use crate::{Error, Result};
use aprender::primitives::{Matrix, Vector};
use serde::{Deserialize, Serialize};

pub const FEATURE_COUNT: usize = 9;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "size",
    "rooms",
    "area",
    "number_of_bhk",
    "amen_count",
    "loc_enc",
    "connectivity_enc",
    "utility_enc",
    "lifestyle_enc",
];

/// Fixed-order numeric input to a rent estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[inline]
    pub fn get(&self, idx: usize) -> f64 {
        self.0[idx]
    }

    #[inline]
    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Training row for a historical record. Reads the record's own
    /// rooms/area/bhk columns instead of mirroring them.
    pub fn from_record(record: &HistoricalListing, encoders: &Encoders) -> Result<Self> {
        Ok(Self([
            record.size,
            record.rooms as f64,
            record.area,
            record.number_of_bhk as f64,
            record.amenity_count() as f64,
            encode_optional(&encoders.location, record.location.as_deref())? as f64,
            encode_optional(&encoders.connectivity, record.connectivity.as_deref())? as f64,
            encode_optional(&encoders.utility, record.utility.as_deref())? as f64,
            encode_optional(&encoders.lifestyle, record.lifestyle.as_deref())? as f64,
        ]))
    }
}

/// Stack rows into an `n x FEATURE_COUNT` matrix for the aprender models,
/// which work in `f32`.
pub fn feature_matrix(rows: &[FeatureVector]) -> Result<Matrix<f32>> {
    let data = rows
        .iter()
        .flat_map(|row| row.0.iter().map(|&v| v as f32))
        .collect();
    Matrix::from_vec(rows.len(), FEATURE_COUNT, data).map_err(|e| Error::Training(e.to_string()))
}

pub fn target_vector(targets: &[f64]) -> Vector<f32> {
    Vector::from_vec(targets.iter().map(|&v| v as f32).collect())
}

impl From<FeatureVector> for [f64; FEATURE_COUNT] {
    fn from(v: FeatureVector) -> Self {
        v.0
    }
}

fn encode_optional(encoder: &CategoryEncoder, label: Option<&str>) -> Result<u32> {
    match label {
        Some(label) => encoder.encode(label),
        None => Ok(UNSEEN_CODE),
    }
}

/// Encoded categorical inputs of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryCodes {
    pub location: u32,
    pub connectivity: u32,
    pub utility: u32,
    pub lifestyle: u32,
}

impl CategoryCodes {
    /// Encode the listing's categories. Bundles without encoders map every
    /// category to [`UNSEEN_CODE`].
    pub fn encode(listing: &Listing, encoders: Option<&Encoders>) -> Result<Self> {
        let Some(encoders) = encoders else {
            return Ok(Self {
                location: UNSEEN_CODE,
                connectivity: UNSEEN_CODE,
                utility: UNSEEN_CODE,
                lifestyle: UNSEEN_CODE,
            });
        };

        Ok(Self {
            location: encoders.location.encode(&listing.location)?,
            connectivity: encoders.connectivity.encode(listing.connectivity())?,
            utility: encoders.utility.encode(listing.utility())?,
            lifestyle: encoders.lifestyle.encode(listing.lifestyle())?,
        })
    }
}

pub struct FeatureVectorBuilder;

impl FeatureVectorBuilder {
    /// Build the feature vector for `listing`. Size fills both the size and
    /// area slots, bhk fills both the rooms and bhk slots.
    pub fn build(listing: &Listing, bundle: &ModelBundle) -> Result<FeatureVector> {
        let codes = CategoryCodes::encode(listing, bundle.encoders())?;
        Ok(Self::assemble(listing, codes))
    }

    pub fn assemble(listing: &Listing, codes: CategoryCodes) -> FeatureVector {
        let size = listing.size_sqft;
        let bhk = listing.bhk as f64;

        FeatureVector([
            size,
            bhk,
            size,
            bhk,
            listing.amenities.count() as f64,
            codes.location as f64,
            codes.connectivity as f64,
            codes.utility as f64,
            codes.lifestyle as f64,
        ])
    }
}
