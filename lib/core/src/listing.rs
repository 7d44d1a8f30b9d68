//! Listing records
//!
//! [`Listing`] is the inference-time input, parsed from a JSON payload with
//! explicit defaults for missing fields. [`HistoricalListing`] is one row of
//! training data.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const DEFAULT_LOCATION: &str = "Unknown";
pub const DEFAULT_CONNECTIVITY: &str = "medium";
pub const DEFAULT_UTILITY: &str = "average";
pub const DEFAULT_LIFESTYLE: &str = "standard";
pub const DEFAULT_BHK: u32 = 1;

/// Amenities in either of the two accepted representations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amenities {
    /// Amenity name -> present flag (request format)
    Flags(BTreeMap<String, bool>),
    /// Pipe-delimited amenity names (training data format)
    Listed(String),
}

impl Default for Amenities {
    fn default() -> Self {
        Amenities::Flags(BTreeMap::new())
    }
}

impl Amenities {
    /// Number of amenities present, every amenity weighing the same.
    pub fn count(&self) -> usize {
        match self {
            Amenities::Flags(flags) => flags.values().filter(|present| **present).count(),
            Amenities::Listed(list) => count_listed(list),
        }
    }

    fn from_value(value: Option<&Value>) -> Result<Self> {
        match value {
            None | Some(Value::Null) => Ok(Amenities::default()),
            Some(Value::String(list)) => Ok(Amenities::Listed(list.clone())),
            Some(Value::Object(map)) => {
                let mut flags = BTreeMap::new();
                for (name, flag) in map {
                    let present = match flag {
                        Value::Bool(b) => *b,
                        Value::Number(n) => n.as_f64() == Some(1.0),
                        _ => {
                            return Err(Error::invalid_input(
                                format!("amenities.{}", name),
                                "flag must be 0/1 or a boolean",
                            ))
                        }
                    };
                    flags.insert(name.clone(), present);
                }
                Ok(Amenities::Flags(flags))
            }
            Some(_) => Err(Error::invalid_input(
                "amenities",
                "expected an object of flags or a pipe-delimited string",
            )),
        }
    }
}

/// A listing submitted for rent estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub location: String,
    pub size_sqft: f64,
    pub bhk: u32,
    pub amenities: Amenities,
    pub connectivity: Option<String>,
    pub utility: Option<String>,
    pub lifestyle: Option<String>,
    /// 0 means the caller did not provide an asking rent
    pub asking_rent: f64,
}

impl Listing {
    pub fn new(location: impl Into<String>, size_sqft: f64, bhk: u32) -> Self {
        Self {
            location: location.into(),
            size_sqft,
            bhk,
            amenities: Amenities::default(),
            connectivity: None,
            utility: None,
            lifestyle: None,
            asking_rent: 0.0,
        }
    }

    pub fn with_asking_rent(mut self, asking_rent: f64) -> Self {
        self.asking_rent = asking_rent;
        self
    }

    pub fn with_amenities(mut self, amenities: Amenities) -> Self {
        self.amenities = amenities;
        self
    }

    pub fn with_connectivity(mut self, connectivity: impl Into<String>) -> Self {
        self.connectivity = Some(connectivity.into());
        self
    }

    pub fn with_utility(mut self, utility: impl Into<String>) -> Self {
        self.utility = Some(utility.into());
        self
    }

    pub fn with_lifestyle(mut self, lifestyle: impl Into<String>) -> Self {
        self.lifestyle = Some(lifestyle.into());
        self
    }

    pub fn connectivity(&self) -> &str {
        self.connectivity.as_deref().unwrap_or(DEFAULT_CONNECTIVITY)
    }

    pub fn utility(&self) -> &str {
        self.utility.as_deref().unwrap_or(DEFAULT_UTILITY)
    }

    pub fn lifestyle(&self) -> &str {
        self.lifestyle.as_deref().unwrap_or(DEFAULT_LIFESTYLE)
    }

    /// Parse a request payload.
    ///
    /// Missing fields take their documented defaults (size 0, bhk 1, asking
    /// rent 0, sentinel categories). Present fields of the wrong type are
    /// rejected with [`Error::InvalidInput`] naming the field.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let obj = payload
            .as_object()
            .ok_or_else(|| Error::invalid_input("body", "expected a JSON object"))?;

        let size_sqft = number_field(obj, "size_sqft")?.unwrap_or(0.0);
        if size_sqft < 0.0 {
            return Err(Error::invalid_input("size_sqft", "must not be negative"));
        }

        let bhk = match number_field(obj, "bhk")? {
            None => DEFAULT_BHK,
            Some(v) if v.fract() != 0.0 => {
                return Err(Error::invalid_input("bhk", "must be a whole number"))
            }
            Some(v) if v < 1.0 || v > u32::MAX as f64 => {
                return Err(Error::invalid_input("bhk", "must be a positive integer"))
            }
            Some(v) => v as u32,
        };

        let asking_rent = number_field(obj, "asking_rent")?.unwrap_or(0.0);
        if asking_rent < 0.0 {
            return Err(Error::invalid_input("asking_rent", "must not be negative"));
        }

        Ok(Self {
            location: text_field(obj, "location")?.unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            size_sqft,
            bhk,
            amenities: Amenities::from_value(obj.get("amenities"))?,
            connectivity: text_field(obj, "connectivity")?,
            utility: text_field(obj, "utility")?,
            lifestyle: text_field(obj, "lifestyle")?,
            asking_rent,
        })
    }
}

fn number_field(obj: &Map<String, Value>, field: &str) -> Result<Option<f64>> {
    let value = match obj.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match value {
        Some(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(Error::invalid_input(field, "expected a finite number")),
    }
}

fn text_field(obj: &Map<String, Value>, field: &str) -> Result<Option<String>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::invalid_input(field, "expected a string")),
    }
}

/// One historical listing used for training.
///
/// Category columns are `None` when the column is absent from the dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalListing {
    pub location: Option<String>,
    pub price: f64,
    pub size: f64,
    pub rooms: u32,
    pub area: f64,
    pub number_of_bhk: u32,
    /// Pipe-delimited amenity names
    pub amenities: String,
    pub connectivity: Option<String>,
    pub utility: Option<String>,
    pub lifestyle: Option<String>,
}

/// Segments of a pipe-separated amenity list. An empty list has none.
fn count_listed(list: &str) -> usize {
    if list.is_empty() {
        0
    } else {
        list.split('|').count()
    }
}

impl HistoricalListing {
    pub fn amenity_count(&self) -> usize {
        count_listed(&self.amenities)
    }
}
