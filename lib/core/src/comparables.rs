// Comparable listings shown next to an estimate
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableFlat {
    pub name: String,
    pub rent: f64,
    pub area: String,
}

pub trait ComparableSource: Send + Sync {
    fn comparables(&self, predicted_rent: f64) -> Vec<ComparableFlat>;
}

/// Fixed set of reference flats priced relative to the estimate.
pub struct StaticComparables {
    entries: Vec<(&'static str, f64, &'static str)>,
}

impl StaticComparables {
    pub fn new() -> Self {
        Self {
            entries: vec![
                ("Skyline Residency", 0.9, "Kothrud"),
                ("Urban Nest", 1.05, "Viman Nagar"),
                ("Loni Comfort PG", 0.8, "Loni Kalbhor"),
                ("BlueView Apartments", 1.15, "Baner"),
            ],
        }
    }
}

impl Default for StaticComparables {
    fn default() -> Self {
        Self::new()
    }
}

impl ComparableSource for StaticComparables {
    fn comparables(&self, predicted_rent: f64) -> Vec<ComparableFlat> {
        self.entries
            .iter()
            .map(|(name, multiplier, area)| ComparableFlat {
                name: name.to_string(),
                rent: round_to(predicted_rent * multiplier, 2),
                area: area.to_string(),
            })
            .collect()
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
