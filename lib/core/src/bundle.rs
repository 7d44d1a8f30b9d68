//! Model bundles
//!
//! A bundle pairs an estimator with the encoders that reproduce its
//! training-time feature encoding. Its shape is resolved once, when the
//! persisted payload is decoded:
//!
//! - a keyed record (`model`, `le_location`, `le_connectivity`, `le_utility`,
//!   `le_lifestyle`) becomes [`ModelBundle::Full`]
//! - a bare estimator (legacy artifacts) becomes [`ModelBundle::EstimatorOnly`]

use crate::encoder::CategoryEncoder;
use crate::estimator::Estimator;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The four category encoders of a fully trained bundle.
#[derive(Debug, Clone)]
pub struct Encoders {
    pub location: CategoryEncoder,
    pub connectivity: CategoryEncoder,
    pub utility: CategoryEncoder,
    pub lifestyle: CategoryEncoder,
}

impl Encoders {
    fn ensure_fitted(&self) -> Result<()> {
        for (name, encoder) in [
            ("le_location", &self.location),
            ("le_connectivity", &self.connectivity),
            ("le_utility", &self.utility),
            ("le_lifestyle", &self.lifestyle),
        ] {
            if !encoder.is_fitted() {
                return Err(Error::ModelLoad(format!("encoder '{}' is not fitted", name)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum ModelBundle {
    EstimatorOnly(Estimator),
    Full {
        estimator: Estimator,
        encoders: Encoders,
    },
}

/// Keyed persisted form of a full bundle.
#[derive(Debug, Serialize, Deserialize)]
pub struct BundleRecord {
    pub model: Option<Estimator>,
    pub le_location: Option<CategoryEncoder>,
    pub le_connectivity: Option<CategoryEncoder>,
    pub le_utility: Option<CategoryEncoder>,
    pub le_lifestyle: Option<CategoryEncoder>,
}

impl ModelBundle {
    pub fn full(estimator: Estimator, encoders: Encoders) -> Self {
        ModelBundle::Full {
            estimator,
            encoders,
        }
    }

    #[inline]
    pub fn estimator(&self) -> &Estimator {
        match self {
            ModelBundle::EstimatorOnly(estimator) => estimator,
            ModelBundle::Full { estimator, .. } => estimator,
        }
    }

    #[inline]
    pub fn encoders(&self) -> Option<&Encoders> {
        match self {
            ModelBundle::EstimatorOnly(_) => None,
            ModelBundle::Full { encoders, .. } => Some(encoders),
        }
    }

    /// Decode a persisted payload, detecting the legacy estimator-only shape.
    pub fn from_payload(payload: Value) -> Result<Self> {
        let is_record = payload.as_object().is_some_and(|obj| obj.contains_key("model"));

        let bundle = if is_record {
            let record: BundleRecord = serde_json::from_value(payload)
                .map_err(|e| Error::ModelLoad(format!("invalid bundle record: {}", e)))?;
            Self::from_record(record)?
        } else {
            let estimator: Estimator = serde_json::from_value(payload)
                .map_err(|e| Error::ModelLoad(format!("payload is neither a bundle nor an estimator: {}", e)))?;
            ModelBundle::EstimatorOnly(estimator)
        };

        bundle.validate()?;
        Ok(bundle)
    }

    pub fn from_record(record: BundleRecord) -> Result<Self> {
        let missing = |name: &str| Error::ModelLoad(format!("bundle is missing '{}'", name));

        let estimator = record.model.ok_or_else(|| missing("model"))?;
        let encoders = Encoders {
            location: record.le_location.ok_or_else(|| missing("le_location"))?,
            connectivity: record.le_connectivity.ok_or_else(|| missing("le_connectivity"))?,
            utility: record.le_utility.ok_or_else(|| missing("le_utility"))?,
            lifestyle: record.le_lifestyle.ok_or_else(|| missing("le_lifestyle"))?,
        };

        Ok(Self::full(estimator, encoders))
    }

    /// Encode for persistence. Estimator-only bundles keep their legacy shape.
    pub fn to_payload(&self) -> Result<Value> {
        let value = match self {
            ModelBundle::EstimatorOnly(estimator) => serde_json::to_value(estimator)?,
            ModelBundle::Full {
                estimator,
                encoders,
            } => serde_json::to_value(BundleRecord {
                model: Some(estimator.clone()),
                le_location: Some(encoders.location.clone()),
                le_connectivity: Some(encoders.connectivity.clone()),
                le_utility: Some(encoders.utility.clone()),
                le_lifestyle: Some(encoders.lifestyle.clone()),
            })?,
        };
        Ok(value)
    }

    pub fn validate(&self) -> Result<()> {
        self.estimator().validate()?;
        if let Some(encoders) = self.encoders() {
            encoders.ensure_fitted()?;
        }
        Ok(())
    }
}
