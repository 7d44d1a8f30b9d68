//! Category encoding
//!
//! Maps category labels to dense integer codes. The code of a label is its
//! position in the vocabulary, which is the order in which labels were first
//! seen during fitting. The vocabulary is frozen once fitted.

use crate::{Error, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Code returned for labels that are not part of the training vocabulary.
///
/// Fitted encoders always map unseen labels to this code, so inference stays
/// deterministic for inputs outside the training data.
pub const UNSEEN_CODE: u32 = 0;

/// Bidirectional label <-> code mapping built from a training vocabulary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "EncoderRecord", into = "EncoderRecord")]
pub struct CategoryEncoder {
    vocabulary: Option<Vec<String>>,
    index: AHashMap<String, u32>,
}

impl CategoryEncoder {
    /// Create an unfitted encoder. `encode` fails until it is fitted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit an encoder over `labels`, assigning codes in order of first occurrence.
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocabulary = Vec::new();
        let mut index = AHashMap::new();

        for label in labels {
            let label = label.as_ref();
            if !index.contains_key(label) {
                index.insert(label.to_string(), vocabulary.len() as u32);
                vocabulary.push(label.to_string());
            }
        }

        Self {
            vocabulary: Some(vocabulary),
            index,
        }
    }

    #[inline]
    pub fn is_fitted(&self) -> bool {
        self.vocabulary.is_some()
    }

    /// Encode a label, falling back to [`UNSEEN_CODE`] for unseen labels.
    pub fn encode(&self, label: &str) -> Result<u32> {
        if !self.is_fitted() {
            return Err(Error::InvalidEncoder);
        }
        Ok(self.lookup(label).unwrap_or(UNSEEN_CODE))
    }

    /// Exact vocabulary lookup without the unseen fallback.
    #[inline]
    pub fn lookup(&self, label: &str) -> Option<u32> {
        self.index.get(label).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        self.vocabulary
            .as_ref()
            .and_then(|v| v.get(code as usize))
            .map(String::as_str)
    }

    pub fn vocabulary(&self) -> &[String] {
        self.vocabulary.as_deref().unwrap_or(&[])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vocabulary().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vocabulary().is_empty()
    }
}

/// Persisted form: only the ordered vocabulary, the index is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct EncoderRecord {
    vocabulary: Option<Vec<String>>,
}

impl From<CategoryEncoder> for EncoderRecord {
    fn from(encoder: CategoryEncoder) -> Self {
        Self {
            vocabulary: encoder.vocabulary,
        }
    }
}

impl TryFrom<EncoderRecord> for CategoryEncoder {
    type Error = String;

    fn try_from(record: EncoderRecord) -> std::result::Result<Self, Self::Error> {
        let Some(vocabulary) = record.vocabulary else {
            return Ok(CategoryEncoder::new());
        };

        let encoder = CategoryEncoder::fit(&vocabulary);
        if encoder.len() != vocabulary.len() {
            return Err("encoder vocabulary contains duplicate labels".to_string());
        }
        Ok(encoder)
    }
}
