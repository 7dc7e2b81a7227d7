//! Fitted label encoders: string category ↔ integer code.
//!
//! An encoder is the vocabulary one training run saw for one feature (or
//! output) of one variant. Codes are positions in that vocabulary. The
//! encoder does no normalisation; callers pass values already in normal form
//! (see [`cropcast_core::normalize_category`]).

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("unknown category {0:?}")]
    UnknownCategory(String),

    #[error("label code {code} out of range for vocabulary of {len}")]
    InvalidCode { code: usize, len: usize },

    #[error("duplicate category {0:?} in vocabulary")]
    DuplicateCategory(String),
}

/// Fitted string ↔ code bijection for a single categorical column.
///
/// Persisted as `{"classes": [...]}`; the lookup index is rebuilt on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEncoder")]
pub struct CategoryEncoder {
    classes: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

#[derive(Deserialize)]
struct RawEncoder {
    classes: Vec<String>,
}

impl TryFrom<RawEncoder> for CategoryEncoder {
    type Error = CodecError;

    fn try_from(raw: RawEncoder) -> Result<Self, Self::Error> {
        Self::new(raw.classes)
    }
}

impl CategoryEncoder {
    /// Build an encoder from an already-ordered vocabulary. Position `i`
    /// becomes code `i`.
    pub fn new(classes: Vec<String>) -> Result<Self, CodecError> {
        let mut index = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if index.insert(class.clone(), code).is_some() {
                return Err(CodecError::DuplicateCategory(class.clone()));
            }
        }
        Ok(Self { classes, index })
    }

    /// Fit a vocabulary from observed values: sorted, de-duplicated.
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sorted: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        let classes: Vec<String> = sorted.into_iter().collect();
        let index = classes
            .iter()
            .enumerate()
            .map(|(code, class)| (class.clone(), code))
            .collect();
        Self { classes, index }
    }

    /// Code for an exact vocabulary entry.
    pub fn encode(&self, value: &str) -> Result<usize, CodecError> {
        self.index
            .get(value)
            .copied()
            .ok_or_else(|| CodecError::UnknownCategory(value.to_string()))
    }

    /// Vocabulary entry for a code.
    pub fn decode(&self, code: usize) -> Result<&str, CodecError> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or(CodecError::InvalidCode {
                code,
                len: self.classes.len(),
            })
    }

    pub fn contains(&self, value: &str) -> bool {
        self.index.contains_key(value)
    }

    /// The fitted vocabulary in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
