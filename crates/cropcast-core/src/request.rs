//! Prediction requests and category normalisation.
//!
//! Every free-text categorical input goes through [`normalize_category`]
//! exactly once before it reaches an encoder. Fitted vocabularies are stored
//! in the same normal form, so lookup is an exact string match.

use serde::{Deserialize, Serialize};

/// Normalise a raw categorical input: trim surrounding whitespace and
/// lower-case.
///
/// "  Vegetative " → "vegetative". An all-whitespace input becomes the empty
/// string, which is still a value (it simply won't be in any vocabulary).
pub fn normalize_category(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Raw, caller-supplied prediction inputs.
///
/// Fields are kept exactly as received; normalisation happens in the
/// dispatcher. A missing stage or region reads as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// Route to variant B when no cause is supplied.
    #[serde(default, alias = "want_b")]
    pub force_variant_b: bool,
}

impl PredictionRequest {
    pub fn new(stage: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            region: region.into(),
            cause: None,
            force_variant_b: false,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn with_variant_b(mut self, force: bool) -> Self {
        self.force_variant_b = force;
        self
    }

    /// The normalised cause, if one was supplied and is non-empty after
    /// trimming. An empty cause counts as no cause.
    pub fn supplied_cause(&self) -> Option<String> {
        self.cause
            .as_deref()
            .map(normalize_category)
            .filter(|c| !c.is_empty())
    }
}
