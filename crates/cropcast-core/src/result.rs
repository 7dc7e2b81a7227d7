//! Prediction outcomes as returned to presentation layers.

use serde::{Deserialize, Serialize};

/// Machine-readable failure category. Callers branch on this, never on the
/// message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The selected variant's artifact is not loaded.
    ModelUnavailable,
    /// An input value is outside the fitted vocabulary of its feature.
    UnknownCategory,
    /// The underlying classifier call failed.
    PredictionFailed,
    /// A predicted label index has no entry in the output vocabulary.
    /// Signals a corrupted artifact.
    InvalidCode,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModelUnavailable => "model_unavailable",
            Self::UnknownCategory => "unknown_category",
            Self::PredictionFailed => "prediction_failed",
            Self::InvalidCode => "invalid_code",
        }
    }
}

/// Result of one dispatch: exactly one success shape or a failure.
///
/// Serialises untagged, so the JSON carries only the populated fields:
/// `{"disease", "confidence"?}`, `{"disease", "cause"}`, or
/// `{"error", "kind"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionResult {
    Failure {
        error: String,
        kind: ErrorKind,
    },
    /// Variant B: disease and cause from two classifiers. No confidence.
    DiseaseAndCause {
        disease: String,
        cause: String,
    },
    /// Variants A and C.
    Disease {
        disease: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<f32>,
    },
}

impl PredictionResult {
    pub fn failure(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
            kind,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failure { .. })
    }

    pub fn disease(&self) -> Option<&str> {
        match self {
            Self::Disease { disease, .. } | Self::DiseaseAndCause { disease, .. } => {
                Some(disease.as_str())
            }
            Self::Failure { .. } => None,
        }
    }

    pub fn cause(&self) -> Option<&str> {
        match self {
            Self::DiseaseAndCause { cause, .. } => Some(cause.as_str()),
            _ => None,
        }
    }

    pub fn confidence(&self) -> Option<f32> {
        match self {
            Self::Disease { confidence, .. } => *confidence,
            _ => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failure { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
