//! Inference dispatch: pick a variant, encode, classify, decode.
//!
//! Variant selection (first match wins):
//!
//! 1. non-empty cause → C
//! 2. `force_variant_b` → B
//! 3. otherwise → A
//!
//! There is no fallback between variants: if the selected variant is not
//! loaded the request fails with [`ErrorKind::ModelUnavailable`].
//!
//! [`Dispatcher::predict`] never fails or panics past its boundary. Every
//! error, including a panic inside a classifier, comes back as a
//! [`PredictionResult::Failure`]. Panics are caught around each classifier
//! call, so the failure names the output (`disease` or `cause`) that was
//! being produced.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use cropcast_core::{ErrorKind, PredictionRequest, PredictionResult, Variant, normalize_category};
use thiserror::Error;
use tracing::{debug, warn};

use crate::artifact::{FeatureEncoders, ModelArtifact};
use crate::classifier::Classifier;
use crate::encoder::CategoryEncoder;
use crate::registry::Registry;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DispatchError {
    #[error("Model {0} not trained yet.")]
    ModelUnavailable(Variant),

    #[error("Unknown {} for Model {variant}.", unknown_fields(.variant))]
    UnknownCategory {
        variant: Variant,
        feature: &'static str,
        value: String,
    },

    #[error("Model {variant} prediction failed.")]
    PredictionFailed {
        variant: Variant,
        output: &'static str,
        reason: String,
    },

    #[error("Model {variant} predicted {output} code {code}, which has no label.")]
    InvalidCode {
        variant: Variant,
        output: &'static str,
        code: usize,
    },
}

fn unknown_fields(variant: &Variant) -> &'static str {
    match variant {
        Variant::A | Variant::B => "stage or region",
        Variant::C => "stage/region/cause",
    }
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            Self::UnknownCategory { .. } => ErrorKind::UnknownCategory,
            Self::PredictionFailed { .. } => ErrorKind::PredictionFailed,
            Self::InvalidCode { .. } => ErrorKind::InvalidCode,
        }
    }

    pub fn variant(&self) -> Variant {
        match self {
            Self::ModelUnavailable(variant)
            | Self::UnknownCategory { variant, .. }
            | Self::PredictionFailed { variant, .. }
            | Self::InvalidCode { variant, .. } => *variant,
        }
    }
}

impl From<DispatchError> for PredictionResult {
    fn from(err: DispatchError) -> Self {
        PredictionResult::failure(err.kind(), err.to_string())
    }
}

/// Choose the variant a request routes to.
pub fn select_variant(request: &PredictionRequest) -> Variant {
    if request.supplied_cause().is_some() {
        Variant::C
    } else if request.force_variant_b {
        Variant::B
    } else {
        Variant::A
    }
}

/// Stateless prediction front-end over a shared, immutable registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run one request end to end. Always returns a payload.
    ///
    /// A panicking classifier is reported as `PredictionFailed`, but the
    /// process panic hook still runs first; with the default hook the panic
    /// message is printed to stderr.
    pub fn predict(&self, request: &PredictionRequest) -> PredictionResult {
        let variant = select_variant(request);

        match self.dispatch(variant, request) {
            Ok(result) => {
                debug!(
                    %variant,
                    disease = result.disease().unwrap_or_default(),
                    "prediction served"
                );
                result
            }
            Err(err) => {
                match &err {
                    DispatchError::PredictionFailed { output, reason, .. } => {
                        warn!(%variant, output, reason = %reason, "prediction failed");
                    }
                    other => warn!(
                        %variant,
                        kind = other.kind().as_str(),
                        error = %other,
                        "prediction rejected"
                    ),
                }
                err.into()
            }
        }
    }

    /// Run one request through `variant`, returning typed errors.
    pub fn dispatch(
        &self,
        variant: Variant,
        request: &PredictionRequest,
    ) -> Result<PredictionResult, DispatchError> {
        let artifact = self
            .registry
            .get(variant)
            .ok_or(DispatchError::ModelUnavailable(variant))?;

        let stage = normalize_category(&request.stage);
        let region = normalize_category(&request.region);

        match artifact {
            ModelArtifact::A(model) => {
                let x = encode_features(variant, &model.features, &stage, &region, None)?;
                let (disease, confidence) =
                    classify(variant, "disease", model.classifier.as_ref(), &model.disease, &x)?;
                Ok(PredictionResult::Disease {
                    disease,
                    confidence,
                })
            }
            ModelArtifact::B(model) => {
                let x = encode_features(variant, &model.features, &stage, &region, None)?;
                let disease_code = run(variant, "disease", model.disease_classifier.as_ref(), &x)?;
                let cause_code = run(variant, "cause", model.cause_classifier.as_ref(), &x)?;
                Ok(PredictionResult::DiseaseAndCause {
                    disease: decode(variant, "disease", &model.disease, disease_code)?,
                    cause: decode(variant, "cause", &model.cause, cause_code)?,
                })
            }
            ModelArtifact::C(model) => {
                let cause = normalize_category(request.cause.as_deref().unwrap_or_default());
                let x = encode_features(
                    variant,
                    &model.features,
                    &stage,
                    &region,
                    Some((&model.cause, &cause)),
                )?;
                let (disease, confidence) =
                    classify(variant, "disease", model.classifier.as_ref(), &model.disease, &x)?;
                Ok(PredictionResult::Disease {
                    disease,
                    confidence,
                })
            }
        }
    }
}

/// Encode normalised inputs into the feature vector (stage, region[, cause]).
/// Any unknown value rejects the whole request.
fn encode_features(
    variant: Variant,
    encoders: &FeatureEncoders,
    stage: &str,
    region: &str,
    cause: Option<(&CategoryEncoder, &str)>,
) -> Result<Vec<f32>, DispatchError> {
    let mut x = Vec::with_capacity(variant.feature_count());
    x.push(encode(variant, "stage", &encoders.stage, stage)?);
    x.push(encode(variant, "region", &encoders.region, region)?);
    if let Some((encoder, value)) = cause {
        x.push(encode(variant, "cause", encoder, value)?);
    }
    Ok(x)
}

fn encode(
    variant: Variant,
    feature: &'static str,
    encoder: &CategoryEncoder,
    value: &str,
) -> Result<f32, DispatchError> {
    encoder
        .encode(value)
        .map(|code| code as f32)
        .map_err(|_| DispatchError::UnknownCategory {
            variant,
            feature,
            value: value.to_string(),
        })
}

/// Predict one output. Classifier errors and panics both become
/// `PredictionFailed` for `output`.
fn run(
    variant: Variant,
    output: &'static str,
    classifier: &dyn Classifier,
    x: &[f32],
) -> Result<usize, DispatchError> {
    let failed = |reason: String| DispatchError::PredictionFailed {
        variant,
        output,
        reason,
    };
    match panic::catch_unwind(AssertUnwindSafe(|| classifier.predict(x))) {
        Ok(Ok(code)) => Ok(code),
        Ok(Err(e)) => Err(failed(e.to_string())),
        Err(payload) => Err(failed(format!(
            "classifier panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn decode(
    variant: Variant,
    output: &'static str,
    encoder: &CategoryEncoder,
    code: usize,
) -> Result<String, DispatchError> {
    encoder
        .decode(code)
        .map(str::to_string)
        .map_err(|_| DispatchError::InvalidCode {
            variant,
            output,
            code,
        })
}

/// Predict, decode, and attach a confidence when the classifier offers one.
fn classify(
    variant: Variant,
    output: &'static str,
    classifier: &dyn Classifier,
    labels: &CategoryEncoder,
    x: &[f32],
) -> Result<(String, Option<f32>), DispatchError> {
    let code = run(variant, output, classifier, x)?;
    let confidence = max_probability(classifier, x);
    let label = decode(variant, output, labels, code)?;
    Ok((label, confidence))
}

/// Highest class probability for the sample. `None` when the classifier has
/// no probability estimate or the estimate fails or panics.
fn max_probability(classifier: &dyn Classifier, x: &[f32]) -> Option<f32> {
    panic::catch_unwind(AssertUnwindSafe(|| classifier.predict_proba(x)))
        .ok()?
        .ok()?
        .into_iter()
        .filter(|p| p.is_finite())
        .reduce(f32::max)
        .map(|p| p.clamp(0.0, 1.0))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
