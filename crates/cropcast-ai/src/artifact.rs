//! Model artifacts: a variant's fitted classifier(s) plus the encoders for
//! its inputs and outputs.
//!
//! [`ArtifactBundle`] is the persisted form written by the training job.
//! [`ModelArtifact`] is the validated, immutable in-memory form. Conversion is
//! all-or-nothing: a bundle either becomes a complete artifact or an error.

use std::sync::Arc;

use cropcast_core::Variant;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::{Classifier, ClassifierError, FittedModel};
use crate::encoder::CategoryEncoder;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("bundle is for variant {found}, expected {expected}")]
    VariantMismatch { expected: Variant, found: Variant },

    #[error("{role} expects {got} features, variant {variant} supplies {expected}")]
    FeatureWidth {
        variant: Variant,
        role: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{role} predicts {classes} classes but its {output} encoder has {labels} labels")]
    ClassCount {
        role: &'static str,
        output: &'static str,
        classes: usize,
        labels: usize,
    },

    #[error("{role} encoder has an empty vocabulary")]
    EmptyVocabulary { role: &'static str },

    #[error("invalid {role}: {source}")]
    InvalidClassifier {
        role: &'static str,
        #[source]
        source: ClassifierError,
    },
}

/// Anything that can produce a loaded artifact for a variant.
///
/// Implementations may fail for any reason (missing file, bad JSON, schema
/// mismatch); the [`Registry`](crate::Registry) turns every failure into an
/// absent slot.
pub trait ArtifactSource {
    fn load(&self, variant: Variant) -> anyhow::Result<ModelArtifact>;
}

// ── Persisted form ──

/// On-disk artifact layout, tagged by `variant`.
///
/// Field names follow the training job's output (`le_*` for label
/// encoders).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant")]
pub enum ArtifactBundle {
    A {
        model: FittedModel,
        le_stage: CategoryEncoder,
        le_region: CategoryEncoder,
        le_disease: CategoryEncoder,
    },
    B {
        clf_disease: FittedModel,
        clf_cause: FittedModel,
        le_stage: CategoryEncoder,
        le_region: CategoryEncoder,
        le_disease: CategoryEncoder,
        le_cause: CategoryEncoder,
    },
    C {
        model: FittedModel,
        le_stage: CategoryEncoder,
        le_region: CategoryEncoder,
        le_cause: CategoryEncoder,
        le_disease: CategoryEncoder,
    },
}

impl ArtifactBundle {
    pub fn variant(&self) -> Variant {
        match self {
            Self::A { .. } => Variant::A,
            Self::B { .. } => Variant::B,
            Self::C { .. } => Variant::C,
        }
    }

    /// Validate the bundle against `expected` and build the in-memory
    /// artifact.
    pub fn into_artifact(self, expected: Variant) -> Result<ModelArtifact, ArtifactError> {
        let found = self.variant();
        if found != expected {
            return Err(ArtifactError::VariantMismatch { expected, found });
        }

        match self {
            Self::A {
                model,
                le_stage,
                le_region,
                le_disease,
            } => {
                let features = FeatureEncoders::new(le_stage, le_region)?;
                non_empty("disease", &le_disease)?;
                let classifier = checked(Variant::A, "model", model, ("disease", &le_disease))?;
                Ok(ModelArtifact::A(DiseaseModel {
                    features,
                    disease: le_disease,
                    classifier,
                }))
            }
            Self::B {
                clf_disease,
                clf_cause,
                le_stage,
                le_region,
                le_disease,
                le_cause,
            } => {
                let features = FeatureEncoders::new(le_stage, le_region)?;
                non_empty("disease", &le_disease)?;
                non_empty("cause", &le_cause)?;
                let disease_classifier =
                    checked(Variant::B, "clf_disease", clf_disease, ("disease", &le_disease))?;
                let cause_classifier =
                    checked(Variant::B, "clf_cause", clf_cause, ("cause", &le_cause))?;
                Ok(ModelArtifact::B(DiseaseCauseModel {
                    features,
                    disease: le_disease,
                    cause: le_cause,
                    disease_classifier,
                    cause_classifier,
                }))
            }
            Self::C {
                model,
                le_stage,
                le_region,
                le_cause,
                le_disease,
            } => {
                let features = FeatureEncoders::new(le_stage, le_region)?;
                non_empty("cause", &le_cause)?;
                non_empty("disease", &le_disease)?;
                let classifier = checked(Variant::C, "model", model, ("disease", &le_disease))?;
                Ok(ModelArtifact::C(CauseAwareModel {
                    features,
                    cause: le_cause,
                    disease: le_disease,
                    classifier,
                }))
            }
        }
    }
}

fn non_empty(role: &'static str, encoder: &CategoryEncoder) -> Result<(), ArtifactError> {
    if encoder.is_empty() {
        return Err(ArtifactError::EmptyVocabulary { role });
    }
    Ok(())
}

/// Validate `model` against the variant's feature width and the vocabulary
/// its class indices decode through.
fn checked(
    variant: Variant,
    role: &'static str,
    model: FittedModel,
    (output, labels): (&'static str, &CategoryEncoder),
) -> Result<Arc<dyn Classifier>, ArtifactError> {
    model
        .validate()
        .map_err(|source| ArtifactError::InvalidClassifier { role, source })?;
    let expected = variant.feature_count();
    let got = model.n_features();
    if got != expected {
        return Err(ArtifactError::FeatureWidth {
            variant,
            role,
            expected,
            got,
        });
    }
    if model.n_classes() != labels.len() {
        return Err(ArtifactError::ClassCount {
            role,
            output,
            classes: model.n_classes(),
            labels: labels.len(),
        });
    }
    let classifier: Arc<dyn Classifier> = Arc::new(model);
    Ok(classifier)
}

// ── In-memory form ──

/// Stage and region encoders, shared by every variant's feature layout.
#[derive(Debug, Clone)]
pub struct FeatureEncoders {
    pub stage: CategoryEncoder,
    pub region: CategoryEncoder,
}

impl FeatureEncoders {
    pub fn new(stage: CategoryEncoder, region: CategoryEncoder) -> Result<Self, ArtifactError> {
        non_empty("stage", &stage)?;
        non_empty("region", &region)?;
        Ok(Self { stage, region })
    }
}

/// Variant A: stage + region → disease.
#[derive(Debug, Clone)]
pub struct DiseaseModel {
    pub features: FeatureEncoders,
    pub disease: CategoryEncoder,
    pub classifier: Arc<dyn Classifier>,
}

/// Variant B: stage + region → disease and cause, from two classifiers
/// fitted independently on the same encoded features.
#[derive(Debug, Clone)]
pub struct DiseaseCauseModel {
    pub features: FeatureEncoders,
    pub disease: CategoryEncoder,
    pub cause: CategoryEncoder,
    pub disease_classifier: Arc<dyn Classifier>,
    pub cause_classifier: Arc<dyn Classifier>,
}

/// Variant C: stage + region + cause → disease.
#[derive(Debug, Clone)]
pub struct CauseAwareModel {
    pub features: FeatureEncoders,
    /// Input encoder for the cause feature.
    pub cause: CategoryEncoder,
    pub disease: CategoryEncoder,
    pub classifier: Arc<dyn Classifier>,
}

/// A fully loaded, immutable model artifact.
#[derive(Debug, Clone)]
pub enum ModelArtifact {
    A(DiseaseModel),
    B(DiseaseCauseModel),
    C(CauseAwareModel),
}

impl ModelArtifact {
    pub fn variant(&self) -> Variant {
        match self {
            Self::A(_) => Variant::A,
            Self::B(_) => Variant::B,
            Self::C(_) => Variant::C,
        }
    }

    pub fn features(&self) -> &FeatureEncoders {
        match self {
            Self::A(m) => &m.features,
            Self::B(m) => &m.features,
            Self::C(m) => &m.features,
        }
    }

    /// Every cause encoder this artifact owns, input or output.
    pub fn cause_encoder(&self) -> Option<&CategoryEncoder> {
        match self {
            Self::A(_) => None,
            Self::B(m) => Some(&m.cause),
            Self::C(m) => Some(&m.cause),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small hand-fitted artifacts shared by the registry, dispatch, and
    //! catalogue tests.

    use super::*;
    use crate::classifier::{CentroidModel, ForestModel, TreeNode};

    pub fn enc(classes: &[&str]) -> CategoryEncoder {
        CategoryEncoder::new(classes.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    /// Forest over stage codes {flowering=0, vegetative=1}:
    /// flowering → class 0 (p=0.75), vegetative → class 1 (p=1.0).
    pub fn stage_forest(n_features: usize) -> FittedModel {
        FittedModel::Forest(ForestModel {
            n_features,
            n_classes: 2,
            trees: vec![
                TreeNode::split(
                    0,
                    0.5,
                    TreeNode::leaf(vec![1.0, 0.0]),
                    TreeNode::leaf(vec![0.0, 1.0]),
                ),
                TreeNode::split(
                    0,
                    0.5,
                    TreeNode::leaf(vec![1.0, 1.0]),
                    TreeNode::leaf(vec![0.0, 2.0]),
                ),
            ],
        })
    }

    pub fn bundle_a() -> ArtifactBundle {
        ArtifactBundle::A {
            model: stage_forest(2),
            le_stage: enc(&["flowering", "vegetative"]),
            le_region: enc(&["north", "south"]),
            le_disease: enc(&["blight", "rust"]),
        }
    }

    pub fn bundle_b() -> ArtifactBundle {
        ArtifactBundle::B {
            clf_disease: stage_forest(2),
            // Region code picks the cause: north → bacterial, south → fungal.
            clf_cause: FittedModel::Centroid(CentroidModel {
                centroids: vec![vec![0.5, 0.0], vec![0.5, 1.0]],
            }),
            le_stage: enc(&["flowering", "vegetative"]),
            le_region: enc(&["north", "south"]),
            le_disease: enc(&["mildew", "wilt"]),
            le_cause: enc(&["bacterial", "fungal"]),
        }
    }

    pub fn bundle_c() -> ArtifactBundle {
        ArtifactBundle::C {
            // Nearest centroid on (stage, region, cause); no probabilities.
            model: FittedModel::Centroid(CentroidModel {
                centroids: vec![vec![0.0, 1.0, 1.0], vec![2.0, 0.0, 0.0]],
            }),
            le_stage: enc(&["flowering", "seedling", "vegetative"]),
            le_region: enc(&["north", "south"]),
            le_cause: enc(&["fungal", "pest"]),
            le_disease: enc(&["leaf spot", "aphid damage"]),
        }
    }

    pub fn artifact(bundle: ArtifactBundle) -> ModelArtifact {
        let variant = bundle.variant();
        bundle.into_artifact(variant).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::classifier::{CentroidModel, ForestModel, TreeNode};

    #[test]
    fn bundles_convert_to_matching_variant() {
        assert_eq!(artifact(bundle_a()).variant(), Variant::A);
        assert_eq!(artifact(bundle_b()).variant(), Variant::B);
        assert_eq!(artifact(bundle_c()).variant(), Variant::C);
    }

    #[test]
    fn variant_mismatch_rejected() {
        let err = bundle_a().into_artifact(Variant::C).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::VariantMismatch {
                expected: Variant::C,
                found: Variant::A
            }
        ));
    }

    #[test]
    fn feature_width_must_match_variant() {
        let bundle = ArtifactBundle::C {
            model: stage_forest(2),
            le_stage: enc(&["flowering"]),
            le_region: enc(&["north"]),
            le_cause: enc(&["fungal"]),
            le_disease: enc(&["blight", "rust"]),
        };
        let err = bundle.into_artifact(Variant::C).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::FeatureWidth {
                variant: Variant::C,
                expected: 3,
                got: 2,
                ..
            }
        ));
    }

    #[test]
    fn invalid_classifier_rejected() {
        let bundle = ArtifactBundle::A {
            model: FittedModel::Forest(ForestModel {
                n_features: 2,
                n_classes: 2,
                trees: vec![],
            }),
            le_stage: enc(&["flowering"]),
            le_region: enc(&["north"]),
            le_disease: enc(&["blight"]),
        };
        let err = bundle.into_artifact(Variant::A).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::InvalidClassifier {
                role: "model",
                source: ClassifierError::EmptyModel
            }
        ));
    }

    #[test]
    fn forest_class_count_must_match_labels() {
        let bundle = ArtifactBundle::A {
            model: FittedModel::Forest(ForestModel {
                n_features: 2,
                n_classes: 3,
                trees: vec![TreeNode::leaf(vec![1.0, 1.0, 1.0])],
            }),
            le_stage: enc(&["flowering"]),
            le_region: enc(&["north"]),
            le_disease: enc(&["blight", "rust"]),
        };
        let err = bundle.into_artifact(Variant::A).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::ClassCount {
                role: "model",
                output: "disease",
                classes: 3,
                labels: 2
            }
        ));
    }

    #[test]
    fn cause_classifier_checked_against_cause_labels() {
        let mut bundle = bundle_b();
        if let ArtifactBundle::B { le_cause, .. } = &mut bundle {
            *le_cause = enc(&["bacterial", "fungal", "viral"]);
        }
        let err = bundle.into_artifact(Variant::B).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::ClassCount {
                role: "clf_cause",
                output: "cause",
                classes: 2,
                labels: 3
            }
        ));
    }

    #[test]
    fn unreachable_bad_leaf_rejected_at_load() {
        let bundle = ArtifactBundle::A {
            model: FittedModel::Forest(ForestModel {
                n_features: 2,
                n_classes: 2,
                trees: vec![TreeNode::split(
                    0,
                    0.5,
                    TreeNode::leaf(vec![3.0, -1.0]),
                    TreeNode::leaf(vec![0.0, 1.0]),
                )],
            }),
            le_stage: enc(&["flowering"]),
            le_region: enc(&["north"]),
            le_disease: enc(&["blight", "rust"]),
        };
        let err = bundle.into_artifact(Variant::A).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::InvalidClassifier {
                role: "model",
                source: ClassifierError::InvalidWeight(_)
            }
        ));
    }

    #[test]
    fn empty_vocabulary_rejected() {
        let bundle = ArtifactBundle::B {
            clf_disease: stage_forest(2),
            clf_cause: FittedModel::Centroid(CentroidModel {
                centroids: vec![vec![0.0, 0.0]],
            }),
            le_stage: enc(&["flowering"]),
            le_region: enc(&["north"]),
            le_disease: enc(&["blight"]),
            le_cause: enc(&[]),
        };
        let err = bundle.into_artifact(Variant::B).unwrap_err();
        assert!(matches!(err, ArtifactError::EmptyVocabulary { role: "cause" }));
    }

    #[test]
    fn bundle_json_is_tagged_by_variant() {
        let json = serde_json::to_value(bundle_b()).unwrap();
        assert_eq!(json["variant"], "B");
        assert_eq!(json["le_cause"]["classes"][1], "fungal");
        assert_eq!(json["clf_cause"]["kind"], "centroid");

        let parsed: ArtifactBundle = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, bundle_b());
    }

    #[test]
    fn cause_encoder_per_variant() {
        assert!(artifact(bundle_a()).cause_encoder().is_none());
        assert_eq!(
            artifact(bundle_b()).cause_encoder().unwrap().classes(),
            &["bacterial", "fungal"]
        );
        assert_eq!(
            artifact(bundle_c()).cause_encoder().unwrap().classes(),
            &["fungal", "pest"]
        );
    }
}
