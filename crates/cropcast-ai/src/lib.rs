//! Inference core: label encoders, fitted classifiers, the model registry,
//! variant dispatch, and the option catalogue.

mod artifact;
mod catalogue;
mod classifier;
mod dispatch;
mod encoder;
mod registry;

pub use artifact::{
    ArtifactBundle, ArtifactError, ArtifactSource, CauseAwareModel, DiseaseCauseModel,
    DiseaseModel, FeatureEncoders, ModelArtifact,
};
pub use catalogue::OptionCatalogue;
pub use classifier::{
    CentroidModel, Classifier, ClassifierError, FittedModel, ForestModel, TreeNode,
};
pub use dispatch::{DispatchError, Dispatcher, select_variant};
pub use encoder::{CategoryEncoder, CodecError};
pub use registry::{Registry, RegistryStatus, VariantStatus};
