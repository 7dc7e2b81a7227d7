pub mod config;
pub mod options;
pub mod request;
pub mod result;
pub mod variant;

pub use config::ModelsConfig;
pub use options::Options;
pub use request::{PredictionRequest, normalize_category};
pub use result::{ErrorKind, PredictionResult};
pub use variant::{ParseVariantError, Variant};
