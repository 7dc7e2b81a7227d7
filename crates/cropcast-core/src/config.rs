//! Shared configuration: where model artifacts live and how they are named.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Variant;

/// Default directory the training job writes artifacts into.
pub const DEFAULT_MODELS_DIR: &str = "models";

/// Location and naming of persisted model artifacts.
///
/// Artifacts are named `{prefix}{variant}.{extension}`, i.e. `model_A.json`
/// with the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub models_dir: PathBuf,
    pub file_prefix: String,
    pub extension: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            file_prefix: "model_".to_string(),
            extension: "json".to_string(),
        }
    }
}

impl ModelsConfig {
    pub fn with_models_dir(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            ..Self::default()
        }
    }

    /// File name of a variant's artifact, e.g. `model_B.json`.
    pub fn file_name(&self, variant: Variant) -> String {
        format!("{}{}.{}", self.file_prefix, variant, self.extension)
    }

    /// Full path of a variant's artifact.
    pub fn artifact_path(&self, variant: Variant) -> PathBuf {
        self.models_dir.join(self.file_name(variant))
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_naming() {
        let cfg = ModelsConfig::default();
        assert_eq!(cfg.file_name(Variant::A), "model_A.json");
        assert_eq!(
            cfg.artifact_path(Variant::C),
            PathBuf::from("models").join("model_C.json")
        );
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: ModelsConfig = serde_json::from_str(r#"{"models_dir": "/srv/models"}"#).unwrap();
        assert_eq!(cfg.models_dir, PathBuf::from("/srv/models"));
        assert_eq!(cfg.file_prefix, "model_");
        assert_eq!(cfg.extension, "json");
    }
}
