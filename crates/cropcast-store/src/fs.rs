//! Directory-backed artifact store.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use cropcast_ai::{ArtifactBundle, ArtifactSource, ModelArtifact};
use cropcast_core::{ModelsConfig, Variant};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::StoreError;

/// Artifact store over a models directory containing `model_A.json`,
/// `model_B.json`, and `model_C.json` (any subset may be missing).
///
/// Opening never touches the filesystem; a missing directory simply means
/// every variant is missing.
pub struct ArtifactStore {
    config: ModelsConfig,
}

impl ArtifactStore {
    /// Open a store over `models_dir` with the default naming.
    pub fn open(models_dir: impl Into<PathBuf>) -> Self {
        Self::with_config(ModelsConfig::with_models_dir(models_dir))
    }

    pub fn with_config(config: ModelsConfig) -> Self {
        Self { config }
    }

    pub fn models_dir(&self) -> &Path {
        self.config.models_dir()
    }

    /// Path of a variant's artifact file.
    pub fn path_for(&self, variant: Variant) -> PathBuf {
        self.config.artifact_path(variant)
    }

    /// Variants whose artifact file exists, in A, B, C order.
    pub fn present(&self) -> Vec<Variant> {
        Variant::ALL
            .into_iter()
            .filter(|v| self.path_for(*v).is_file())
            .collect()
    }

    /// Read and parse a variant's persisted bundle.
    ///
    /// This only checks the JSON shape; schema validation happens in
    /// [`ArtifactBundle::into_artifact`].
    pub fn read(&self, variant: Variant) -> Result<ArtifactBundle, StoreError> {
        let path = self.path_for(variant);
        if !path.is_file() {
            return Err(StoreError::ArtifactNotFound(path));
        }
        let reader = BufReader::new(File::open(&path)?);
        let bundle: ArtifactBundle = serde_json::from_reader(reader)?;
        debug!(%variant, path = %path.display(), "read artifact bundle");
        Ok(bundle)
    }

    /// Write a bundle under its own variant's file name.
    ///
    /// The file is written to a temporary file in the models directory and
    /// renamed into place, so readers never see a partial artifact.
    pub fn write(&self, bundle: &ArtifactBundle) -> Result<PathBuf, StoreError> {
        let dir = self.models_dir();
        fs::create_dir_all(dir)?;

        let path = self.path_for(bundle.variant());
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, bundle)?;
            writer.flush()?;
        }
        tmp.persist(&path)?;

        info!(variant = %bundle.variant(), path = %path.display(), "wrote artifact bundle");
        Ok(path)
    }
}

impl ArtifactSource for ArtifactStore {
    fn load(&self, variant: Variant) -> anyhow::Result<ModelArtifact> {
        let bundle = self
            .read(variant)
            .with_context(|| format!("reading model {variant}"))?;
        let artifact = bundle
            .into_artifact(variant)
            .with_context(|| format!("validating model {variant}"))?;
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropcast_ai::{
        CategoryEncoder, CentroidModel, FittedModel, ForestModel, OptionCatalogue, Registry,
        TreeNode,
    };

    fn enc(classes: &[&str]) -> CategoryEncoder {
        CategoryEncoder::fit(classes.iter().copied())
    }

    fn bundle_a() -> ArtifactBundle {
        ArtifactBundle::A {
            model: FittedModel::Forest(ForestModel {
                n_features: 2,
                n_classes: 2,
                trees: vec![TreeNode::split(
                    0,
                    0.5,
                    TreeNode::leaf(vec![4.0, 1.0]),
                    TreeNode::leaf(vec![0.0, 5.0]),
                )],
            }),
            le_stage: enc(&["flowering", "vegetative"]),
            le_region: enc(&["north", "south"]),
            le_disease: enc(&["blight", "rust"]),
        }
    }

    fn bundle_c() -> ArtifactBundle {
        ArtifactBundle::C {
            model: FittedModel::Centroid(CentroidModel {
                centroids: vec![vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]],
            }),
            le_stage: enc(&["flowering", "tillering"]),
            le_region: enc(&["east", "north"]),
            le_cause: enc(&["fungal", "pest"]),
            le_disease: enc(&["leaf spot", "stem borer"]),
        }
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path());

        let path = store.write(&bundle_a()).unwrap();
        assert_eq!(path, dir.path().join("model_A.json"));
        assert_eq!(store.read(Variant::A).unwrap(), bundle_a());
        assert_eq!(store.present(), vec![Variant::A]);
    }

    #[test]
    fn write_creates_models_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("nested").join("models"));
        store.write(&bundle_c()).unwrap();
        assert!(store.path_for(Variant::C).is_file());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path());
        assert!(matches!(
            store.read(Variant::B),
            Err(StoreError::ArtifactNotFound(p)) if p.ends_with("model_B.json")
        ));
    }

    #[test]
    fn missing_dir_means_nothing_present() {
        let store = ArtifactStore::open("/nonexistent/cropcast/models");
        assert!(store.present().is_empty());
    }

    #[test]
    fn garbage_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("model_A.json"), b"\x80not json").unwrap();
        let store = ArtifactStore::open(dir.path());
        assert!(matches!(store.read(Variant::A), Err(StoreError::Json(_))));
    }

    #[test]
    fn source_rejects_misnamed_bundle() {
        let dir = tempfile::tempdir().unwrap();
        // A variant C bundle saved where model A belongs.
        let json = serde_json::to_vec(&bundle_c()).unwrap();
        fs::write(dir.path().join("model_A.json"), json).unwrap();

        let store = ArtifactStore::open(dir.path());
        let err = store.load(Variant::A).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("validating model A"), "{msg}");
        assert!(msg.contains("expected A"), "{msg}");
    }

    #[test]
    fn registry_over_partial_and_corrupt_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path());
        store.write(&bundle_a()).unwrap();
        store.write(&bundle_c()).unwrap();
        // Truncated B artifact.
        fs::write(dir.path().join("model_B.json"), br#"{"variant": "B", "clf_dis"#).unwrap();

        let registry = Registry::load(&store);
        assert_eq!(registry.available(), vec![Variant::A, Variant::C]);
        assert!(registry.load_error(Variant::B).unwrap().contains("reading model B"));

        let opts = OptionCatalogue::collect(&registry);
        assert_eq!(opts.stages, vec!["flowering", "tillering", "vegetative"]);
        assert_eq!(opts.regions, vec!["east", "north", "south"]);
        assert_eq!(opts.causes, vec!["fungal", "pest"]);
    }
}
