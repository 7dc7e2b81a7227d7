//! The model registry: one optional artifact per variant, fixed at startup.
//!
//! Loading is eager and isolated. Each variant is loaded independently; any
//! failure leaves that slot empty and is recorded for status reporting. After
//! construction the registry is read-only and can be shared across threads
//! behind an `Arc` without locking.

use chrono::{DateTime, Utc};
use cropcast_core::Variant;
use serde::Serialize;
use tracing::{info, warn};

use crate::artifact::{ArtifactSource, ModelArtifact};

#[derive(Debug)]
struct Slot {
    artifact: Option<ModelArtifact>,
    load_error: Option<String>,
}

impl Slot {
    fn empty() -> Self {
        Self {
            artifact: None,
            load_error: None,
        }
    }
}

/// Read-only collection of loaded artifacts keyed by variant.
#[derive(Debug)]
pub struct Registry {
    slots: [Slot; 3],
    loaded_at: DateTime<Utc>,
}

/// Availability of one variant, as reported to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantStatus {
    pub variant: Variant,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Snapshot of the registry's load outcome.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStatus {
    pub loaded_at: DateTime<Utc>,
    pub variants: Vec<VariantStatus>,
}

impl Registry {
    /// Load every known variant from `source`.
    ///
    /// Never fails: a variant whose load errors is recorded absent and the
    /// remaining variants load as normal.
    pub fn load(source: &dyn ArtifactSource) -> Self {
        let mut slots = [Slot::empty(), Slot::empty(), Slot::empty()];

        for variant in Variant::ALL {
            let slot = &mut slots[variant.index()];
            match source.load(variant) {
                Ok(artifact) if artifact.variant() == variant => {
                    info!(%variant, "loaded model artifact");
                    slot.artifact = Some(artifact);
                }
                Ok(artifact) => {
                    let found = artifact.variant();
                    warn!(%variant, %found, "source returned artifact for wrong variant");
                    slot.load_error =
                        Some(format!("source returned variant {found} for {variant}"));
                }
                Err(e) => {
                    let message = format!("{e:#}");
                    warn!(%variant, error = %message, "model artifact unavailable");
                    slot.load_error = Some(message);
                }
            }
        }

        let registry = Self {
            slots,
            loaded_at: Utc::now(),
        };
        info!(
            available = registry.available().len(),
            total = Variant::ALL.len(),
            "model registry ready"
        );
        registry
    }

    /// Build a registry directly from already-loaded artifacts. Variants not
    /// supplied are absent. A later artifact for the same variant replaces an
    /// earlier one.
    pub fn from_artifacts(artifacts: impl IntoIterator<Item = ModelArtifact>) -> Self {
        let mut slots = [Slot::empty(), Slot::empty(), Slot::empty()];
        for artifact in artifacts {
            let slot = artifact.variant().index();
            slots[slot].artifact = Some(artifact);
        }
        Self {
            slots,
            loaded_at: Utc::now(),
        }
    }

    /// The loaded artifact for `variant`, if any.
    pub fn get(&self, variant: Variant) -> Option<&ModelArtifact> {
        self.slots[variant.index()].artifact.as_ref()
    }

    pub fn is_available(&self, variant: Variant) -> bool {
        self.get(variant).is_some()
    }

    /// Variants with a loaded artifact, in A, B, C order.
    pub fn available(&self) -> Vec<Variant> {
        Variant::ALL
            .into_iter()
            .filter(|v| self.is_available(*v))
            .collect()
    }

    /// Loaded artifacts in A, B, C order.
    pub fn artifacts(&self) -> impl Iterator<Item = &ModelArtifact> {
        self.slots.iter().filter_map(|s| s.artifact.as_ref())
    }

    /// Why `variant` failed to load, when it did.
    pub fn load_error(&self, variant: Variant) -> Option<&str> {
        self.slots[variant.index()].load_error.as_deref()
    }

    pub fn status(&self) -> RegistryStatus {
        RegistryStatus {
            loaded_at: self.loaded_at,
            variants: Variant::ALL
                .into_iter()
                .map(|variant| VariantStatus {
                    variant,
                    available: self.is_available(variant),
                    error: self.load_error(variant).map(str::to_string),
                })
                .collect(),
        }
    }
}
