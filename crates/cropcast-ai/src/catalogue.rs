//! Choice lists for presentation layers: the union of every loaded
//! artifact's vocabularies.

use std::collections::BTreeSet;

use cropcast_core::Options;

use crate::registry::Registry;

/// Builds [`Options`] from a registry.
pub struct OptionCatalogue;

impl OptionCatalogue {
    /// Sorted, de-duplicated stages, regions, and causes across all loaded
    /// artifacts. Absent variants contribute nothing.
    pub fn collect(registry: &Registry) -> Options {
        let mut stages = BTreeSet::new();
        let mut regions = BTreeSet::new();
        let mut causes = BTreeSet::new();

        for artifact in registry.artifacts() {
            let features = artifact.features();
            stages.extend(features.stage.classes().iter().cloned());
            regions.extend(features.region.classes().iter().cloned());
            if let Some(cause) = artifact.cause_encoder() {
                causes.extend(cause.classes().iter().cloned());
            }
        }

        Options {
            stages: stages.into_iter().collect(),
            regions: regions.into_iter().collect(),
            causes: causes.into_iter().collect(),
        }
    }
}
