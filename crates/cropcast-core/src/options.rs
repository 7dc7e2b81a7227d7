/// Known category values across all loaded artifacts, for populating
/// choice lists. Each list is sorted and duplicate-free.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Options {
    pub stages: Vec<String>,
    pub regions: Vec<String>,
    pub causes: Vec<String>,
}

impl Options {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty() && self.regions.is_empty() && self.causes.is_empty()
    }
}
