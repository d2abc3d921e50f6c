use std::collections::BTreeSet;

use bytelink_builder::{ContainerConfig, Profile};

/// Options of one link run.
#[derive(Clone, Debug)]
pub struct LinkerConfig {
    /// Drop debug info and line number programs from the output.
    pub strip_debug_info: bool,
    /// Classes that may be defined by several inputs; their members are
    /// unioned.
    pub partial: BTreeSet<String>,
    /// Run the dedup passes after patching.
    pub deduplicate: bool,
    pub container: ContainerConfig,
    /// Hot/cold ordering applied before layout.
    pub profile: Option<Profile>,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            strip_debug_info: false,
            partial: BTreeSet::new(),
            deduplicate: true,
            container: ContainerConfig::default(),
            profile: None,
        }
    }
}

impl LinkerConfig {
    pub fn is_partial(&self, class: &str) -> bool {
        self.partial.contains(class)
    }
}
