use bytelink_format::{MAX_INDEX_16, Version};

/// Settings threaded through an [`ItemContainer`](crate::ItemContainer).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Version written to the header.
    pub version: Version,
    /// Capacity of each per-kind region table.
    pub index_capacity: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            version: Version::CURRENT,
            index_capacity: MAX_INDEX_16,
        }
    }
}

impl ContainerConfig {
    pub fn with_index_capacity(mut self, capacity: usize) -> Self {
        assert!(
            (1..=MAX_INDEX_16).contains(&capacity),
            "index capacity must be in 1..={MAX_INDEX_16}, got {capacity}"
        );
        self.index_capacity = capacity;
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }
}
