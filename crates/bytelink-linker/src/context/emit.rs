//! Layout, patch and write stages.

use std::path::Path;

use bytelink_builder::DedupPasses;
use tracing::{debug, info};

use super::{Context, Stage};
use crate::error::LinkError;

impl Context {
    /// Apply the profile, if any, and place every output item.
    pub fn compute_layout(&mut self) -> bool {
        self.run_stage(Stage::ComputeLayout, |cx| {
            if let Some(profile) = &cx.config.profile {
                let moved = cx.container.apply_profile(profile);
                debug!(moved, "profile applied");
            }
            let size = cx.container.compute_layout();
            debug!(size, "output laid out");
        })
    }

    /// Patch code for the output's indexes.
    ///
    /// Deduplication needs the patched bytes to compare code, so it runs
    /// here; the survivors are laid out and patched again.
    pub fn patch(&mut self) -> bool {
        self.run_stage(Stage::Patch, |cx| {
            let patched = cx.container.patch_code();
            debug!(patched, "code patched");
            if !cx.config.deduplicate {
                return;
            }
            let stats = cx.container.deduplicate_items(DedupPasses::ALL);
            cx.stats.dedup = stats;
            cx.container.compute_layout();
            cx.container.patch_code();
        })
    }

    pub fn write(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        self.run_stage(Stage::Write, |cx| {
            if let Err(e) = cx.container.write_to_file(path) {
                cx.errors.push(LinkError::Write(e));
                return;
            }
            cx.record_output(&path.display().to_string());
        })
    }

    /// Write stage into memory. `None` when the stage did not run or failed.
    pub fn write_to_vec(&mut self) -> Option<Vec<u8>> {
        let mut out = None;
        self.run_stage(Stage::Write, |cx| match cx.container.write_to_vec() {
            Ok(bytes) => {
                out = Some(bytes);
                cx.record_output("<memory>");
            }
            Err(e) => cx.errors.push(LinkError::Write(e)),
        });
        out
    }

    fn record_output(&mut self, output: &str) {
        let size = self.container.layout().map_or(0, |l| l.file_size());
        self.stats.output_size = size;
        info!(output, size, inputs = self.inputs.len(), "linked");
    }
}
