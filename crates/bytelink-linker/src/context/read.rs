//! Read stage: open and validate inputs.

use std::path::Path;

use bytelink_format::File;
use rayon::prelude::*;
use tracing::{debug, warn};

use super::{Context, Stage};
use crate::error::LinkError;

impl Context {
    /// Open every path in parallel. Inputs keep the order of `paths`.
    pub fn read<P>(&mut self, paths: &[P]) -> bool
    where
        P: AsRef<Path> + Sync,
    {
        self.run_stage(Stage::Read, |cx| {
            let opened: Vec<Result<File, LinkError>> =
                paths.par_iter().map(|p| open_input(p.as_ref())).collect();
            for input in opened {
                cx.accept(input);
            }
        })
    }

    /// Add an input held in memory.
    pub fn read_bytes(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> bool {
        let name = name.into();
        self.run_stage(Stage::Read, |cx| {
            let input = File::from_bytes(name.clone(), bytes)
                .map_err(|source| LinkError::Read { path: name, source });
            cx.accept(input);
        })
    }

    fn accept(&mut self, input: Result<File, LinkError>) {
        match input {
            Ok(file) => {
                debug!(
                    input = file.name(),
                    size = file.header().file_size,
                    classes = file.header().num_classes,
                    "input accepted"
                );
                self.inputs.push(file);
            }
            Err(error) => {
                warn!(%error, "input rejected");
                self.errors.push(error);
            }
        }
    }
}

fn open_input(path: &Path) -> Result<File, LinkError> {
    File::open(path).map_err(|source| LinkError::Read {
        path: path.display().to_string(),
        source,
    })
}
