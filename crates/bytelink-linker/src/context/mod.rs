//! Link pipeline state.
//!
//! A [`Context`] owns the validated inputs, the output container and the
//! per-input translation maps from input entity ids to output items. Stages
//! are methods returning `true` when the pipeline may continue.

mod emit;
mod merge;
mod parse;
mod read;


use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Instant;

use bytelink_builder::items::Item;
use bytelink_builder::{ItemContainer, ItemId};
use bytelink_format::{EntityId, File};
use tracing::debug;

use crate::config::LinkerConfig;
use crate::error::LinkError;
use crate::stats::{LinkStats, StageTiming};

/// Pipeline stages in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Read,
    Merge,
    Parse,
    ComputeLayout,
    Patch,
    Write,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Read => "read",
            Stage::Merge => "merge",
            Stage::Parse => "parse",
            Stage::ComputeLayout => "compute_layout",
            Stage::Patch => "patch",
            Stage::Write => "write",
        }
    }

    fn next(self) -> Option<Stage> {
        Some(match self {
            Stage::Read => Stage::Merge,
            Stage::Merge => Stage::Parse,
            Stage::Parse => Stage::ComputeLayout,
            Stage::ComputeLayout => Stage::Patch,
            Stage::Patch => Stage::Write,
            Stage::Write => return None,
        })
    }

    /// Read may repeat; every other stage runs once, right after its
    /// predecessor.
    fn can_follow(self, completed: Option<Stage>) -> bool {
        match (completed, self) {
            (None | Some(Stage::Read), Stage::Read) => true,
            (Some(prev), next) => prev.next() == Some(next),
            (None, _) => false,
        }
    }
}

/// Translation of one input's entity ids into output items.
#[derive(Debug, Default)]
struct InputMap {
    classes: HashMap<EntityId, ItemId>,
    members: HashMap<EntityId, ItemId>,
    /// Foreign member references already reported as errors.
    unresolved: HashSet<EntityId>,
    protos: HashMap<EntityId, ItemId>,
    debug_info: HashMap<EntityId, ItemId>,
    line_programs: HashMap<EntityId, ItemId>,
    literals: HashMap<EntityId, ItemId>,
    annotations: HashMap<EntityId, ItemId>,
    arrays: HashMap<EntityId, ItemId>,
}

/// Outcome of [`link`].
#[derive(Debug, Default)]
pub struct LinkResult {
    pub errors: Vec<LinkError>,
    pub stats: LinkStats,
}

impl LinkResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct Context {
    config: LinkerConfig,
    container: ItemContainer,
    inputs: Vec<File>,
    maps: Vec<InputMap>,
    /// Input that first defined each local class, by mangled name.
    definers: HashMap<String, usize>,
    /// Input that declared each output member.
    member_owners: HashMap<ItemId, usize>,
    errors: Vec<LinkError>,
    stats: LinkStats,
    completed: Option<Stage>,
}

impl Context {
    pub fn new(config: LinkerConfig) -> Self {
        let container = ItemContainer::new(config.container);
        Self {
            config,
            container,
            inputs: Vec::new(),
            maps: Vec::new(),
            definers: HashMap::new(),
            member_owners: HashMap::new(),
            errors: Vec::new(),
            stats: LinkStats::default(),
            completed: None,
        }
    }

    pub fn config(&self) -> &LinkerConfig {
        &self.config
    }

    pub fn container(&self) -> &ItemContainer {
        &self.container
    }

    pub fn inputs(&self) -> &[File] {
        &self.inputs
    }

    pub fn errors(&self) -> &[LinkError] {
        &self.errors
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    /// Last stage that ran to completion.
    pub fn completed(&self) -> Option<Stage> {
        self.completed
    }

    /// Consume the context, returning its errors and final counters.
    pub fn finish(mut self) -> LinkResult {
        self.count_items();
        LinkResult {
            errors: self.errors,
            stats: self.stats,
        }
    }

    /// Run `stage` unless an earlier stage failed.
    ///
    /// # Panics
    /// If `stage` does not directly follow the last completed stage.
    fn run_stage(&mut self, stage: Stage, run: impl FnOnce(&mut Self)) -> bool {
        if !self.errors.is_empty() {
            debug!(stage = stage.name(), "skipped after errors");
            return false;
        }
        assert!(
            stage.can_follow(self.completed),
            "link stage `{}` run out of order (last completed: {:?})",
            stage.name(),
            self.completed.map(Stage::name)
        );

        let start = Instant::now();
        run(self);
        let micros = start.elapsed().as_micros() as u64;
        self.completed = Some(stage);
        self.stats.stages.push(StageTiming {
            stage: stage.name(),
            micros,
        });
        debug!(
            stage = stage.name(),
            micros,
            errors = self.errors.len(),
            "stage finished"
        );
        self.errors.is_empty()
    }

    fn count_items(&mut self) {
        let c = &self.container;
        let stats = &mut self.stats;
        stats.inputs = self.inputs.len();
        stats.classes = 0;
        stats.foreign_classes = 0;
        stats.fields = 0;
        for (_, class) in c.classes() {
            if c.is_foreign(class) {
                stats.foreign_classes += 1;
            } else {
                stats.classes += 1;
                stats.fields += c.items().class(class).fields.len();
            }
        }
        stats.methods = c.methods().len();
        stats.code_items = 0;
        stats.literal_arrays = 0;
        for id in c.emitted_items() {
            match c.items().get(id) {
                Item::Code(_) => stats.code_items += 1,
                Item::LiteralArray(_) => stats.literal_arrays += 1,
                _ => {}
            }
        }
        stats.items = c.items().len();
    }
}

/// Link `inputs` into a single file at `output`.
///
/// Never fails early: every error the pipeline records ends up in the
/// result, and no output is written when there are any.
pub fn link<P>(config: LinkerConfig, inputs: &[P], output: impl AsRef<Path>) -> LinkResult
where
    P: AsRef<Path> + Sync,
{
    let mut cx = Context::new(config);
    let linked = cx.read(inputs)
        && cx.merge()
        && cx.parse()
        && cx.compute_layout()
        && cx.patch()
        && cx.write(output);
    debug!(linked, "link finished");
    cx.finish()
}
