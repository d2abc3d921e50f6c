use bytelink_builder::DedupStats;
use serde::Serialize;

/// Wall time of one pipeline stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StageTiming {
    pub stage: &'static str,
    pub micros: u64,
}

/// Counters of one link run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct LinkStats {
    pub inputs: usize,
    pub classes: usize,
    pub foreign_classes: usize,
    pub methods: usize,
    pub fields: usize,
    pub code_items: usize,
    pub literal_arrays: usize,
    /// Items in the output container, emitted or not.
    pub items: usize,
    pub output_size: u32,
    pub dedup: DedupStats,
    pub stages: Vec<StageTiming>,
}
