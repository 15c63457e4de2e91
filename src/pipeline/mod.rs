// src/pipeline/mod.rs

pub mod buffer;
pub mod config;
pub mod diagnostics;
pub mod ingest;
pub mod orchestrator;
pub mod unit;

pub use buffer::BufferService;
pub use config::{PipelineConfig, Place};
pub use diagnostics::{Diagnostic, Diagnostics, DropReason, SourceId, Stage, StageCounts};
pub use orchestrator::{Orchestrator, RunSummary, UnitResult};
pub use unit::{PipelineServices, ProcessingUnit, UnitKind, UnitOutcome, UnitReport};
