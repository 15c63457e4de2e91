// src/pipeline/diagnostics.rs

use crate::debug::visualization::svg::dump_polygon_svg;
use crate::geometry::error::ValidationError;
use geo::Polygon;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

/// Pipeline-Stufe, in der ein Element verworfen wurde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Ring,
    Polygon,
    Projection,
    Viewport,
    Simplification,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ring => "ring",
            Stage::Polygon => "polygon",
            Stage::Projection => "projection",
            Stage::Viewport => "viewport",
            Stage::Simplification => "simplification",
        };
        f.write_str(name)
    }
}

/// Warum ein Element verworfen wurde. Alle Varianten sind lokal behebbar.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DropReason {
    #[error("ring has fewer than 3 distinct vertices")]
    DegenerateRing,

    #[error("invalid ring: {0}")]
    InvalidRing(ValidationError),

    #[error("invalid polygon: {0}")]
    InvalidPolygon(ValidationError),

    #[error("geometry is empty")]
    EmptyGeometry,

    #[error("vertex {vertex} could not be reprojected")]
    ProjectionFailure { vertex: usize },

    #[error("simplified polygon is invalid: {0}")]
    SimplificationFailure(ValidationError),

    #[error("bounding box does not intersect the padded viewport")]
    OutsideViewport,
}

impl DropReason {
    /// Stille Verwerfungen werden gezählt, aber nicht als Diagnose gesammelt.
    pub fn is_silent(&self) -> bool {
        matches!(self, DropReason::DegenerateRing | DropReason::OutsideViewport)
    }
}

/// Herkunft eines verworfenen Elements: Record-Index und optional Ring-Index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceId {
    pub record: usize,
    pub ring: Option<usize>,
}

impl SourceId {
    pub fn record(record: usize) -> Self {
        Self { record, ring: None }
    }

    pub fn ring(record: usize, ring: usize) -> Self {
        Self {
            record,
            ring: Some(ring),
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ring {
            Some(ring) => write!(f, "record {}, ring {}", self.record, ring),
            None => write!(f, "record {}", self.record),
        }
    }
}

/// Eine Diagnose: {Stufe, Grund, Herkunft}.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub stage: Stage,
    pub reason: DropReason,
    pub source: SourceId,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.source, self.reason)
    }
}

/// Anzahl verworfener Elemente je Stufe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts(BTreeMap<Stage, usize>);

impl StageCounts {
    pub fn get(&self, stage: Stage) -> usize {
        self.0.get(&stage).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, stage: Stage) {
        *self.0.entry(stage).or_insert(0) += 1;
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn merge(&mut self, other: &StageCounts) {
        for (stage, count) in &other.0 {
            *self.0.entry(*stage).or_insert(0) += count;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stage, usize)> + '_ {
        self.0.iter().map(|(stage, count)| (*stage, *count))
    }
}

/// Diagnosekanal einer Verarbeitungseinheit.
///
/// Jede Verwerfung wird gezählt und geloggt; nicht-stille Verwerfungen werden
/// zusätzlich gesammelt und am Ende der Einheit an den Aufrufer zurückgegeben.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    unit: String,
    entries: Vec<Diagnostic>,
    counts: StageCounts,
    dump_dir: Option<PathBuf>,
    dumped: usize,
}

impl Diagnostics {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            entries: Vec::new(),
            counts: StageCounts::default(),
            dump_dir: None,
            dumped: 0,
        }
    }

    /// Verworfene Polygone zusätzlich als SVG in `dir` ablegen.
    pub fn with_dump_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.dump_dir = dir;
        self
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn record(&mut self, stage: Stage, reason: DropReason, source: SourceId) {
        self.counts.increment(stage);
        if reason.is_silent() {
            debug!(unit = %self.unit, %stage, %source, "Dropping: {}", reason);
            return;
        }
        warn!(unit = %self.unit, %stage, %source, "Skipping: {}", reason);
        self.entries.push(Diagnostic {
            stage,
            reason,
            source,
        });
    }

    /// Wie `record`, legt aber bei gesetztem Dump-Verzeichnis das Polygon als SVG ab.
    pub fn record_polygon(
        &mut self,
        stage: Stage,
        reason: DropReason,
        source: SourceId,
        polygon: &Polygon<f64>,
    ) {
        if let Some(dir) = &self.dump_dir {
            let path = dir.join(format!(
                "{}-{}-{}-{}.svg",
                self.unit, stage, source.record, self.dumped
            ));
            match dump_polygon_svg(&path, polygon, &reason.to_string()) {
                Ok(()) => self.dumped += 1,
                Err(err) => warn!(path = %path.display(), "Could not write debug dump: {}", err),
            }
        }
        self.record(stage, reason, source);
    }

    pub fn counts(&self) -> &StageCounts {
        &self.counts
    }

    pub fn count(&self, stage: Stage) -> usize {
        self.counts.get(stage)
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn dumped(&self) -> usize {
        self.dumped
    }

    pub fn into_parts(self) -> (StageCounts, Vec<Diagnostic>) {
        (self.counts, self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_drops_are_counted_not_collected() {
        let mut diagnostics = Diagnostics::new("test");
        diagnostics.record(Stage::Ring, DropReason::DegenerateRing, SourceId::ring(0, 1));
        diagnostics.record(Stage::Viewport, DropReason::OutsideViewport, SourceId::record(2));
        assert_eq!(diagnostics.count(Stage::Ring), 1);
        assert_eq!(diagnostics.count(Stage::Viewport), 1);
        assert!(diagnostics.entries().is_empty());
    }

    #[test]
    fn test_diagnostic_carries_stage_reason_and_source() {
        let mut diagnostics = Diagnostics::new("test");
        diagnostics.record(
            Stage::Projection,
            DropReason::ProjectionFailure { vertex: 4 },
            SourceId::record(9),
        );
        let entry = &diagnostics.entries()[0];
        assert_eq!(entry.stage, Stage::Projection);
        assert_eq!(entry.source, SourceId::record(9));
        assert_eq!(
            entry.to_string(),
            "[projection] record 9: vertex 4 could not be reprojected"
        );
    }

    #[test]
    fn test_stage_counts_merge() {
        let mut a = StageCounts::default();
        a.increment(Stage::Ring);
        let mut b = StageCounts::default();
        b.increment(Stage::Ring);
        b.increment(Stage::Simplification);
        a.merge(&b);
        assert_eq!(a.get(Stage::Ring), 2);
        assert_eq!(a.get(Stage::Simplification), 1);
        assert_eq!(a.total(), 3);
    }
}
