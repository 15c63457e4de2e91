// src/pipeline/buffer.rs

use crate::geometry::error::PipelineResult;
use crate::geometry::types::PolygonalGeometry;
use geo::MultiPolygon;

/// Geodätische Pufferung um eine Distanz in Metern: `buffer(geometry, distance) -> geometry`.
///
/// Der Algorithmus selbst liegt außerhalb dieses Crates; das Ergebnis wird
/// wie jedes Aggregat erneut geprüft, bevor es gespeichert wird.
pub trait BufferService: Send + Sync {
    fn buffer(&self, geometry: &MultiPolygon<f64>, distance_m: f64) -> PipelineResult<PolygonalGeometry>;
}
