// src/pipeline/unit.rs

use crate::geometry::error::{PipelineError, PipelineResult};
use crate::geometry::operations::{
    AggregationMode, BooleanUnion, GeometryAggregator, PreservingDouglasPeucker, Simplifier,
    UnionService,
};
use crate::geometry::projection::{GridExtent, NationalGrid, Reproject};
use crate::io::GeometryStore;
use crate::pipeline::buffer::BufferService;
use crate::pipeline::config::{PipelineConfig, Place};
use crate::pipeline::diagnostics::{Diagnostic, Diagnostics, StageCounts};
use crate::pipeline::ingest::ShapefileIngest;
use geo::MultiPolygon;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Externe Dienste, die alle Verarbeitungseinheiten gemeinsam (nur lesend) nutzen.
#[derive(Clone)]
pub struct PipelineServices {
    pub reproject: Arc<dyn Reproject>,
    pub simplifier: Arc<dyn Simplifier>,
    pub union: Arc<dyn UnionService>,
    /// Ohne Pufferdienst werden keine Distanzbänder berechnet.
    pub buffer: Option<Arc<dyn BufferService>>,
}

impl PipelineServices {
    /// National Grid, topologieerhaltendes Douglas-Peucker, geo-Vereinigung; kein Pufferdienst.
    pub fn new(extent: GridExtent) -> Self {
        Self {
            reproject: Arc::new(NationalGrid::new(extent)),
            simplifier: Arc::new(PreservingDouglasPeucker),
            union: Arc::new(BooleanUnion),
            buffer: None,
        }
    }

    pub fn with_buffer(mut self, buffer: Arc<dyn BufferService>) -> Self {
        self.buffer = Some(buffer);
        self
    }
}

impl fmt::Debug for PipelineServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineServices")
            .field("buffer", &self.buffer.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitKind {
    /// Rohdaten aller Quellen einlesen und vereinigen.
    Ingest,
    /// Basisgeometrie um `distance_m` puffern.
    Band { distance_m: f64 },
}

/// Eine unabhängige Verarbeitungseinheit: ein Ort und entweder die
/// Rohdaten-Aufnahme oder ein Distanzband.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingUnit {
    pub place: Place,
    pub kind: UnitKind,
    pub output: PathBuf,
}

/// Ergebnis einer Einheit, an den Aufrufer zurückgegeben.
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub name: String,
    pub output: PathBuf,
    pub polygons: usize,
    pub counts: StageCounts,
    pub diagnostics: Vec<Diagnostic>,
    /// Ausgabe existierte bereits und wurde geladen statt neu berechnet.
    pub cached: bool,
}

#[derive(Debug, Clone)]
pub struct UnitOutcome {
    pub report: UnitReport,
    pub geometry: MultiPolygon<f64>,
}

impl ProcessingUnit {
    pub fn ingest(place: &Place, config: &PipelineConfig) -> Self {
        Self {
            place: place.clone(),
            kind: UnitKind::Ingest,
            output: config.output_dir.join(format!("{}.geojson", place.stub)),
        }
    }

    pub fn band(place: &Place, distance_m: f64, config: &PipelineConfig) -> Self {
        Self {
            place: place.clone(),
            kind: UnitKind::Band { distance_m },
            output: config
                .output_dir
                .join(format!("{}{:04.0}m.geojson", place.stub, distance_m)),
        }
    }

    pub fn name(&self) -> String {
        match self.kind {
            UnitKind::Ingest => self.place.stub.clone(),
            UnitKind::Band { distance_m } => format!("{}{:04.0}m", self.place.stub, distance_m),
        }
    }

    /// Führt die Einheit aus. Band-Einheiten brauchen die Basisgeometrie ihres Ortes.
    pub fn run(
        &self,
        config: &PipelineConfig,
        services: &PipelineServices,
        base: Option<&MultiPolygon<f64>>,
    ) -> PipelineResult<UnitOutcome> {
        let name = self.name();
        let mut diagnostics = Diagnostics::new(name.clone()).with_dump_dir(config.debug_dump_dir.clone());
        let store = GeometryStore::new(config.store);

        let cached = self.output.exists();
        let geometry = if cached {
            info!(unit = %name, path = %self.output.display(), "Reusing existing output");
            store.load(&self.output, &mut diagnostics)?
        } else {
            let geometry = self.compute(config, services, base, &mut diagnostics)?;
            store.save(&self.output, &geometry)?;
            geometry
        };

        let (counts, entries) = diagnostics.into_parts();
        if !entries.is_empty() {
            warn!(unit = %name, count = entries.len(), "Unit finished with diagnostics");
        }
        info!(
            unit = %name,
            polygons = geometry.0.len(),
            dropped = counts.total(),
            cached,
            "Unit finished"
        );

        Ok(UnitOutcome {
            report: UnitReport {
                name,
                output: self.output.clone(),
                polygons: geometry.0.len(),
                counts,
                diagnostics: entries,
                cached,
            },
            geometry,
        })
    }

    fn compute(
        &self,
        config: &PipelineConfig,
        services: &PipelineServices,
        base: Option<&MultiPolygon<f64>>,
        diagnostics: &mut Diagnostics,
    ) -> PipelineResult<MultiPolygon<f64>> {
        let aggregator = GeometryAggregator::new(services.union.as_ref());
        match self.kind {
            UnitKind::Ingest => {
                let ingest = ShapefileIngest::new(
                    services,
                    config.viewport(&self.place),
                    config.simplification_tolerance,
                );
                let polygons = ingest.ingest_sources(&config.sources, diagnostics)?;
                aggregator.aggregate(polygons, AggregationMode::Union)
            }
            UnitKind::Band { distance_m } => {
                let base = base.ok_or_else(|| PipelineError::InvalidConfiguration {
                    message: format!("Distance band of '{}' has no base geometry.", self.place.name),
                })?;
                let buffer = services.buffer.as_ref().ok_or_else(|| {
                    PipelineError::InvalidConfiguration {
                        message: "Distance bands require a buffer service.".to_string(),
                    }
                })?;
                let buffered = buffer.buffer(base, distance_m)?;
                aggregator.aggregate(buffered.into_polygons(), AggregationMode::Concatenate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_output_names() {
        let config = PipelineConfig::new().with_output_dir("out");
        let place = Place::new("Oxford", "oxford", 51.752, -1.2577);
        let ingest = ProcessingUnit::ingest(&place, &config);
        let band = ProcessingUnit::band(&place, 500.0, &config);
        assert_eq!(ingest.output, PathBuf::from("out/oxford.geojson"));
        assert_eq!(band.output, PathBuf::from("out/oxford0500m.geojson"));
        assert_eq!(band.name(), "oxford0500m");
        assert_eq!(ProcessingUnit::band(&place, 3000.0, &config).name(), "oxford3000m");
    }

    #[test]
    fn test_band_without_buffer_service_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new().with_output_dir(dir.path());
        let place = Place::new("Oxford", "oxford", 51.752, -1.2577);
        let base = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)
        ]]);
        let result = ProcessingUnit::band(&place, 500.0, &config).run(
            &config,
            &PipelineServices::new(GridExtent::default()),
            Some(&base),
        );
        assert!(matches!(result, Err(PipelineError::InvalidConfiguration { .. })));
        assert!(!dir.path().join("oxford0500m.geojson").exists());
    }
}
