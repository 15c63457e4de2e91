// src/pipeline/ingest.rs

use crate::geometry::error::PipelineResult;
use crate::geometry::operations::{SimplificationStage, ViewportFilter};
use crate::geometry::polygon::PolygonAssembler;
use crate::geometry::projection::Projector;
use crate::geometry::types::{SourceRecord, Viewport};
use crate::io::shapefile::read_records;
use crate::pipeline::diagnostics::{Diagnostics, DropReason, SourceId, Stage};
use crate::pipeline::unit::PipelineServices;
use geo::Polygon;
use std::path::Path;
use tracing::info;

/// Shapefile-Pfad einer Verarbeitungseinheit: Records zu Polygonen bauen,
/// nach Länge/Breite projizieren, auf den Sichtbereich beschränken und vereinfachen.
pub struct ShapefileIngest<'a> {
    assembler: PolygonAssembler,
    projector: Projector<'a>,
    filter: ViewportFilter,
    simplification: SimplificationStage<'a>,
}

impl<'a> ShapefileIngest<'a> {
    pub fn new(services: &'a PipelineServices, viewport: Viewport, tolerance: f64) -> Self {
        Self {
            assembler: PolygonAssembler::new(),
            projector: Projector::new(services.reproject.as_ref()),
            filter: ViewportFilter::new(viewport),
            simplification: SimplificationStage::new(services.simplifier.as_ref(), tolerance),
        }
    }

    /// Alle Quellen nacheinander; die überlebenden Polygone werden aneinandergehängt.
    pub fn ingest_sources<P: AsRef<Path>>(
        &self,
        sources: &[P],
        diagnostics: &mut Diagnostics,
    ) -> PipelineResult<Vec<Polygon<f64>>> {
        let mut polygons = Vec::new();
        for source in sources {
            let source = source.as_ref();
            info!(unit = diagnostics.unit(), source = %source.display(), "Reading shapefile");
            let records = read_records(source)?;
            polygons.extend(self.ingest_records(&records, diagnostics));
        }
        Ok(polygons)
    }

    pub fn ingest_records(
        &self,
        records: &[SourceRecord],
        diagnostics: &mut Diagnostics,
    ) -> Vec<Polygon<f64>> {
        // Stufe 1: Records -> gültige Polygone
        let assembled: Vec<(usize, Polygon<f64>)> = records
            .iter()
            .filter_map(|record| {
                self.assembler
                    .assemble(record, diagnostics)
                    .map(|polygon| (record.index, polygon))
            })
            .collect();
        info!(
            "{} records were skipped because they were invalid",
            records.len() - assembled.len()
        );

        // Stufe 2: Rechts-/Hochwert -> Länge/Breite
        let before = assembled.len();
        let projected: Vec<(usize, Polygon<f64>)> = assembled
            .into_iter()
            .filter_map(|(index, polygon)| match self.projector.project_polygon(&polygon) {
                Ok(projected) => Some((index, projected)),
                Err(vertex) => {
                    diagnostics.record_polygon(
                        Stage::Projection,
                        DropReason::ProjectionFailure { vertex },
                        SourceId::record(index),
                        &polygon,
                    );
                    None
                }
            })
            .collect();
        info!(
            "{} Polygons could not be converted from Eastings/Northings to Longitudes/Latitudes",
            before - projected.len()
        );

        // Stufe 3: Sichtbereich
        let before = projected.len();
        let visible: Vec<(usize, Polygon<f64>)> = projected
            .into_iter()
            .filter(|(index, polygon)| {
                let admitted = self.filter.admits(polygon);
                if !admitted {
                    diagnostics.record(
                        Stage::Viewport,
                        DropReason::OutsideViewport,
                        SourceId::record(*index),
                    );
                }
                admitted
            })
            .collect();
        info!(
            "{} Polygons are outside {}",
            before - visible.len(),
            self.filter.viewport()
        );

        // Stufe 4: Vereinfachung
        let before = visible.len();
        let simplified: Vec<Polygon<f64>> = visible
            .into_iter()
            .filter_map(|(index, polygon)| {
                self.simplification
                    .apply(&polygon, SourceId::record(index), diagnostics)
            })
            .collect();
        info!(
            "{} Polygons could not be simplified",
            before - simplified.len()
        );

        simplified
    }
}
