// src/geometry/polygon/assembler.rs

use crate::geometry::error::ValidationError;
use crate::geometry::polygon::validation::PolygonValidator;
use crate::geometry::ring::{RingBuilder, RingValidator};
use crate::geometry::types::{Coordinate, Ring, SourceRecord};
use crate::pipeline::diagnostics::{Diagnostics, DropReason, SourceId, Stage};
use geo::algorithm::validation::RingRole;
use geo::{LineString, Polygon};

/// Baut aus einem rohen Record ein gültiges Polygon.
///
/// Ablauf: Außenring deduplizieren und prüfen, danach *jeden* vorhandenen
/// Innenring einzeln (auch wenn es nur einer ist), zuletzt das zusammengesetzte
/// Polygon als Ganzes. Ein ungültiger Innenring wird verworfen, das Polygon
/// bleibt erhalten; ein ungültiger Außenring oder ein ungültiges Polygon
/// verwirft den ganzen Record. Nichts davon ist fatal.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolygonAssembler {
    builder: RingBuilder,
    rings: RingValidator,
    polygons: PolygonValidator,
}

impl PolygonAssembler {
    pub fn new() -> Self {
        Self {
            builder: RingBuilder::new(),
            rings: RingValidator::new(),
            polygons: PolygonValidator::new(),
        }
    }

    pub fn assemble(
        &self,
        record: &SourceRecord,
        diagnostics: &mut Diagnostics,
    ) -> Option<Polygon<f64>> {
        let Some(exterior_raw) = record.exterior() else {
            diagnostics.record(
                Stage::Ring,
                DropReason::DegenerateRing,
                SourceId::record(record.index),
            );
            return None;
        };
        let exterior = self.ring(
            exterior_raw,
            RingRole::Exterior,
            SourceId::ring(record.index, 0),
            diagnostics,
        )?;

        let interiors: Vec<LineString<f64>> = record
            .interiors()
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| {
                self.ring(
                    raw,
                    RingRole::Interior(i),
                    SourceId::ring(record.index, i + 1),
                    diagnostics,
                )
            })
            .map(Ring::into_line_string)
            .collect();

        let polygon = Polygon::new(exterior.into_line_string(), interiors);
        match self.polygons.validate(&polygon) {
            Ok(()) => Some(polygon),
            Err(ValidationError::ZeroArea) => {
                diagnostics.record_polygon(
                    Stage::Polygon,
                    DropReason::EmptyGeometry,
                    SourceId::record(record.index),
                    &polygon,
                );
                None
            }
            Err(err) => {
                diagnostics.record_polygon(
                    Stage::Polygon,
                    DropReason::InvalidPolygon(err),
                    SourceId::record(record.index),
                    &polygon,
                );
                None
            }
        }
    }

    /// Alle Records eines Streams; verworfene Records fehlen einfach im Ergebnis.
    pub fn assemble_all<'a>(
        &self,
        records: impl IntoIterator<Item = &'a SourceRecord>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Polygon<f64>> {
        records
            .into_iter()
            .filter_map(|record| self.assemble(record, diagnostics))
            .collect()
    }

    fn ring(
        &self,
        raw: &[Coordinate],
        role: RingRole,
        source: SourceId,
        diagnostics: &mut Diagnostics,
    ) -> Option<Ring> {
        let Some(candidate) = self.builder.build(raw) else {
            diagnostics.record(Stage::Ring, DropReason::DegenerateRing, source);
            return None;
        };
        match self.rings.validate(candidate, role) {
            Ok(ring) => Some(ring),
            Err(err) => {
                diagnostics.record(Stage::Ring, DropReason::InvalidRing(err), source);
                None
            }
        }
    }
}
