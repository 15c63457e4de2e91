// src/geometry/operations/aggregate.rs

use crate::geometry::error::{PipelineError, PipelineResult, ValidationError};
use crate::geometry::polygon::{MultiPolygonValidator, split_pinched};
use crate::geometry::types::PolygonalGeometry;
use geo::{BooleanOps, MultiPolygon, Polygon};
use tracing::debug;

/// Wie eine Polygonliste zu einem MultiPolygon zusammengeführt wird.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMode {
    /// Topologische Vereinigung (Rohdaten aus mehreren Quellen).
    Union,
    /// Nur einpacken; die Eingabe ist bereits vereinigt (z. B. gespeichertes Ergebnis).
    Concatenate,
}

/// `union(polygons) -> geometry`
pub trait UnionService: Send + Sync {
    fn union(&self, polygons: Vec<Polygon<f64>>) -> PolygonalGeometry;
}

/// Vereinigung über geo::BooleanOps, paarweise als Baum reduziert.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanUnion;

impl UnionService for BooleanUnion {
    fn union(&self, polygons: Vec<Polygon<f64>>) -> PolygonalGeometry {
        let mut layer: Vec<MultiPolygon<f64>> = polygons
            .into_iter()
            .map(|p| MultiPolygon::new(vec![p]))
            .collect();

        while layer.len() > 1 {
            let mut next = Vec::with_capacity(layer.len().div_ceil(2));
            let mut iter = layer.into_iter();
            while let Some(first) = iter.next() {
                match iter.next() {
                    Some(second) => next.push(first.union(&second)),
                    None => next.push(first),
                }
            }
            layer = next;
        }

        match layer.pop() {
            Some(mut multi) if multi.0.len() == 1 => match multi.0.pop() {
                Some(polygon) => PolygonalGeometry::Polygon(polygon),
                None => PolygonalGeometry::MultiPolygon(multi),
            },
            Some(multi) => PolygonalGeometry::MultiPolygon(multi),
            None => PolygonalGeometry::MultiPolygon(MultiPolygon::new(vec![])),
        }
    }
}

/// Führt gültige Polygone zu einem MultiPolygon zusammen und prüft das Ergebnis.
///
/// Ein ungültiges oder leeres Aggregat ist fatal für die Verarbeitungseinheit.
#[derive(Clone, Copy)]
pub struct GeometryAggregator<'a> {
    union: &'a dyn UnionService,
    validator: MultiPolygonValidator,
}

impl<'a> GeometryAggregator<'a> {
    pub fn new(union: &'a dyn UnionService) -> Self {
        Self {
            union,
            validator: MultiPolygonValidator::new(),
        }
    }

    pub fn aggregate(
        &self,
        polygons: Vec<Polygon<f64>>,
        mode: AggregationMode,
    ) -> PipelineResult<MultiPolygon<f64>> {
        if polygons.is_empty() {
            return Err(PipelineError::AggregateEmpty);
        }

        let input = polygons.len();
        let merged = match mode {
            AggregationMode::Union => self.union.union(polygons).into_polygons(),
            AggregationMode::Concatenate => polygons,
        };
        // Vereinigungen liefern an Berührungspunkten eingeschnürte Ringe
        let multi: MultiPolygon<f64> = merged.into_iter().flat_map(split_pinched).collect();
        debug!(?mode, input, output = multi.0.len(), "Aggregated polygons");

        if multi.0.is_empty() {
            return Err(PipelineError::AggregateEmpty);
        }
        match self.validator.validate(&multi) {
            Ok(()) => Ok(multi),
            Err(ValidationError::ZeroArea) => Err(PipelineError::AggregateEmpty),
            Err(err) => Err(PipelineError::AggregateInvalid(err)),
        }
    }
}
