// src/io/shapefile.rs

use crate::geometry::error::{PipelineError, PipelineResult};
use crate::geometry::types::{Coordinate, SourceRecord};
use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{Area, BoundingRect, InteriorPoint, Intersects, LineString, Polygon, coord};
use shapefile::{PolygonRing, Shape, ShapeReader};
use std::path::Path;
use tracing::debug;

/// Liest alle Records einer Shapefile-Datei als rohe `SourceRecord`s.
/// Die Attributtabelle (.dbf) wird nicht benötigt.
///
/// Ein Record mit einem anderen Shape-Typ als Polygon bricht den ganzen
/// Stream ab (falsche Eingabedatei).
pub fn read_records(path: impl AsRef<Path>) -> PipelineResult<Vec<SourceRecord>> {
    let path = path.as_ref();
    let shapes = ShapeReader::from_path(path)?.read()?;
    let records = records_from_shapes(shapes.into_iter().enumerate())?;
    debug!(path = %path.display(), records = records.len(), "Read shapefile");
    Ok(records)
}

/// Wandelt (Index, Shape)-Paare in `SourceRecord`s um.
///
/// Ein Polygon-Record kann mehrere Außenringe enthalten; jeder Außenring wird
/// zu einem eigenen `SourceRecord`. Die Ringreihenfolge in der Datei ist nicht
/// verbindlich: ein Innenring gehört zum kleinsten Außenring, der ihn enthält.
pub fn records_from_shapes(
    shapes: impl IntoIterator<Item = (usize, Shape)>,
) -> PipelineResult<Vec<SourceRecord>> {
    let mut records = Vec::new();
    for (index, shape) in shapes {
        let polygon = match shape {
            Shape::Polygon(polygon) => polygon,
            other => {
                return Err(PipelineError::UnsupportedShapeType {
                    record: index,
                    found: format!("{:?}", other.shapetype()),
                });
            }
        };

        let mut parts: Vec<Vec<Vec<Coordinate>>> = Vec::new();
        let mut inners: Vec<(Option<usize>, Vec<Coordinate>)> = Vec::new();
        for ring in polygon.rings() {
            let coords: Vec<Coordinate> = ring
                .points()
                .iter()
                .map(|p| coord! { x: p.x, y: p.y })
                .collect();
            match ring {
                PolygonRing::Outer(_) => parts.push(vec![coords]),
                PolygonRing::Inner(_) => inners.push((parts.len().checked_sub(1), coords)),
            }
        }

        let shells: Vec<Polygon<f64>> = parts
            .iter()
            .map(|rings| Polygon::new(LineString::from(rings[0].clone()), vec![]))
            .collect();
        for (preceding, coords) in inners {
            match containing_shell(&shells, &coords).or(preceding) {
                Some(shell) => parts[shell].push(coords),
                // Innenring ohne jeden Außenring: als Außenring behandeln
                None => parts.push(vec![coords]),
            }
        }
        records.extend(parts.into_iter().map(|rings| SourceRecord::new(index, rings)));
    }
    Ok(records)
}

/// Kleinster Außenring, der einen inneren Punkt des Rings enthält.
fn containing_shell(shells: &[Polygon<f64>], ring: &[Coordinate]) -> Option<usize> {
    let point = Polygon::new(LineString::from(ring.to_vec()), vec![]).interior_point()?;
    shells
        .iter()
        .enumerate()
        .filter(|(_, shell)| {
            shell
                .bounding_rect()
                .is_some_and(|rect| rect.intersects(&point))
        })
        .filter(|(_, shell)| shell.coordinate_position(&point.0) == CoordPos::Inside)
        .min_by(|(_, a), (_, b)| a.unsigned_area().total_cmp(&b.unsigned_area()))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::polygon::PolygonAssembler;
    use crate::pipeline::diagnostics::Diagnostics;
    use approx::assert_relative_eq;
    use shapefile::Point;

    fn points(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn outer(x0: f64, size: f64) -> PolygonRing<Point> {
        // Außenringe im Uhrzeigersinn (Shapefile-Konvention)
        PolygonRing::Outer(points(&[
            (x0, 0.0),
            (x0, size),
            (x0 + size, size),
            (x0 + size, 0.0),
            (x0, 0.0),
        ]))
    }

    fn inner(x0: f64, size: f64) -> PolygonRing<Point> {
        PolygonRing::Inner(points(&[
            (x0, 1.0),
            (x0 + size, 1.0),
            (x0 + size, 1.0 + size),
            (x0, 1.0 + size),
            (x0, 1.0),
        ]))
    }

    #[test]
    fn test_non_polygon_shape_is_fatal() {
        let shapes = vec![
            (0, Shape::Polygon(shapefile::Polygon::with_rings(vec![outer(0.0, 10.0)]))),
            (1, Shape::Point(Point::new(1.0, 2.0))),
        ];
        match records_from_shapes(shapes) {
            Err(PipelineError::UnsupportedShapeType { record, found }) => {
                assert_eq!(record, 1);
                assert_eq!(found, "Point");
            }
            other => panic!("expected UnsupportedShapeType, got {:?}", other),
        }
    }

    #[test]
    fn test_multipart_record_is_split() {
        let polygon = shapefile::Polygon::with_rings(vec![
            outer(0.0, 10.0),
            inner(1.0, 2.0),
            outer(20.0, 10.0),
        ]);
        let records = records_from_shapes(vec![(7, Shape::Polygon(polygon))]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].index, 7);
        assert_eq!(records[0].interiors().len(), 1);
        assert_eq!(records[1].index, 7);
        assert!(records[1].interiors().is_empty());
    }

    #[test]
    fn test_hole_after_later_outer_ring_finds_its_shell() {
        // Reihenfolge [außen 1, außen 2, Loch von außen 1]
        let polygon = shapefile::Polygon::with_rings(vec![
            outer(0.0, 10.0),
            outer(20.0, 10.0),
            inner(1.0, 2.0),
        ]);
        let records = records_from_shapes(vec![(0, Shape::Polygon(polygon))]).unwrap();
        let ring_counts: Vec<usize> = records.iter().map(|r| r.rings.len()).collect();
        assert_eq!(ring_counts, vec![2, 1]);

        let mut diagnostics = Diagnostics::new("test");
        let polygons = PolygonAssembler::new().assemble_all(&records, &mut diagnostics);
        let area: f64 = polygons.iter().map(|p| p.unsigned_area()).sum();
        assert_relative_eq!(area, 196.0, epsilon = 1e-9);
        assert!(diagnostics.entries().is_empty());
    }

    #[test]
    fn test_inner_ring_without_outer_becomes_exterior() {
        let polygon = shapefile::Polygon::with_rings(vec![inner(1.0, 2.0)]);
        let records = records_from_shapes(vec![(3, Shape::Polygon(polygon))]).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].interiors().is_empty());
    }
}
