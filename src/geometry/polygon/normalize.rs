// src/geometry/polygon/normalize.rs

use crate::geometry::types::{Coordinate, SourceRecord, coord_key};
use crate::geometry::utils::constants::MIN_AREA;
use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{Area, InteriorPoint, LineString, Polygon};
use std::collections::HashMap;

/// Zerlegt eine Koordinatenfolge an wiederholten Vertices in einfache Schleifen.
///
/// Direkt aufeinanderfolgende Duplikate und der schließende Punkt erzeugen
/// Schleifen mit weniger als drei Vertices; diese fallen weg, ebenso Schleifen
/// ohne Fläche (Stachel).
pub fn split_ring(coords: &[Coordinate]) -> Vec<Vec<Coordinate>> {
    let mut loops = Vec::new();
    let mut path: Vec<Coordinate> = Vec::with_capacity(coords.len());
    let mut positions: HashMap<(u64, u64), usize> = HashMap::new();

    for &coord in coords {
        let key = coord_key(&coord);
        match positions.get(&key) {
            Some(&start) => {
                for dropped in &path[start + 1..] {
                    positions.remove(&coord_key(dropped));
                }
                loops.push(path.split_off(start));
                path.push(coord);
            }
            None => {
                positions.insert(key, path.len());
                path.push(coord);
            }
        }
    }
    loops.push(path);

    loops.retain(|ring| ring.len() >= 3 && loop_area(ring) > MIN_AREA);
    loops
}

fn loop_area(ring: &[Coordinate]) -> f64 {
    Polygon::new(LineString::from(ring.to_vec()), vec![]).unsigned_area()
}

/// Zerlegt ein Polygon mit eingeschnürten Ringen (Selbstberührung in einem
/// Vertex) in gültige Polygone. Eine Schleife des Außenrings, die in einer
/// anderen liegt, wird zum Innenring; jeder Innenring landet im kleinsten
/// Außenring, der ihn enthält.
///
/// Polygone ohne wiederholte Vertices kommen unverändert zurück.
pub fn split_pinched(polygon: Polygon<f64>) -> Vec<Polygon<f64>> {
    let shell_loops = split_ring(&polygon.exterior().0);
    let hole_loops: Vec<Vec<Vec<Coordinate>>> =
        polygon.interiors().iter().map(|ring| split_ring(&ring.0)).collect();

    if shell_loops.len() == 1 && hole_loops.iter().all(|loops| loops.len() == 1) {
        return vec![polygon];
    }
    regroup(shell_loops, hole_loops.into_iter().flatten().collect())
}

/// Wie [`split_pinched`], aber auf den rohen Ringen eines Records.
/// Alle Teile behalten den Index des Records.
pub fn split_pinched_record(record: &SourceRecord) -> Vec<SourceRecord> {
    let Some(exterior) = record.exterior() else {
        return vec![record.clone()];
    };
    let shell_loops = split_ring(exterior);
    let hole_loops: Vec<Vec<Vec<Coordinate>>> =
        record.interiors().iter().map(|ring| split_ring(ring)).collect();

    // Degenerierte Ringe (keine Schleife) bleiben dem Assembler und seinen Diagnosen überlassen
    if shell_loops.len() <= 1 && hole_loops.iter().all(|loops| loops.len() <= 1) {
        return vec![record.clone()];
    }
    regroup(shell_loops, hole_loops.into_iter().flatten().collect())
        .into_iter()
        .map(|polygon| {
            let (exterior, interiors) = polygon.into_inner();
            let rings = std::iter::once(exterior)
                .chain(interiors)
                .map(LineString::into_inner)
                .collect();
            SourceRecord::new(record.index, rings)
        })
        .collect()
}

fn regroup(shell_loops: Vec<Vec<Coordinate>>, hole_loops: Vec<Vec<Coordinate>>) -> Vec<Polygon<f64>> {
    let loops: Vec<Polygon<f64>> = shell_loops
        .into_iter()
        .map(|ring| Polygon::new(LineString::from(ring), vec![]))
        .collect();
    let areas: Vec<f64> = loops.iter().map(|ring| ring.unsigned_area()).collect();

    let containers = |candidate: &Polygon<f64>, skip: Option<usize>| -> Vec<usize> {
        let Some(point) = candidate.interior_point() else {
            return Vec::new();
        };
        (0..loops.len())
            .filter(|&j| Some(j) != skip)
            .filter(|&j| loops[j].coordinate_position(&point.0) == CoordPos::Inside)
            .collect()
    };
    let smallest = |indices: &[usize]| {
        indices
            .iter()
            .copied()
            .min_by(|&a, &b| areas[a].total_cmp(&areas[b]))
    };

    // Verschachtelungstiefe gerade: Außenring, ungerade: Loch der innersten Schleife
    let mut shells = Vec::new();
    let mut holes: Vec<Vec<LineString<f64>>> = vec![Vec::new(); loops.len()];
    for (i, ring) in loops.iter().enumerate() {
        let around = containers(ring, Some(i));
        match smallest(&around) {
            Some(parent) if around.len() % 2 == 1 => holes[parent].push(ring.exterior().clone()),
            _ => shells.push(i),
        }
    }

    for hole in hole_loops {
        let hole = Polygon::new(LineString::from(hole), vec![]);
        let around: Vec<usize> = containers(&hole, None)
            .into_iter()
            .filter(|j| shells.contains(j))
            .collect();
        let target = smallest(&around).or_else(|| {
            shells
                .iter()
                .copied()
                .max_by(|&a, &b| areas[a].total_cmp(&areas[b]))
        });
        if let Some(target) = target {
            holes[target].push(hole.exterior().clone());
        }
    }

    shells
        .into_iter()
        .map(|i| Polygon::new(loops[i].exterior().clone(), std::mem::take(&mut holes[i])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::polygon::PolygonValidator;
    use approx::assert_relative_eq;
    use geo::{coord, polygon};

    fn coords(points: &[(f64, f64)]) -> Vec<Coordinate> {
        points.iter().map(|&(x, y)| coord! { x: x, y: y }).collect()
    }

    /// Außenring, der sich in (2,4) selbst berührt und ein Dreieck einschließt.
    fn pinched() -> Polygon<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: 4.0, y: 0.0),
            (x: 4.0, y: 4.0),
            (x: 2.0, y: 4.0),
            (x: 3.0, y: 1.0),
            (x: 1.0, y: 1.0),
            (x: 2.0, y: 4.0),
            (x: 0.0, y: 4.0),
        ]
    }

    #[test]
    fn test_split_ring_at_repeated_vertex() {
        let loops = split_ring(&pinched().exterior().0);
        assert_eq!(loops.len(), 2);
        assert_eq!(loops[0], coords(&[(2.0, 4.0), (3.0, 1.0), (1.0, 1.0)]));
        assert_eq!(loops[1].len(), 5);
    }

    #[test]
    fn test_consecutive_duplicates_and_spikes_vanish() {
        let loops = split_ring(&coords(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (3.0, 0.0),
            (2.0, 0.0),
            (2.0, 2.0),
            (0.0, 0.0),
        ]));
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0], coords(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (2.0, 2.0)]));
    }

    #[test]
    fn test_pinched_shell_becomes_shell_with_hole() {
        let parts = split_pinched(pinched());
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].interiors().len(), 1);
        assert_relative_eq!(parts[0].unsigned_area(), 13.0, epsilon = 1e-9);
        assert_eq!(PolygonValidator::new().validate(&parts[0]), Ok(()));
    }

    #[test]
    fn test_figure_of_two_squares_splits_into_two_polygons() {
        // Zwei Quadrate, die sich in (1,1) berühren, als ein Ring
        let bow = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 2.0, y: 1.0),
            (x: 2.0, y: 2.0),
            (x: 1.0, y: 2.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ];
        let parts = split_pinched(bow);
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|p| p.interiors().is_empty()));
        assert!(parts.iter().all(|p| PolygonValidator::new().validate(p).is_ok()));
    }

    #[test]
    fn test_simple_polygon_is_untouched() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        assert_eq!(split_pinched(square.clone()), vec![square]);
    }

    #[test]
    fn test_record_holes_follow_their_shell() {
        // Zwei Quadrate an einem Punkt, das rechte mit Loch
        let record = SourceRecord::new(
            7,
            vec![
                coords(&[
                    (0.0, 0.0),
                    (4.0, 0.0),
                    (4.0, 4.0),
                    (8.0, 4.0),
                    (8.0, 8.0),
                    (4.0, 8.0),
                    (4.0, 4.0),
                    (0.0, 4.0),
                    (0.0, 0.0),
                ]),
                coords(&[(5.0, 5.0), (6.0, 5.0), (6.0, 6.0), (5.0, 5.0)]),
            ],
        );
        let parts = split_pinched_record(&record);
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|part| part.index == 7));
        let ring_counts: Vec<usize> = parts.iter().map(|part| part.rings.len()).collect();
        assert_eq!(ring_counts, vec![2, 1]);
    }
}
