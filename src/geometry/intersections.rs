// src/geometry/intersections.rs

use crate::geometry::types::{Coordinate, coord_key};
use geo::sweep::{Cross, Intersections, LineOrPoint};
use geo::{Line, LineIntersection, Polygon};
use std::collections::{BTreeMap, HashSet};

/// Kante eines Polygonrings; Ring 0 ist der Außenring, Ring `i + 1` der Innenring `i`.
#[derive(Debug, Clone, Copy)]
struct RingSegment {
    ring: usize,
    line: Line<f64>,
}

impl Cross for RingSegment {
    type Scalar = f64;

    fn line(&self) -> LineOrPoint<f64> {
        self.line.into()
    }
}

/// Berührungspunkte zwischen verschiedenen Ringen eines Polygons, je Ringpaar
/// `(kleinerer Ring, größerer Ring)` ohne Wiederholungen.
///
/// Setzt voraus, dass sich die Ringe weder kreuzen noch Kantenstücke teilen
/// (geo-Validierung vorher); jeder gemeinsame Punkt ist dann eine Berührung.
pub(crate) fn ring_touches(polygon: &Polygon<f64>) -> BTreeMap<(usize, usize), Vec<Coordinate>> {
    let segments = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .enumerate()
        .flat_map(|(ring, line_string)| line_string.lines().map(move |line| RingSegment { ring, line }));

    let mut seen = HashSet::new();
    let mut touches: BTreeMap<(usize, usize), Vec<Coordinate>> = BTreeMap::new();
    for (a, b, intersection) in Intersections::from_iter(segments) {
        if a.ring == b.ring {
            continue;
        }
        let pair = (a.ring.min(b.ring), a.ring.max(b.ring));
        let point = match intersection {
            LineIntersection::SinglePoint { intersection, .. } => intersection,
            LineIntersection::Collinear { intersection } => intersection.start,
        };
        if seen.insert((pair, coord_key(&point))) {
            touches.entry(pair).or_default().push(point);
        }
    }
    touches
}
