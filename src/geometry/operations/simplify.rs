// src/geometry/operations/simplify.rs

use crate::geometry::error::ValidationError;
use crate::geometry::polygon::PolygonValidator;
use crate::geometry::types::Coordinate;
use crate::pipeline::diagnostics::{Diagnostics, DropReason, SourceId, Stage};
use geo::line_intersection::line_intersection;
use geo::{Distance, Euclidean, Line, LineIntersection, LineString, Point, Polygon};
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

/// `simplify(polygon, tolerance) -> polygon`
pub trait Simplifier: Send + Sync {
    fn simplify(&self, polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64>;
}

/// Originalkante eines Rings: (Ring, Kantenindex).
type RingEdge = GeomWithData<Line<f64>, (usize, usize)>;

/// Douglas-Peucker mit Topologieerhalt.
///
/// Ein Abschnitt wird nur durch seine Sehne ersetzt, wenn die Sehne keine
/// andere Kante des Polygons schneidet: weder eine noch vorhandene
/// Originalkante (eigener oder anderer Ring) noch eine bereits gesetzte Sehne.
/// Ringe behalten mindestens drei Vertices. Die Prüfung läuft über zwei R-Trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreservingDouglasPeucker;

impl Simplifier for PreservingDouglasPeucker {
    fn simplify(&self, polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
        let rings: Vec<&[Coordinate]> = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .map(|ring| ring.0.as_slice())
            .collect();

        let mut edges = EdgeIndex::new(&rings);
        let mut simplified: Vec<LineString<f64>> = rings
            .iter()
            .enumerate()
            .map(|(ring, coords)| simplify_ring(ring, coords, tolerance, &mut edges))
            .collect();

        let exterior = simplified.remove(0);
        Polygon::new(exterior, simplified)
    }
}

/// Noch vorhandene Originalkanten und bereits akzeptierte Sehnen.
struct EdgeIndex {
    original: RTree<RingEdge>,
    chords: RTree<Line<f64>>,
}

impl EdgeIndex {
    fn new(rings: &[&[Coordinate]]) -> Self {
        let edges = rings
            .iter()
            .enumerate()
            .flat_map(|(ring, coords)| {
                coords
                    .windows(2)
                    .enumerate()
                    .map(move |(edge, pair)| RingEdge::new(Line::new(pair[0], pair[1]), (ring, edge)))
            })
            .collect();
        Self {
            original: RTree::bulk_load(edges),
            chords: RTree::new(),
        }
    }

    /// Kreuzt `chord` etwas anderes als die Kanten `ring[first..last]`, die sie ersetzen soll?
    fn blocks(&self, chord: Line<f64>, ring: usize, first: usize, last: usize) -> bool {
        let envelope = AABB::from_corners(Point::from(chord.start), Point::from(chord.end));
        let replaced = |edge: &RingEdge| edge.data.0 == ring && (first..last).contains(&edge.data.1);

        self.original
            .locate_in_envelope_intersecting(&envelope)
            .filter(|edge| !replaced(edge))
            .any(|edge| conflicts(chord, *edge.geom()))
            || self
                .chords
                .locate_in_envelope_intersecting(&envelope)
                .any(|other| conflicts(chord, *other))
    }

    fn replace(&mut self, coords: &[Coordinate], ring: usize, first: usize, last: usize) {
        for edge in first..last {
            self.original
                .remove(&RingEdge::new(Line::new(coords[edge], coords[edge + 1]), (ring, edge)));
        }
        self.chords.insert(Line::new(coords[first], coords[last]));
    }
}

/// Erlaubt ist nur ein gemeinsamer Endpunkt; kollineare Überdeckung zählt als Konflikt.
fn conflicts(a: Line<f64>, b: Line<f64>) -> bool {
    match line_intersection(a, b) {
        None => false,
        Some(LineIntersection::SinglePoint {
            intersection,
            is_proper: false,
        }) => {
            let end_of = |line: Line<f64>| intersection == line.start || intersection == line.end;
            !(end_of(a) && end_of(b))
        }
        Some(_) => true,
    }
}

/// `coords` ist geschlossen (erster Punkt am Ende wiederholt).
fn simplify_ring(
    ring: usize,
    coords: &[Coordinate],
    tolerance: f64,
    edges: &mut EdgeIndex,
) -> LineString<f64> {
    let n = coords.len();
    if n < 4 {
        return LineString::new(coords.to_vec());
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    // (Anfang, Ende, Tiefe); erst ab Tiefe 3 darf ersetzt werden, sonst kollabiert der Ring
    let mut sections = vec![(0, n - 1, 1)];
    while let Some((first, last, depth)) = sections.pop() {
        if last <= first + 1 {
            continue;
        }
        let chord = Line::new(coords[first], coords[last]);
        let (farthest, distance) = ((first + 1)..last)
            .map(|i| (i, Euclidean.distance(coords[i], &chord)))
            .fold((first + 1, f64::NEG_INFINITY), |best, next| {
                if next.1 > best.1 { next } else { best }
            });

        if depth >= 3 && distance <= tolerance && !edges.blocks(chord, ring, first, last) {
            edges.replace(coords, ring, first, last);
            continue;
        }
        keep[farthest] = true;
        sections.push((farthest, last, depth + 1));
        sections.push((first, farthest, depth + 1));
    }

    coords
        .iter()
        .zip(keep)
        .filter_map(|(coord, kept)| kept.then_some(*coord))
        .collect()
}

/// Vereinfacht ein Polygon und prüft das Ergebnis erneut.
///
/// Ein ungültiges oder leeres Ergebnis wird verworfen; auf das unvereinfachte
/// Polygon wird nicht zurückgegriffen.
#[derive(Clone, Copy)]
pub struct SimplificationStage<'a> {
    simplifier: &'a dyn Simplifier,
    tolerance: f64,
    validator: PolygonValidator,
}

impl<'a> SimplificationStage<'a> {
    pub fn new(simplifier: &'a dyn Simplifier, tolerance: f64) -> Self {
        Self {
            simplifier,
            tolerance,
            validator: PolygonValidator::new(),
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn apply(
        &self,
        polygon: &Polygon<f64>,
        source: SourceId,
        diagnostics: &mut Diagnostics,
    ) -> Option<Polygon<f64>> {
        let simplified = self.simplifier.simplify(polygon, self.tolerance);

        if is_empty(&simplified) {
            diagnostics.record_polygon(
                Stage::Simplification,
                DropReason::EmptyGeometry,
                source,
                polygon,
            );
            return None;
        }

        match self.validator.validate(&simplified) {
            Ok(()) => Some(simplified),
            Err(ValidationError::ZeroArea) => {
                diagnostics.record_polygon(
                    Stage::Simplification,
                    DropReason::EmptyGeometry,
                    source,
                    &simplified,
                );
                None
            }
            Err(err) => {
                diagnostics.record_polygon(
                    Stage::Simplification,
                    DropReason::SimplificationFailure(err),
                    source,
                    &simplified,
                );
                None
            }
        }
    }
}

/// Außenring zu weniger als einem Dreieck kollabiert. Alles andere entscheidet die Validierung.
fn is_empty(polygon: &Polygon<f64>) -> bool {
    polygon.exterior().0.len() < 4
}
