// src/geometry/types.rs

use geo::{Coord, LineString, MultiPolygon, Polygon, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// (Länge, Breite) in Grad oder (Rechtswert, Hochwert) in Metern.
pub type Coordinate = Coord<f64>;

/// Hashbarer Schlüssel einer Koordinate. `-0.0` und `0.0` fallen zusammen,
/// damit Duplikate unabhängig vom Vorzeichen der Null erkannt werden.
pub fn coord_key(coord: &Coordinate) -> (u64, u64) {
    fn bits(value: f64) -> u64 {
        if value == 0.0 { 0.0f64.to_bits() } else { value.to_bits() }
    }
    (bits(coord.x), bits(coord.y))
}

/// Roher, ungeprüfter Eingabe-Record: erster Ring außen, alle weiteren innen.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    /// Position im Quell-Stream (für Diagnosen).
    pub index: usize,
    pub rings: Vec<Vec<Coordinate>>,
}

impl SourceRecord {
    pub fn new(index: usize, rings: Vec<Vec<Coordinate>>) -> Self {
        Self { index, rings }
    }

    pub fn exterior(&self) -> Option<&[Coordinate]> {
        self.rings.first().map(Vec::as_slice)
    }

    pub fn interiors(&self) -> &[Vec<Coordinate>] {
        self.rings.get(1..).unwrap_or(&[])
    }
}

/// Deduplizierte Koordinatenfolge mit mindestens drei Punkten, noch nicht validiert.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRing {
    pub(crate) coords: Vec<Coordinate>,
}

impl CandidateRing {
    pub fn coords(&self) -> &[Coordinate] {
        &self.coords
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// Validierter Ring: paarweise verschiedene Vertices, implizit geschlossen,
/// einfach und mit Fläche ungleich null.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    coords: Vec<Coordinate>,
}

impl Ring {
    /// Nur der `RingValidator` erzeugt Ringe.
    pub(crate) fn from_validated(coords: Vec<Coordinate>) -> Self {
        Self { coords }
    }

    /// Die Vertices ohne den schließenden Wiederholungspunkt.
    pub fn coords(&self) -> &[Coordinate] {
        &self.coords
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Geschlossener `LineString` (erster Punkt am Ende wiederholt).
    pub fn to_line_string(&self) -> LineString<f64> {
        let mut closed = self.coords.clone();
        if let Some(&first) = self.coords.first() {
            closed.push(first);
        }
        LineString::new(closed)
    }

    pub fn into_line_string(self) -> LineString<f64> {
        let mut closed = self.coords;
        if let Some(&first) = closed.first() {
            closed.push(first);
        }
        LineString::new(closed)
    }
}

/// Vertices eines geschlossenen `LineString` ohne den schließenden Punkt.
pub fn open_coords(ring: &LineString<f64>) -> &[Coordinate] {
    let coords = ring.0.as_slice();
    match (coords.first(), coords.last()) {
        (Some(first), Some(last)) if coords.len() > 1 && first == last => {
            &coords[..coords.len() - 1]
        }
        _ => coords,
    }
}

/// Polygon oder MultiPolygon als getaggte Variante; ersetzt Laufzeit-Typprüfungen.
#[derive(Debug, Clone, PartialEq)]
pub enum PolygonalGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl PolygonalGeometry {
    pub fn into_polygons(self) -> Vec<Polygon<f64>> {
        match self {
            PolygonalGeometry::Polygon(polygon) => vec![polygon],
            PolygonalGeometry::MultiPolygon(multi) => multi.0,
        }
    }

    pub fn polygon_count(&self) -> usize {
        match self {
            PolygonalGeometry::Polygon(_) => 1,
            PolygonalGeometry::MultiPolygon(multi) => multi.0.len(),
        }
    }
}

impl From<Polygon<f64>> for PolygonalGeometry {
    fn from(polygon: Polygon<f64>) -> Self {
        PolygonalGeometry::Polygon(polygon)
    }
}

impl From<MultiPolygon<f64>> for PolygonalGeometry {
    fn from(multi: MultiPolygon<f64>) -> Self {
        PolygonalGeometry::MultiPolygon(multi)
    }
}

/// Sichtbereich: Bounding Box (Grad) plus Rand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub padding: f64,
}

impl Viewport {
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64, padding: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
            padding,
        }
    }

    /// Quadratisches Sichtfeld um einen Ort: (lon ± fov, lat ± fov).
    pub fn around(longitude: f64, latitude: f64, field_of_view: f64, padding: f64) -> Self {
        Self::new(
            longitude - field_of_view,
            longitude + field_of_view,
            latitude - field_of_view,
            latitude + field_of_view,
            padding,
        )
    }

    /// Prüft, ob sich eine Bounding Box mit dem gepolsterten Sichtbereich schneidet.
    /// Berührung an der Kante zählt als Schnitt.
    pub fn intersects(&self, bounds: &Rect<f64>) -> bool {
        let min = bounds.min();
        let max = bounds.max();
        min.x <= self.xmax + self.padding
            && max.x >= self.xmin - self.padding
            && min.y <= self.ymax + self.padding
            && max.y >= self.ymin - self.padding
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.4}, {:.4}] x [{:.4}, {:.4}] (+{:.4})",
            self.xmin, self.xmax, self.ymin, self.ymax, self.padding
        )
    }
}
