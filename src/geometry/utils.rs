// src/geometry/utils.rs

/// Konstanten
pub mod constants {
    /// Garantierte Genauigkeit beim Speichern und Laden (Grad).
    pub const ROUND_TRIP_TOLERANCE: f64 = 1e-9;
    /// Kleinste Fläche, die noch als "nicht null" gilt.
    pub const MIN_AREA: f64 = 0.0;
    /// Bogensekunden pro Radiant (Helmert-Rotationen sind in Bogensekunden angegeben).
    pub const ARC_SECONDS_PER_RADIAN: f64 = 206_264.806_247_096_36;
}

/// Vergleichsfunktionen mit Toleranz
pub mod comparison {
    use crate::geometry::types::Coordinate;
    use geo::{MultiPolygon, Polygon};

    /// Prüft ob zwei Floats mit custom Toleranz gleich sind
    pub fn nearly_equal_eps(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() <= epsilon
    }

    pub fn coords_nearly_equal(a: &Coordinate, b: &Coordinate, epsilon: f64) -> bool {
        nearly_equal_eps(a.x, b.x, epsilon) && nearly_equal_eps(a.y, b.y, epsilon)
    }

    /// Ringweise Koordinatengleichheit zweier Polygone.
    pub fn polygons_nearly_equal(a: &Polygon<f64>, b: &Polygon<f64>, epsilon: f64) -> bool {
        let ring_eq = |x: &geo::LineString<f64>, y: &geo::LineString<f64>| {
            x.0.len() == y.0.len()
                && x
                    .0
                    .iter()
                    .zip(y.0.iter())
                    .all(|(p, q)| coords_nearly_equal(p, q, epsilon))
        };
        ring_eq(a.exterior(), b.exterior())
            && a.interiors().len() == b.interiors().len()
            && a
                .interiors()
                .iter()
                .zip(b.interiors().iter())
                .all(|(x, y)| ring_eq(x, y))
    }

    /// Polygonweise Gleichheit; die Reihenfolge der Polygone muss übereinstimmen.
    pub fn multipolygons_nearly_equal(
        a: &MultiPolygon<f64>,
        b: &MultiPolygon<f64>,
        epsilon: f64,
    ) -> bool {
        a.0.len() == b.0.len()
            && a
                .0
                .iter()
                .zip(b.0.iter())
                .all(|(p, q)| polygons_nearly_equal(p, q, epsilon))
    }
}
