// src/geometry/ring/builder.rs

use crate::geometry::types::{CandidateRing, Coordinate, coord_key};
use std::collections::HashSet;

/// Entfernt wiederholte Koordinaten aus einer rohen Koordinatenfolge.
///
/// Eine Koordinate, die an *irgendeiner* späteren Stelle erneut auftaucht, wird
/// verworfen; die Reihenfolge der Erstauftritte bleibt erhalten. Das schließt den
/// Wiederholungspunkt am Ende eines geschlossenen Rings mit ein.
#[derive(Debug, Clone, Copy, Default)]
pub struct RingBuilder;

impl RingBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Dedupliziert ohne Längenprüfung.
    pub fn dedup(&self, raw: &[Coordinate]) -> Vec<Coordinate> {
        let mut seen = HashSet::with_capacity(raw.len());
        raw.iter()
            .filter(|coord| seen.insert(coord_key(coord)))
            .copied()
            .collect()
    }

    /// Baut einen Kandidaten-Ring. Bleiben nach dem Deduplizieren höchstens zwei
    /// Punkte übrig, gibt es keinen Ring (`None`); das ist kein Fehler.
    pub fn build(&self, raw: &[Coordinate]) -> Option<CandidateRing> {
        let coords = self.dedup(raw);
        if coords.len() <= 2 {
            return None;
        }
        Some(CandidateRing { coords })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn coords(points: &[(f64, f64)]) -> Vec<Coordinate> {
        points.iter().map(|&(x, y)| coord! { x: x, y: y }).collect()
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let raw = coords(&[(0.0, 0.0), (1.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]);
        let ring = RingBuilder::new().build(&raw).unwrap();
        assert_eq!(
            ring.coords(),
            coords(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]).as_slice()
        );
    }

    #[test]
    fn test_non_adjacent_repeat_is_dropped() {
        let raw = coords(&[(0.0, 0.0), (2.0, 0.0), (1.0, 1.0), (2.0, 0.0), (0.0, 2.0)]);
        let ring = RingBuilder::new().build(&raw).unwrap();
        assert_eq!(
            ring.coords(),
            coords(&[(0.0, 0.0), (2.0, 0.0), (1.0, 1.0), (0.0, 2.0)]).as_slice()
        );
    }

    #[test]
    fn test_two_points_give_no_ring() {
        let raw = coords(&[(0.0, 0.0), (1.0, 0.0)]);
        assert!(RingBuilder::new().build(&raw).is_none());
    }

    #[test]
    fn test_collapsing_duplicates_give_no_ring() {
        let raw = coords(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0), (1.0, 0.0)]);
        assert!(RingBuilder::new().build(&raw).is_none());
    }

    #[test]
    fn test_output_never_longer_and_pairwise_distinct() {
        let mut rng = StdRng::seed_from_u64(7);
        let builder = RingBuilder::new();
        for _ in 0..200 {
            let len = rng.random_range(0..40);
            // Kleines Raster erzwingt viele Wiederholungen
            let raw: Vec<Coordinate> = (0..len)
                .map(|_| {
                    coord! {
                        x: rng.random_range(0..4) as f64,
                        y: rng.random_range(0..4) as f64,
                    }
                })
                .collect();
            let out = builder.dedup(&raw);
            assert!(out.len() <= raw.len());
            let distinct: HashSet<_> = out.iter().map(coord_key).collect();
            assert_eq!(distinct.len(), out.len());
        }
    }
}
