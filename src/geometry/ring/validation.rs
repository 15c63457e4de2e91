// src/geometry/ring/validation.rs

use crate::geometry::error::ValidationError;
use crate::geometry::types::{CandidateRing, Coordinate, Ring};
use crate::geometry::utils::constants::MIN_AREA;
use geo::algorithm::validation::RingRole;
use geo::{LineString, Polygon, Validation};

/// Prüft einen Kandidaten-Ring auf Wohlgeformtheit und erzeugt daraus einen `Ring`.
///
/// Einfachheit und Endlichkeit prüft geo (`Validation`), die Fläche prüfen wir selbst.
#[derive(Debug, Clone, Copy, Default)]
pub struct RingValidator;

impl RingValidator {
    pub fn new() -> Self {
        Self
    }

    /// Schließt den Kandidaten zu einem Ring, sofern er einfach ist und Fläche umschließt.
    pub fn validate(&self, candidate: CandidateRing, role: RingRole) -> Result<Ring, ValidationError> {
        self.check(candidate.coords(), role)?;
        Ok(Ring::from_validated(candidate.coords))
    }

    /// Prüft eine offene Koordinatenfolge (ohne Wiederholung des Startpunkts).
    ///
    /// Reihenfolge der Checks: Anzahl, Endlichkeit, Einfachheit, Fläche.
    pub fn check(&self, coords: &[Coordinate], role: RingRole) -> Result<(), ValidationError> {
        self.precheck(coords, role)?;
        Polygon::new(LineString::from(coords.to_vec()), vec![])
            .check_validation()
            .map_err(|err| ValidationError::from(err).in_ring(role))?;
        self.check_area(coords, role)
    }

    /// Anzahl und Endlichkeit; geo's `relate` setzt endliche Koordinaten voraus.
    pub fn precheck(&self, coords: &[Coordinate], role: RingRole) -> Result<(), ValidationError> {
        if coords.len() < 3 {
            return Err(ValidationError::TooFewVertices { ring: role });
        }
        if let Some(index) = coords
            .iter()
            .position(|c| !c.x.is_finite() || !c.y.is_finite())
        {
            return Err(ValidationError::NonFiniteCoordinate { ring: role, index });
        }
        Ok(())
    }

    /// Kollineare Ringe besteht geo's Prüfung, sie umschließen aber nichts.
    pub fn check_area(&self, coords: &[Coordinate], role: RingRole) -> Result<(), ValidationError> {
        if shoelace_area(coords).abs() <= MIN_AREA {
            return Err(ValidationError::ZeroAreaRing { ring: role });
        }
        Ok(())
    }
}

/// Vorzeichenbehaftete Fläche eines implizit geschlossenen Rings.
/// Positiv bei Gegenuhrzeigersinn.
pub fn shoelace_area(coords: &[Coordinate]) -> f64 {
    let n = coords.len();
    if n < 3 {
        return 0.0;
    }
    // Relativ zum ersten Punkt rechnen, um Auslöschung bei großen Rechtswerten zu vermeiden
    let origin = coords[0];
    let mut twice_area = 0.0;
    for i in 1..n - 1 {
        let a = coords[i] - origin;
        let b = coords[i + 1] - origin;
        twice_area += a.x * b.y - b.x * a.y;
    }
    twice_area * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ring::RingBuilder;
    use approx::assert_relative_eq;
    use geo::coord;

    fn coords(points: &[(f64, f64)]) -> Vec<Coordinate> {
        points.iter().map(|&(x, y)| coord! { x: x, y: y }).collect()
    }

    fn candidate(points: &[(f64, f64)]) -> CandidateRing {
        RingBuilder::new().build(&coords(points)).unwrap()
    }

    const SHELL: RingRole = RingRole::Exterior;

    #[test]
    fn test_deduplicated_square_is_valid() {
        let ring = RingValidator::new()
            .validate(
                candidate(&[
                    (0.0, 0.0),
                    (1.0, 0.0),
                    (1.0, 0.0),
                    (1.0, 1.0),
                    (0.0, 1.0),
                    (0.0, 0.0),
                ]),
                SHELL,
            )
            .unwrap();
        assert_eq!(ring.len(), 4);
        assert_relative_eq!(shoelace_area(ring.coords()), 1.0);
    }

    #[test]
    fn test_figure_eight_is_invalid_ring() {
        let result = RingValidator::new().validate(
            candidate(&[(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0)]),
            RingRole::Interior(2),
        );
        assert_eq!(
            result,
            Err(ValidationError::SelfIntersection {
                ring: RingRole::Interior(2)
            })
        );
    }

    #[test]
    fn test_collinear_ring_is_rejected() {
        let result =
            RingValidator::new().validate(candidate(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]), SHELL);
        assert_eq!(result, Err(ValidationError::ZeroAreaRing { ring: SHELL }));
    }

    #[test]
    fn test_non_finite_vertex_is_rejected() {
        let result =
            RingValidator::new().check(&coords(&[(0.0, 0.0), (f64::NAN, 0.0), (0.0, 1.0)]), SHELL);
        assert_eq!(
            result,
            Err(ValidationError::NonFiniteCoordinate {
                ring: SHELL,
                index: 1
            })
        );
    }

    #[test]
    fn test_pinched_ring_is_not_simple() {
        // Ring berührt sich selbst im Vertex (2,4)
        let result = RingValidator::new().check(
            &coords(&[
                (0.0, 0.0),
                (4.0, 0.0),
                (4.0, 4.0),
                (2.0, 4.0),
                (3.0, 1.0),
                (1.0, 1.0),
                (2.0, 4.0),
                (0.0, 4.0),
            ]),
            SHELL,
        );
        assert_eq!(result, Err(ValidationError::SelfIntersection { ring: SHELL }));
    }

    #[test]
    fn test_spike_is_not_simple() {
        let result =
            RingValidator::new().check(&coords(&[(0.0, 0.0), (2.0, 0.0), (1.0, 0.0), (1.0, 1.0)]), SHELL);
        assert_eq!(result, Err(ValidationError::SelfIntersection { ring: SHELL }));
    }

    #[test]
    fn test_clockwise_ring_keeps_winding() {
        let points = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)];
        let ring = RingValidator::new().validate(candidate(&points), SHELL).unwrap();
        assert_eq!(ring.coords(), coords(&points).as_slice());
        assert!(shoelace_area(ring.coords()) < 0.0);
    }

    #[test]
    fn test_shoelace_large_offsets() {
        // Quadrat mit 10 m Kantenlänge bei Rechtswerten im Bereich der Landesvermessung
        let area = shoelace_area(&coords(&[
            (651_400.0, 313_170.0),
            (651_410.0, 313_170.0),
            (651_410.0, 313_180.0),
            (651_400.0, 313_180.0),
        ]));
        assert_relative_eq!(area, 100.0, epsilon = 1e-9);
    }
}
