// src/geometry/polygon/validation.rs

use crate::geometry::error::ValidationError;
use crate::geometry::intersections::ring_touches;
use crate::geometry::ring::RingValidator;
use crate::geometry::types::open_coords;
use crate::geometry::utils::constants::MIN_AREA;
use geo::algorithm::validation::RingRole;
use geo::coordinate_position::CoordPos;
use geo::dimensions::Dimensions;
use geo::{Area, BoundingRect, MultiPolygon, Polygon, Rect, Relate, Validation};

/// Polygon-Validator auf Basis von `geo::Validation`.
///
/// Zusätzlich zu geo: Ringe mit Fläche null, Mehrfachberührungen zwischen
/// Ringen (der Innenraum wäre nicht mehr zusammenhängend) und Gesamtfläche null.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolygonValidator {
    rings: RingValidator,
}

impl PolygonValidator {
    pub fn new() -> Self {
        Self {
            rings: RingValidator::new(),
        }
    }

    pub fn validate(&self, polygon: &Polygon<f64>) -> Result<(), ValidationError> {
        let rings: Vec<(RingRole, _)> = std::iter::once((RingRole::Exterior, polygon.exterior()))
            .chain(
                polygon
                    .interiors()
                    .iter()
                    .enumerate()
                    .map(|(index, ring)| (RingRole::Interior(index), ring)),
            )
            .map(|(role, ring)| (role, open_coords(ring)))
            .collect();

        for (role, coords) in &rings {
            self.rings.precheck(coords, *role)?;
        }
        polygon.check_validation()?;
        for (role, coords) in &rings {
            self.rings.check_area(coords, *role)?;
        }

        for ((first, second), touches) in ring_touches(polygon) {
            if touches.len() < 2 {
                continue;
            }
            return Err(if first == 0 {
                ValidationError::HoleTouchesShell {
                    hole: second - 1,
                    touches: touches.len(),
                }
            } else {
                ValidationError::HolesTouch {
                    first: first - 1,
                    second: second - 1,
                    touches: touches.len(),
                }
            });
        }

        if polygon.unsigned_area() <= MIN_AREA {
            return Err(ValidationError::ZeroArea);
        }

        Ok(())
    }
}

/// MultiPolygon-Validator: jedes Polygon gültig, Innere paarweise disjunkt,
/// Gesamtfläche ungleich null. Berührungen zwischen Polygonen sind erlaubt,
/// auch entlang gemeinsamer Kanten.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiPolygonValidator {
    polygons: PolygonValidator,
}

impl MultiPolygonValidator {
    pub fn new() -> Self {
        Self {
            polygons: PolygonValidator::new(),
        }
    }

    pub fn validate(&self, multi: &MultiPolygon<f64>) -> Result<(), ValidationError> {
        for polygon in &multi.0 {
            self.polygons.validate(polygon)?;
        }

        // relate nur für Paare mit überlappender Bounding Box
        let bounds: Vec<Option<Rect<f64>>> = multi.0.iter().map(|p| p.bounding_rect()).collect();
        for first in 0..multi.0.len() {
            for second in (first + 1)..multi.0.len() {
                if !rects_overlap(bounds[first], bounds[second]) {
                    continue;
                }
                let matrix = multi.0[first].relate(&multi.0[second]);
                if matrix.get(CoordPos::Inside, CoordPos::Inside) == Dimensions::TwoDimensional {
                    return Err(ValidationError::PolygonsOverlap { first, second });
                }
            }
        }

        if multi.unsigned_area() <= MIN_AREA {
            return Err(ValidationError::ZeroArea);
        }
        Ok(())
    }
}

fn rects_overlap(a: Option<Rect<f64>>, b: Option<Rect<f64>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            a.min().x <= b.max().x
                && b.min().x <= a.max().x
                && a.min().y <= b.max().y
                && b.min().y <= a.max().y
        }
        _ => false,
    }
}
