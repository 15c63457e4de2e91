// src/geometry/projection/mod.rs

pub mod ellipsoid;
pub mod national_grid;

pub use ellipsoid::Ellipsoid;
pub use national_grid::{GridExtent, NationalGrid};

use crate::geometry::types::Coordinate;
use geo::{LineString, Polygon};

/// Deterministische Vorwärtstransformation einer einzelnen Koordinate.
/// `None` heißt: für diese Koordinate nicht definiert.
pub trait Reproject: Send + Sync {
    fn project(&self, coordinate: Coordinate) -> Option<Coordinate>;
}

/// Projiziert ganze Ringe und Polygone; Verschachtelung, Vertex-Reihenfolge
/// und Umlaufsinn bleiben unverändert.
#[derive(Clone, Copy)]
pub struct Projector<'a> {
    service: &'a dyn Reproject,
}

impl<'a> Projector<'a> {
    pub fn new(service: &'a dyn Reproject) -> Self {
        Self { service }
    }

    /// `project(ring) -> ring | failure`
    pub fn project_ring(&self, ring: &LineString<f64>) -> Option<LineString<f64>> {
        self.project_coords(ring).ok().map(LineString::new)
    }

    /// Schlägt fehl mit dem Index (über alle Ringe gezählt) des ersten
    /// nicht transformierbaren Vertex.
    pub fn project_polygon(&self, polygon: &Polygon<f64>) -> Result<Polygon<f64>, usize> {
        let mut offset = 0;
        let exterior = self
            .project_coords(polygon.exterior())
            .map_err(|i| offset + i)?;
        offset += polygon.exterior().0.len();

        let mut interiors = Vec::with_capacity(polygon.interiors().len());
        for ring in polygon.interiors() {
            interiors.push(self.project_coords(ring).map_err(|i| offset + i)?);
            offset += ring.0.len();
        }

        Ok(Polygon::new(
            LineString::new(exterior),
            interiors.into_iter().map(LineString::new).collect(),
        ))
    }

    fn project_coords(&self, ring: &LineString<f64>) -> Result<Vec<Coordinate>, usize> {
        ring.0
            .iter()
            .enumerate()
            .map(|(i, c)| self.service.project(*c).ok_or(i))
            .collect()
    }
}
