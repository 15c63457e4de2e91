// src/geometry/operations/viewport.rs

use crate::geometry::types::Viewport;
use geo::{BoundingRect, Polygon};

/// Verwirft Polygone, deren Bounding Box den gepolsterten Sichtbereich nicht schneidet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportFilter {
    viewport: Viewport,
}

impl ViewportFilter {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn admits(&self, polygon: &Polygon<f64>) -> bool {
        polygon
            .bounding_rect()
            .is_some_and(|bounds| self.viewport.intersects(&bounds))
    }
}
