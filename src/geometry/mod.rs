// src/geometry/mod.rs

pub mod error;
pub mod intersections;
pub mod operations;
pub mod polygon;
pub mod projection;
pub mod ring;
pub mod types;
pub mod utils;

pub use error::{PipelineError, PipelineResult, ValidationError};
pub use types::{Coordinate, PolygonalGeometry, Ring, SourceRecord, Viewport};
