// src/lib.rs

pub mod debug;
pub mod geometry;
pub mod io;
pub mod logging;
pub mod pipeline;

// Re-exports für einfache Verwendung
pub use geometry::error::{PipelineError, PipelineResult, ValidationError};

// Öffentliche API
pub mod prelude {
    pub use super::{
        geometry::{
            error::{PipelineError, PipelineResult, ValidationError},
            operations::*,
            polygon::{MultiPolygonValidator, PolygonAssembler, PolygonValidator},
            projection::{GridExtent, NationalGrid, Projector, Reproject},
            ring::{RingBuilder, RingValidator},
            types::*,
        },
        io::{GeometryDocument, GeometryStore, StoreOptions},
        pipeline::*,
    };
}
