// src/geometry/operations/mod.rs

pub mod aggregate;
pub mod simplify;
pub mod viewport;

pub use aggregate::{AggregationMode, BooleanUnion, GeometryAggregator, UnionService};
pub use simplify::{PreservingDouglasPeucker, SimplificationStage, Simplifier};
pub use viewport::ViewportFilter;
