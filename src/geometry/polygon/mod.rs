// src/geometry/polygon/mod.rs

pub mod assembler;
pub mod normalize;
pub mod validation;

pub use assembler::PolygonAssembler;
pub use normalize::{split_pinched, split_pinched_record};
pub use validation::{MultiPolygonValidator, PolygonValidator};
