// src/geometry/ring/mod.rs

pub mod builder; // Deduplizierung roher Koordinatenfolgen
pub mod validation; // Einfachheit und Fläche

pub use self::builder::RingBuilder;
pub use self::validation::{RingValidator, shoelace_area};
