// src/debug/visualization/mod.rs

pub mod svg;

pub use svg::dump_polygon_svg;
