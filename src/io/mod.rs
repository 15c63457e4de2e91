// src/io/mod.rs

pub mod shapefile;
pub mod store;

pub use store::{GeometryDocument, GeometryStore, StoreOptions};
