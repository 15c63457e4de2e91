// src/pipeline/config.rs

use crate::geometry::error::{PipelineError, PipelineResult};
use crate::geometry::projection::GridExtent;
use crate::geometry::types::Viewport;
use crate::io::StoreOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Ein benannter Ort, um den herum ein Sichtbereich ausgeschnitten wird.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    /// Dateinamen-Präfix der Ausgaben
    pub stub: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Place {
    pub fn new(name: impl Into<String>, stub: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            stub: stub.into(),
            latitude,
            longitude,
        }
    }
}

/// Konfiguration eines Pipeline-Laufs (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Shapefiles in Projektionskoordinaten, in dieser Reihenfolge gelesen.
    pub sources: Vec<PathBuf>,
    pub places: Vec<Place>,
    /// Halbe Kantenlänge des Sichtbereichs (Grad).
    pub field_of_view: f64,
    /// Zusätzlicher Rand um den Sichtbereich (Grad).
    pub padding: f64,
    /// Toleranz der Vereinfachung (Grad).
    pub simplification_tolerance: f64,
    /// Abstand zwischen zwei Distanzbändern (Meter).
    pub distance_step_m: f64,
    /// Anzahl der Distanzbänder pro Ort; 0 schaltet sie ab.
    pub distance_bands: usize,
    pub output_dir: PathBuf,
    /// Verworfene Polygone als SVG ablegen
    pub debug_dump_dir: Option<PathBuf>,
    pub grid_extent: GridExtent,
    pub store: StoreOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            places: Vec::new(),
            field_of_view: 0.5,
            padding: 0.1,
            simplification_tolerance: 0.0001,
            distance_step_m: 500.0,
            distance_bands: 6,
            output_dir: PathBuf::from("."),
            debug_dump_dir: None,
            grid_extent: GridExtent::default(),
            store: StoreOptions::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Liest und prüft eine JSON-Konfiguration.
    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(path.into());
        self
    }

    pub fn with_place(mut self, place: Place) -> Self {
        self.places.push(place);
        self
    }

    pub fn with_field_of_view(mut self, degrees: f64) -> Self {
        self.field_of_view = degrees;
        self
    }

    pub fn with_padding(mut self, degrees: f64) -> Self {
        self.padding = degrees;
        self
    }

    pub fn with_simplification_tolerance(mut self, degrees: f64) -> Self {
        self.simplification_tolerance = degrees;
        self
    }

    pub fn with_distance_bands(mut self, bands: usize, step_m: f64) -> Self {
        self.distance_bands = bands;
        self.distance_step_m = step_m;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_debug_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug_dump_dir = Some(dir.into());
        self
    }

    pub fn with_grid_extent(mut self, extent: GridExtent) -> Self {
        self.grid_extent = extent;
        self
    }

    pub fn with_store_options(mut self, options: StoreOptions) -> Self {
        self.store = options;
        self
    }

    pub fn viewport(&self, place: &Place) -> Viewport {
        Viewport::around(place.longitude, place.latitude, self.field_of_view, self.padding)
    }

    /// Abstände der Distanzbänder: `k × distance_step_m` für k = 1..=distance_bands.
    pub fn band_distances(&self) -> Vec<f64> {
        (1..=self.distance_bands)
            .map(|k| k as f64 * self.distance_step_m)
            .collect()
    }

    pub fn validate(&self) -> PipelineResult<()> {
        let invalid = |message: String| Err(PipelineError::InvalidConfiguration { message });

        if self.sources.is_empty() {
            return invalid("At least one source shapefile is required.".to_string());
        }
        if !(self.field_of_view.is_finite() && self.field_of_view > 0.0) {
            return invalid(format!("field_of_view must be positive, got {}", self.field_of_view));
        }
        if !(self.padding.is_finite() && self.padding >= 0.0) {
            return invalid(format!("padding must not be negative, got {}", self.padding));
        }
        if !(self.simplification_tolerance.is_finite() && self.simplification_tolerance >= 0.0) {
            return invalid(format!(
                "simplification_tolerance must not be negative, got {}",
                self.simplification_tolerance
            ));
        }
        if self.distance_bands > 0 && !(self.distance_step_m.is_finite() && self.distance_step_m > 0.0) {
            return invalid(format!(
                "distance_step_m must be positive, got {}",
                self.distance_step_m
            ));
        }
        let extent = &self.grid_extent;
        if extent.min_easting >= extent.max_easting || extent.min_northing >= extent.max_northing {
            return invalid("grid_extent is empty.".to_string());
        }

        let mut stubs = std::collections::HashSet::new();
        for place in &self.places {
            if place.stub.is_empty() {
                return invalid(format!("Place '{}' has an empty stub.", place.name));
            }
            if !stubs.insert(place.stub.as_str()) {
                return invalid(format!("Stub '{}' is used by more than one place.", place.stub));
            }
            if !(-90.0..=90.0).contains(&place.latitude) || !(-180.0..=180.0).contains(&place.longitude) {
                return invalid(format!(
                    "Place '{}' has an invalid location ({}, {}).",
                    place.name, place.latitude, place.longitude
                ));
            }
        }
        Ok(())
    }
}
