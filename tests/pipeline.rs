// tests/pipeline.rs

use approx::assert_relative_eq;
use geo::{Area, BoundingRect, MultiPolygon, Polygon, coord, polygon};
use landmask::prelude::*;
use landmask::pipeline::ingest::ShapefileIngest;
use std::path::Path;
use std::sync::Arc;

/// Ersetzt jedes Polygon durch seine um `distance_m` (1 m = 1e-5 Grad) vergrößerte Bounding Box.
struct BoxBuffer;

impl BufferService for BoxBuffer {
    fn buffer(&self, geometry: &MultiPolygon<f64>, distance_m: f64) -> PipelineResult<PolygonalGeometry> {
        let d = distance_m * 1e-5;
        let boxes = geometry
            .0
            .iter()
            .filter_map(|p| p.bounding_rect())
            .map(|r| {
                polygon![
                    (x: r.min().x - d, y: r.min().y - d),
                    (x: r.max().x + d, y: r.min().y - d),
                    (x: r.max().x + d, y: r.max().y + d),
                    (x: r.min().x - d, y: r.max().y + d),
                ]
            })
            .collect();
        Ok(PolygonalGeometry::MultiPolygon(MultiPolygon::new(boxes)))
    }
}

/// Liefert zwei sich überlappende Quadrate, unabhängig von der Eingabe.
struct OverlappingBuffer;

impl BufferService for OverlappingBuffer {
    fn buffer(&self, _geometry: &MultiPolygon<f64>, _distance_m: f64) -> PipelineResult<PolygonalGeometry> {
        Ok(PolygonalGeometry::MultiPolygon(MultiPolygon::new(vec![
            square(0.0, 0.0, 2.0),
            square(1.0, 1.0, 2.0),
        ])))
    }
}

fn square(x0: f64, y0: f64, size: f64) -> Polygon<f64> {
    polygon![
        (x: x0, y: y0),
        (x: x0 + size, y: y0),
        (x: x0 + size, y: y0 + size),
        (x: x0, y: y0 + size),
    ]
}

fn base_geometry() -> MultiPolygon<f64> {
    MultiPolygon::new(vec![square(-1.5, 51.5, 0.2), square(-1.0, 52.0, 0.1)])
}

fn config(out: &Path) -> PipelineConfig {
    PipelineConfig::new()
        .with_source(out.join("missing.shp"))
        .with_place(Place::new("Oxford", "oxford", 51.752, -1.2577))
        .with_distance_bands(2, 500.0)
        .with_output_dir(out)
}

fn grid_ring(points: &[(f64, f64)]) -> Vec<Coordinate> {
    points.iter().map(|&(x, y)| coord! { x: x, y: y }).collect()
}

fn grid_square(index: usize, easting: f64, northing: f64, size: f64) -> SourceRecord {
    SourceRecord::new(
        index,
        vec![grid_ring(&[
            (easting, northing),
            (easting + size, northing),
            (easting + size, northing + size),
            (easting, northing + size),
            (easting, northing),
        ])],
    )
}

#[test]
fn test_cached_ingest_feeds_distance_bands() {
    let dir = tempfile::tempdir().unwrap();
    let store = GeometryStore::default();
    store.save(dir.path().join("oxford.geojson"), &base_geometry()).unwrap();

    let services = PipelineServices::new(GridExtent::default()).with_buffer(Arc::new(BoxBuffer));
    let summary = Orchestrator::new(config(dir.path()), services).unwrap().run();

    assert_eq!(summary.failed().count(), 0);
    let reports: Vec<&UnitReport> = summary.succeeded().collect();
    assert_eq!(reports.len(), 3);
    let ingest = reports.iter().find(|r| r.name == "oxford").unwrap();
    assert!(ingest.cached);
    assert_eq!(ingest.polygons, 2);

    let mut diagnostics = Diagnostics::new("test");
    let band = store
        .load(dir.path().join("oxford1000m.geojson"), &mut diagnostics)
        .unwrap();
    // 0,01 Grad Rand um beide Quadrate
    let expected = 0.22 * 0.22 + 0.12 * 0.12;
    assert_relative_eq!(band.unsigned_area(), expected, epsilon = 1e-9);
    assert!(dir.path().join("oxford0500m.geojson").exists());
}

#[test]
fn test_existing_band_output_is_reused() {
    let dir = tempfile::tempdir().unwrap();
    let store = GeometryStore::default();
    store.save(dir.path().join("oxford.geojson"), &base_geometry()).unwrap();
    store
        .save(dir.path().join("oxford0500m.geojson"), &MultiPolygon::new(vec![square(5.0, 5.0, 1.0)]))
        .unwrap();

    let services = PipelineServices::new(GridExtent::default()).with_buffer(Arc::new(BoxBuffer));
    let summary = Orchestrator::new(config(dir.path()), services).unwrap().run();

    let band = summary.succeeded().find(|r| r.name == "oxford0500m").unwrap();
    assert!(band.cached);
    assert_eq!(band.polygons, 1);
}

#[test]
fn test_failed_unit_does_not_stop_others() {
    let dir = tempfile::tempdir().unwrap();
    GeometryStore::default()
        .save(dir.path().join("oxford.geojson"), &base_geometry())
        .unwrap();

    // Für Cambridge gibt es weder Ausgabe noch lesbare Quelle
    let config = config(dir.path()).with_place(Place::new("Cambridge", "cambridge", 52.2053, 0.1218));
    let services = PipelineServices::new(GridExtent::default()).with_buffer(Arc::new(BoxBuffer));
    let summary = Orchestrator::new(config, services).unwrap().run();

    let failed: Vec<&str> = summary.failed().map(|(unit, _)| unit).collect();
    assert_eq!(failed, vec!["cambridge"]);
    assert_eq!(summary.succeeded().count(), 3);
    assert!(!dir.path().join("cambridge0500m.geojson").exists());
}

#[test]
fn test_invalid_aggregate_is_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    GeometryStore::default()
        .save(dir.path().join("oxford.geojson"), &base_geometry())
        .unwrap();

    let services =
        PipelineServices::new(GridExtent::default()).with_buffer(Arc::new(OverlappingBuffer));
    let summary = Orchestrator::new(config(dir.path()), services).unwrap().run();

    let failures: Vec<(&str, &PipelineError)> = summary.failed().collect();
    assert_eq!(failures.len(), 2);
    assert!(failures
        .iter()
        .all(|(_, err)| matches!(err, PipelineError::AggregateInvalid(_))));
    assert!(!dir.path().join("oxford0500m.geojson").exists());
    assert!(!dir.path().join("oxford1000m.geojson").exists());
}

#[test]
fn test_national_grid_records_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let services = PipelineServices::new(config.grid_extent);
    let ingest = ShapefileIngest::new(
        &services,
        config.viewport(&config.places[0]),
        config.simplification_tolerance,
    );

    let records = vec![
        // Zwei sich überlappende Quadrate bei Oxford
        grid_square(0, 450_000.0, 205_000.0, 2_000.0),
        grid_square(1, 451_000.0, 206_000.0, 2_000.0),
        // Eine Acht
        SourceRecord::new(
            2,
            vec![grid_ring(&[
                (460_000.0, 200_000.0),
                (461_000.0, 201_000.0),
                (461_000.0, 200_000.0),
                (460_000.0, 201_000.0),
            ])],
        ),
        // Edinburgh liegt außerhalb des Sichtbereichs
        grid_square(3, 325_000.0, 673_000.0, 2_000.0),
        // Außerhalb des National Grid
        grid_square(4, -5_000.0, 205_000.0, 2_000.0),
    ];

    let mut diagnostics = Diagnostics::new("oxford");
    let polygons = ingest.ingest_records(&records, &mut diagnostics);
    assert_eq!(polygons.len(), 2);
    assert_eq!(diagnostics.count(Stage::Ring), 1);
    assert_eq!(diagnostics.count(Stage::Viewport), 1);
    assert_eq!(diagnostics.count(Stage::Projection), 1);

    let merged = GeometryAggregator::new(&BooleanUnion)
        .aggregate(polygons, AggregationMode::Union)
        .unwrap();
    assert_eq!(merged.0.len(), 1);
    let bounds = merged.bounding_rect().unwrap();
    assert!(bounds.min().x > -1.8 && bounds.max().x < -1.2);
    assert!(bounds.min().y > 51.5 && bounds.max().y < 52.0);

    let store = GeometryStore::default();
    let path = dir.path().join("oxford.geojson");
    store.save(&path, &merged).unwrap();
    let mut reload = Diagnostics::new("reload");
    let loaded = store.load(&path, &mut reload).unwrap();
    assert_relative_eq!(loaded.unsigned_area(), merged.unsigned_area(), epsilon = 1e-12);
    assert!(reload.entries().is_empty());
}
