// src/io/store.rs

use crate::geometry::error::{PipelineError, PipelineResult};
use crate::geometry::operations::{AggregationMode, BooleanUnion, GeometryAggregator};
use crate::geometry::polygon::{PolygonAssembler, split_pinched_record};
use crate::geometry::types::{Coordinate, SourceRecord};
use crate::pipeline::diagnostics::Diagnostics;
use geo::{LineString, MultiPolygon, Polygon, coord};
use geojson::{Geometry, Position, Value};
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Austauschdokument: eine GeoJSON-Geometrie vom Typ `Polygon` oder `MultiPolygon`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryDocument(Geometry);

impl GeometryDocument {
    /// Ein einzelnes Polygon wird je nach Option als `Polygon` geschrieben.
    pub fn from_multi_polygon(multi: &MultiPolygon<f64>, options: &StoreOptions) -> Self {
        let value = if options.single_as_polygon && multi.0.len() == 1 {
            Value::Polygon(polygon_positions(&multi.0[0]))
        } else {
            Value::MultiPolygon(multi.0.iter().map(polygon_positions).collect())
        };
        Self(Geometry::new(value))
    }

    pub fn parse(text: &str) -> PipelineResult<Self> {
        serde_json::from_str::<Geometry>(text)
            .map(Self)
            .map_err(|err| PipelineError::MalformedDocument {
                message: err.to_string(),
            })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.0
    }

    /// Rohe Ringverschachtelung, ein `SourceRecord` pro Polygon. Keine Prüfung.
    pub fn into_records(self) -> PipelineResult<Vec<SourceRecord>> {
        let polygons = match self.0.value {
            Value::Polygon(rings) => vec![rings],
            Value::MultiPolygon(polygons) => polygons,
            _ => {
                return Err(PipelineError::MalformedDocument {
                    message: "geometry type is not supported, expected Polygon or MultiPolygon"
                        .to_string(),
                });
            }
        };
        polygons
            .into_iter()
            .enumerate()
            .map(|(index, rings)| {
                let rings = rings
                    .iter()
                    .map(|ring| ring.iter().map(|p| to_coordinate(p, index)).collect())
                    .collect::<PipelineResult<Vec<Vec<Coordinate>>>>()?;
                Ok(SourceRecord::new(index, rings))
            })
            .collect()
    }
}

impl Serialize for GeometryDocument {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

fn polygon_positions(polygon: &Polygon<f64>) -> Vec<Vec<Position>> {
    let ring = |ls: &LineString<f64>| -> Vec<Position> { ls.0.iter().map(|c| vec![c.x, c.y]).collect() };
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(ring)
        .collect()
}

fn to_coordinate(position: &[f64], polygon: usize) -> PipelineResult<Coordinate> {
    match position {
        [x, y, ..] => Ok(coord! { x: *x, y: *y }),
        _ => Err(PipelineError::MalformedDocument {
            message: format!(
                "polygon {} has a position with {} values, at least 2 are required",
                polygon,
                position.len()
            ),
        }),
    }
}

/// Serialisierungsoptionen, bei jedem Aufruf explizit übergeben.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Einrückung in Leerzeichen
    pub indent: usize,
    /// Ergebnis mit genau einem Polygon als `Polygon` statt `MultiPolygon` schreiben
    pub single_as_polygon: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            indent: 4,
            single_as_polygon: true,
        }
    }
}

impl StoreOptions {
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_single_as_polygon(mut self, single_as_polygon: bool) -> Self {
        self.single_as_polygon = single_as_polygon;
        self
    }
}

/// Speichert und lädt MultiPolygone als Austauschdokument.
///
/// Geladene Dokumente gelten als ungeprüft und laufen erneut durch
/// Ring- und Polygon-Validierung, danach durch die Aggregation (Concatenate).
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryStore {
    options: StoreOptions,
    assembler: PolygonAssembler,
}

impl GeometryStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            assembler: PolygonAssembler::new(),
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn render(&self, multi: &MultiPolygon<f64>) -> PipelineResult<String> {
        let document = GeometryDocument::from_multi_polygon(multi, &self.options);
        let indent = vec![b' '; self.options.indent];
        let mut buffer = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(&indent));
        document.serialize(&mut serializer)?;
        buffer.push(b'\n');
        String::from_utf8(buffer).map_err(|err| PipelineError::MalformedDocument {
            message: err.to_string(),
        })
    }

    pub fn parse(
        &self,
        text: &str,
        diagnostics: &mut Diagnostics,
    ) -> PipelineResult<MultiPolygon<f64>> {
        let records: Vec<SourceRecord> = GeometryDocument::parse(text)?
            .into_records()?
            .iter()
            .flat_map(split_pinched_record)
            .collect();
        let polygons = self.assembler.assemble_all(&records, diagnostics);
        debug!(
            records = records.len(),
            polygons = polygons.len(),
            "Revalidated stored geometry"
        );
        GeometryAggregator::new(&BooleanUnion).aggregate(polygons, AggregationMode::Concatenate)
    }

    /// Schreibt zuerst in eine temporäre Datei im Zielverzeichnis und benennt
    /// sie danach um; eine vorhandene Datei wird nie halb überschrieben.
    pub fn save(&self, path: impl AsRef<Path>, multi: &MultiPolygon<f64>) -> PipelineResult<()> {
        let path = path.as_ref();
        let text = self.render(multi)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;
        file.persist(path)?;
        info!(path = %path.display(), polygons = multi.0.len(), "Saved geometry");
        Ok(())
    }

    pub fn load(
        &self,
        path: impl AsRef<Path>,
        diagnostics: &mut Diagnostics,
    ) -> PipelineResult<MultiPolygon<f64>> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let multi = self.parse(&text, diagnostics)?;
        info!(path = %path.display(), polygons = multi.0.len(), "Loaded geometry");
        Ok(multi)
    }
}
