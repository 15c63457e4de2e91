// src/debug/visualization/svg.rs
use geo::{BoundingRect, Coord, LineString, Polygon, Rect};
use std::path::Path;
use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Path as SvgPath, Rectangle};
use tracing::debug;

// ===================================================================================
// HILFS-STRUCT für die SVG-Erstellung
// ===================================================================================
/// Zeichnet Geometrien in ein SVG-Dokument, dessen ViewBox an der Bounding Box
/// der Geometrie ausgerichtet ist.
struct SvgBuilder {
    document: Document,
    bounds: Rect<f64>,
    // Relative Größen, abhängig von der Ausdehnung
    stroke_w_normal: f64,
    stroke_w_thin: f64,
}

impl SvgBuilder {
    fn new(bounds: Rect<f64>) -> Self {
        // Degenerierte Boxen (Linie, Punkt) trotzdem sichtbar machen
        let width = bounds.width().max(1e-9);
        let height = bounds.height().max(1e-9);
        let margin = (width + height) / 2.0 * 0.05;

        let stroke_w_normal = (width + height) / 2.0 * 0.005;
        let stroke_w_thin = (width + height) / 2.0 * 0.002;

        let document = Document::new()
            .set(
                "viewBox",
                (-margin, -margin, width + 2.0 * margin, height + 2.0 * margin),
            )
            .add(
                Rectangle::new()
                    .set("x", -margin)
                    .set("y", -margin)
                    .set("width", width + 2.0 * margin)
                    .set("height", height + 2.0 * margin)
                    .set("fill", "#f0f0f0"),
            );

        Self {
            document,
            bounds,
            stroke_w_normal,
            stroke_w_thin,
        }
    }

    /// Relativ zur Bounding Box rechnen, y-Achse nach unten.
    fn local(&self, coord: &Coord<f64>) -> (f64, f64) {
        (
            coord.x - self.bounds.min().x,
            self.bounds.max().y - coord.y,
        )
    }

    fn ring_data(&self, data: Data, ring: &LineString<f64>) -> Data {
        let mut coords = ring.0.iter();
        let Some(first) = coords.next() else {
            return data;
        };
        let data = coords.fold(data.move_to(self.local(first)), |data, coord| {
            data.line_to(self.local(coord))
        });
        data.close()
    }

    /// Außen- und Innenringe als ein Pfad mit evenodd-Füllung.
    fn draw_polygon(mut self, polygon: &Polygon<f64>, reason: &str) -> Self {
        let data = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .fold(Data::new(), |data, ring| self.ring_data(data, ring));

        let path = SvgPath::new()
            .set("d", data)
            .set("fill", "rgba(200, 150, 255, 0.7)")
            .set("fill-rule", "evenodd")
            .set("stroke", "#5500aa")
            .set("stroke-width", self.stroke_w_normal)
            .set("data-reason", reason);
        self.document = self.document.add(path);
        self
    }

    /// Vertices markieren, damit doppelte oder kollineare Punkte auffallen.
    fn draw_vertices(mut self, polygon: &Polygon<f64>) -> Self {
        let size = self.stroke_w_thin * 3.0;
        let coords: Vec<(f64, f64)> = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .flat_map(|ring| ring.0.iter())
            .map(|coord| self.local(coord))
            .collect();
        for (x, y) in coords {
            self.document = self.document.add(
                Rectangle::new()
                    .set("x", x - size / 2.0)
                    .set("y", y - size / 2.0)
                    .set("width", size)
                    .set("height", size)
                    .set("fill", "#cc0000"),
            );
        }
        self
    }

    fn save(self, path: &Path) -> std::io::Result<()> {
        svg::save(path, &self.document)?;
        debug!("Debug SVG '{}' wurde erstellt.", path.display());
        Ok(())
    }
}

/// Schreibt ein verworfenes Polygon als SVG; `reason` landet im Attribut `data-reason`.
pub fn dump_polygon_svg(path: &Path, polygon: &Polygon<f64>, reason: &str) -> std::io::Result<()> {
    let Some(bounds) = polygon.bounding_rect() else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "polygon has no coordinates",
        ));
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    SvgBuilder::new(bounds)
        .draw_polygon(polygon, reason)
        .draw_vertices(polygon)
        .save(path)
}
