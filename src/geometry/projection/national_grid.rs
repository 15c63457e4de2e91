// src/geometry/projection/national_grid.rs

use super::Reproject;
use super::ellipsoid::Ellipsoid;
use crate::geometry::types::Coordinate;
use crate::geometry::utils::constants::ARC_SECONDS_PER_RADIAN;
use geo::coord;
use serde::{Deserialize, Serialize};

/// Gültiger Bereich der Landeskoordinaten (Meter). Punkte außerhalb gelten als
/// nicht transformierbar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridExtent {
    pub min_easting: f64,
    pub max_easting: f64,
    pub min_northing: f64,
    pub max_northing: f64,
}

impl Default for GridExtent {
    fn default() -> Self {
        Self {
            min_easting: 0.0,
            max_easting: 700_000.0,
            min_northing: 0.0,
            max_northing: 1_300_000.0,
        }
    }
}

impl GridExtent {
    pub fn contains(&self, easting: f64, northing: f64) -> bool {
        (self.min_easting..=self.max_easting).contains(&easting)
            && (self.min_northing..=self.max_northing).contains(&northing)
    }
}

/// Parameter der querachsigen Mercatorprojektion.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TransverseMercator {
    ellipsoid: Ellipsoid,
    scale_factor: f64,
    /// Breite des wahren Ursprungs (Radiant)
    lat_origin: f64,
    /// Zentralmeridian (Radiant)
    lon_origin: f64,
    false_easting: f64,
    false_northing: f64,
}

/// Sieben-Parameter-Helmert-Transformation (Translation in Metern,
/// Maßstab in ppm, Rotation in Bogensekunden).
#[derive(Debug, Clone, Copy, PartialEq)]
struct Helmert {
    tx: f64,
    ty: f64,
    tz: f64,
    scale_ppm: f64,
    rx: f64,
    ry: f64,
    rz: f64,
}

impl Helmert {
    const OSGB36_TO_WGS84: Helmert = Helmert {
        tx: 446.448,
        ty: -125.157,
        tz: 542.060,
        scale_ppm: -20.4894,
        rx: 0.1502,
        ry: 0.2470,
        rz: 0.8421,
    };

    fn apply(&self, [x, y, z]: [f64; 3]) -> [f64; 3] {
        let s = 1.0 + self.scale_ppm * 1e-6;
        let rx = self.rx / ARC_SECONDS_PER_RADIAN;
        let ry = self.ry / ARC_SECONDS_PER_RADIAN;
        let rz = self.rz / ARC_SECONDS_PER_RADIAN;
        [
            self.tx + s * x - rz * y + ry * z,
            self.ty + rz * x + s * y - rx * z,
            self.tz - ry * x + rx * y + s * z,
        ]
    }
}

/// Ordnance Survey National Grid (OSGB36) nach WGS84-Länge/Breite.
///
/// Rechtswert/Hochwert werden zuerst invers auf OSGB36-Länge/Breite
/// (Airy 1830) projiziert, dann per Helmert nach WGS84 verschoben.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NationalGrid {
    extent: GridExtent,
    projection: TransverseMercator,
    datum_shift: Helmert,
}

impl Default for NationalGrid {
    fn default() -> Self {
        Self::new(GridExtent::default())
    }
}

impl NationalGrid {
    const MAX_ITERATIONS: usize = 64;
    /// Abbruchschwelle der Breiteniteration (0,01 mm)
    const MERIDIAN_TOLERANCE: f64 = 1e-5;

    pub fn new(extent: GridExtent) -> Self {
        Self {
            extent,
            projection: TransverseMercator {
                ellipsoid: Ellipsoid::AIRY_1830,
                scale_factor: 0.999_601_271_7,
                lat_origin: 49f64.to_radians(),
                lon_origin: (-2f64).to_radians(),
                false_easting: 400_000.0,
                false_northing: -100_000.0,
            },
            datum_shift: Helmert::OSGB36_TO_WGS84,
        }
    }

    pub fn extent(&self) -> &GridExtent {
        &self.extent
    }

    /// Meridianbogenlänge vom wahren Ursprung bis zur Breite `lat`.
    fn meridional_arc(&self, lat: f64) -> f64 {
        let tm = &self.projection;
        let n = tm.ellipsoid.n();
        let (n2, n3) = (n * n, n * n * n);
        let d = lat - tm.lat_origin;
        let s = lat + tm.lat_origin;
        tm.ellipsoid.b
            * tm.scale_factor
            * ((1.0 + n + 1.25 * n2 + 1.25 * n3) * d
                - (3.0 * n + 3.0 * n2 + 21.0 / 8.0 * n3) * d.sin() * s.cos()
                + (15.0 / 8.0 * n2 + 15.0 / 8.0 * n3) * (2.0 * d).sin() * (2.0 * s).cos()
                - 35.0 / 24.0 * n3 * (3.0 * d).sin() * (3.0 * s).cos())
    }

    /// Inverse Projektion auf OSGB36: (Breite, Länge) in Radiant.
    /// Prüft weder den Gültigkeitsbereich noch die Endlichkeit der Eingabe.
    pub fn grid_to_osgb36(&self, easting: f64, northing: f64) -> Option<(f64, f64)> {
        let tm = &self.projection;
        let a_f0 = tm.ellipsoid.a * tm.scale_factor;
        let e2 = tm.ellipsoid.e2();
        let dn = northing - tm.false_northing;

        let mut lat = dn / a_f0 + tm.lat_origin;
        let mut arc = self.meridional_arc(lat);
        let mut iterations = 0;
        while (dn - arc).abs() >= Self::MERIDIAN_TOLERANCE {
            iterations += 1;
            if iterations > Self::MAX_ITERATIONS {
                return None;
            }
            lat += (dn - arc) / a_f0;
            arc = self.meridional_arc(lat);
        }

        let sin_lat = lat.sin();
        let denom = 1.0 - e2 * sin_lat * sin_lat;
        let nu = a_f0 / denom.sqrt();
        let rho = a_f0 * (1.0 - e2) / denom.powf(1.5);
        let eta2 = nu / rho - 1.0;

        let tan = lat.tan();
        let (t2, t4, t6) = (tan * tan, tan.powi(4), tan.powi(6));
        let sec = 1.0 / lat.cos();

        let vii = tan / (2.0 * rho * nu);
        let viii = tan / (24.0 * rho * nu.powi(3)) * (5.0 + 3.0 * t2 + eta2 - 9.0 * t2 * eta2);
        let ix = tan / (720.0 * rho * nu.powi(5)) * (61.0 + 90.0 * t2 + 45.0 * t4);
        let x = sec / nu;
        let xi = sec / (6.0 * nu.powi(3)) * (nu / rho + 2.0 * t2);
        let xii = sec / (120.0 * nu.powi(5)) * (5.0 + 28.0 * t2 + 24.0 * t4);
        let xiia = sec / (5040.0 * nu.powi(7)) * (61.0 + 662.0 * t2 + 1320.0 * t4 + 720.0 * t6);

        let de = easting - tm.false_easting;
        let lat = lat - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6);
        let lon =
            tm.lon_origin + x * de - xi * de.powi(3) + xii * de.powi(5) - xiia * de.powi(7);
        Some((lat, lon))
    }

    /// OSGB36 (Radiant) nach WGS84 (Radiant).
    fn osgb36_to_wgs84(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        let xyz = self.projection.ellipsoid.to_cartesian(lat, lon);
        Ellipsoid::WGS84.from_cartesian(self.datum_shift.apply(xyz))
    }
}

impl Reproject for NationalGrid {
    fn project(&self, coordinate: Coordinate) -> Option<Coordinate> {
        let (easting, northing) = (coordinate.x, coordinate.y);
        if !easting.is_finite() || !northing.is_finite() {
            return None;
        }
        if !self.extent.contains(easting, northing) {
            return None;
        }
        let (lat, lon) = self.grid_to_osgb36(easting, northing)?;
        let (lat, lon) = self.osgb36_to_wgs84(lat, lon)?;
        let (lat, lon) = (lat.to_degrees(), lon.to_degrees());
        (lat.is_finite() && lon.is_finite()).then(|| coord! { x: lon, y: lat })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_true_origin_maps_to_origin() {
        let (lat, lon) = NationalGrid::default()
            .grid_to_osgb36(400_000.0, -100_000.0)
            .unwrap();
        assert_abs_diff_eq!(lat.to_degrees(), 49.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lon.to_degrees(), -2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_inverse_projection_reference_point() {
        // Referenzpunkt aus dem OS-Handbuch: 52°39'27.2531"N, 1°43'4.5177"E
        let (lat, lon) = NationalGrid::default()
            .grid_to_osgb36(651_409.903, 313_177.270)
            .unwrap();
        assert_abs_diff_eq!(lat.to_degrees(), 52.657_570_3, epsilon = 1e-6);
        assert_abs_diff_eq!(lon.to_degrees(), 1.717_921_6, epsilon = 1e-6);
    }

    #[test]
    fn test_project_to_wgs84() {
        let projected = NationalGrid::default()
            .project(coord! { x: 651_409.903, y: 313_177.270 })
            .unwrap();
        assert_abs_diff_eq!(projected.y, 52.657_979, epsilon = 1e-4);
        assert_abs_diff_eq!(projected.x, 1.716_052, epsilon = 1e-4);
    }

    #[test]
    fn test_projection_undefined_outside_extent() {
        let grid = NationalGrid::default();
        assert!(grid.project(coord! { x: -10.0, y: 100.0 }).is_none());
        assert!(grid.project(coord! { x: 100.0, y: 2_000_000.0 }).is_none());
        assert!(grid.project(coord! { x: f64::NAN, y: 100.0 }).is_none());
    }
}
