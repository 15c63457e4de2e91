// src/geometry/projection/ellipsoid.rs

/// Referenzellipsoid, beschrieben durch große und kleine Halbachse (Meter).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub a: f64,
    pub b: f64,
}

impl Ellipsoid {
    /// Airy 1830 (OSGB36)
    pub const AIRY_1830: Ellipsoid = Ellipsoid {
        a: 6_377_563.396,
        b: 6_356_256.909,
    };

    /// WGS84
    pub const WGS84: Ellipsoid = Ellipsoid {
        a: 6_378_137.0,
        b: 6_356_752.314_2,
    };

    /// Erste numerische Exzentrizität zum Quadrat.
    pub fn e2(&self) -> f64 {
        1.0 - (self.b * self.b) / (self.a * self.a)
    }

    /// Drittabplattung n = (a - b) / (a + b).
    pub fn n(&self) -> f64 {
        (self.a - self.b) / (self.a + self.b)
    }

    /// Geodätische Koordinaten (Radiant, Höhe 0) nach kartesisch (Meter).
    pub fn to_cartesian(&self, lat: f64, lon: f64) -> [f64; 3] {
        let e2 = self.e2();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let nu = self.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        [
            nu * cos_lat * lon.cos(),
            nu * cos_lat * lon.sin(),
            (1.0 - e2) * nu * sin_lat,
        ]
    }

    /// Kartesisch nach geodätisch (Radiant). `None`, falls die Iteration nicht konvergiert.
    pub fn from_cartesian(&self, xyz: [f64; 3]) -> Option<(f64, f64)> {
        const MAX_ITERATIONS: usize = 16;
        const EPSILON: f64 = 1e-12;

        let [x, y, z] = xyz;
        let e2 = self.e2();
        let p = (x * x + y * y).sqrt();
        let lon = y.atan2(x);

        let mut lat = z.atan2(p * (1.0 - e2));
        for _ in 0..MAX_ITERATIONS {
            let sin_lat = lat.sin();
            let nu = self.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
            let next = (z + e2 * nu * sin_lat).atan2(p);
            if (next - lat).abs() < EPSILON {
                return Some((next, lon));
            }
            lat = next;
        }
        None
    }
}
