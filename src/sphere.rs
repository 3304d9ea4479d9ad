//! Lon/lat ↔ unit-sphere xyz conversion and small vector helpers used by
//! the spherical clipping and great-circle area kernels.

/// A point in Cartesian coordinates on (or near) the unit sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Xyz {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Xyz { x, y, z }
    }

    pub fn sub(self, other: Xyz) -> Xyz {
        Xyz::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn cross(self, other: Xyz) -> Xyz {
        Xyz::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn dot(self, other: Xyz) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean norm.
    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn normalized(self) -> Xyz {
        let n = self.norm();
        Xyz::new(self.x / n, self.y / n, self.z / n)
    }

    /// Coincidence test within a small fixed tolerance.
    pub fn same_point(self, other: Xyz) -> bool {
        const SAME_POINT_EPS: f64 = 1.0e-12;
        self.sub(other).norm() < SAME_POINT_EPS
    }
}

/// Convert a longitude/latitude pair (radians) to a unit-sphere xyz point.
pub fn lonlat_to_xyz(lon: f64, lat: f64) -> Xyz {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    Xyz::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
}

/// Convert a unit-sphere xyz point back to longitude/latitude (radians).
pub fn xyz_to_lonlat(p: Xyz) -> (f64, f64) {
    let lat = p.z.clamp(-1.0, 1.0).asin();
    let lon = p.y.atan2(p.x);
    (lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn round_trips_lonlat() {
        for &(lon, lat) in &[
            (0.0, 0.0),
            (1.0, 0.5),
            (-2.3, -1.0),
            (std::f64::consts::PI - 0.01, 0.2),
        ] {
            let p = lonlat_to_xyz(lon, lat);
            let (lon2, lat2) = xyz_to_lonlat(p);
            assert_relative_eq!(lon, lon2, epsilon = 1e-9);
            assert_relative_eq!(lat, lat2, epsilon = 1e-9);
        }
    }

    #[test]
    fn cross_is_perpendicular_to_operands() {
        let a = Xyz::new(1.0, 0.0, 0.0);
        let b = Xyz::new(0.0, 1.0, 0.0);
        let c = a.cross(b);
        assert_relative_eq!(c.dot(a), 0.0, epsilon = 1e-12);
        assert_relative_eq!(c.dot(b), 0.0, epsilon = 1e-12);
        assert_relative_eq!(c.z, 1.0, epsilon = 1e-12);
    }
}
