//! Centroid integrals, plus a box-centroid specialization for
//! axis-aligned lon/lat rectangles.
//!
//! Each function returns an area-weighted *moment*, scaled by `radius²`;
//! a caller divides by the polygon's own area (also `radius²`-scaled) to
//! recover the centroid coordinate, so the two scale factors cancel.

use crate::geometry::{CellPolygon, LonLat};
use std::f64::consts::PI;

/// Latitude centroid moment of a spherical polygon.
pub fn poly_ctrlat(polygon: &CellPolygon, radius: f64) -> f64 {
    let n = polygon.len();
    let verts = &polygon.vertices;
    let mut ctrlat = 0.0;
    for i in 0..n {
        let ip = (i + 1) % n;
        let mut dx = verts[ip].lon - verts[i].lon;
        if dx == 0.0 {
            continue;
        }
        let lat1 = verts[ip].lat;
        let lat2 = verts[i].lat;
        let dy = lat2 - lat1;
        let hdy = dy * 0.5;
        let avg_y = (lat1 + lat2) * 0.5;
        if dx > PI {
            dx -= 2.0 * PI;
        }
        if dx < -PI {
            dx += 2.0 * PI;
        }
        if hdy.abs() < 1.0e-10 {
            ctrlat -= dx * (2.0 * avg_y.cos() + lat2 * avg_y.sin() - lat1.cos());
        } else {
            ctrlat -= dx * ((hdy.sin() / hdy) * (2.0 * avg_y.cos() + lat2 * avg_y.sin()) - lat1.cos());
        }
    }
    ctrlat * radius * radius
}

/// Longitude centroid moment of a spherical polygon, referenced to pivot
/// longitude `clon` (so the result lands in the same branch as the
/// polygon's own center, avoiding an antimeridian discontinuity).
pub fn poly_ctrlon(polygon: &CellPolygon, clon: f64, radius: f64) -> f64 {
    let n = polygon.len();
    let verts = &polygon.vertices;
    let mut ctrlon = 0.0;
    for i in 0..n {
        let ip = (i + 1) % n;
        let phi1 = verts[ip].lon;
        let phi2 = verts[i].lon;
        let lat1 = verts[ip].lat;
        let lat2 = verts[i].lat;
        let mut dphi = phi1 - phi2;
        if dphi == 0.0 {
            continue;
        }
        let f1 = 0.5 * (lat1.cos() * lat1.sin() + lat1);
        let f2 = 0.5 * (lat2.cos() * lat2.sin() + lat2);

        if dphi > PI {
            dphi -= 2.0 * PI;
        }
        if dphi < -PI {
            dphi += 2.0 * PI;
        }
        let mut dphi1 = phi1 - clon;
        if dphi1 > PI {
            dphi1 -= 2.0 * PI;
        }
        if dphi1 < -PI {
            dphi1 += 2.0 * PI;
        }
        let mut dphi2 = phi2 - clon;
        if dphi2 > PI {
            dphi2 -= 2.0 * PI;
        }
        if dphi2 < -PI {
            dphi2 += 2.0 * PI;
        }

        if (dphi2 - dphi1).abs() < PI {
            ctrlon -= dphi * (dphi1 * f1 + dphi2 * f2) / 2.0;
        } else {
            let fac = if dphi1 > 0.0 { PI } else { -PI };
            let fint = f1 + (f2 - f1) * (fac - dphi1) / dphi.abs();
            ctrlon -=
                0.5 * dphi1 * (dphi1 - fac) * f1 - 0.5 * dphi2 * (dphi2 + fac) * f2
                    + 0.5 * fac * (dphi1 + dphi2) * fint;
        }
    }
    ctrlon * radius * radius
}

/// Latitude centroid moment of an axis-aligned lon/lat box.
pub fn box_ctrlat(ll: LonLat, ur: LonLat, radius: f64) -> f64 {
    let mut dphi = ur.lon - ll.lon;
    if dphi > PI {
        dphi -= 2.0 * PI;
    }
    if dphi < -PI {
        dphi += 2.0 * PI;
    }
    let ctrlat = dphi
        * (ur.lat.cos() + ur.lat * ur.lat.sin() - (ll.lat.cos() + ll.lat * ll.lat.sin()));
    ctrlat * radius * radius
}

/// Longitude centroid moment of an axis-aligned lon/lat box, referenced to
/// pivot longitude `clon`.
pub fn box_ctrlon(ll: LonLat, ur: LonLat, clon: f64, radius: f64) -> f64 {
    let mut ctrlon = 0.0;
    for pass in 0..2 {
        let (phi1, phi2, lat1, lat2) = if pass == 0 {
            (ur.lon, ll.lon, ll.lat, ll.lat)
        } else {
            (ll.lon, ur.lon, ur.lat, ur.lat)
        };
        let mut dphi = phi1 - phi2;
        let f1 = 0.5 * (lat1.cos() * lat1.sin() + lat1);
        let f2 = 0.5 * (lat2.cos() * lat2.sin() + lat2);
        if dphi > PI {
            dphi -= 2.0 * PI;
        }
        if dphi < -PI {
            dphi += 2.0 * PI;
        }
        let mut dphi1 = phi1 - clon;
        if dphi1 > PI {
            dphi1 -= 2.0 * PI;
        }
        if dphi1 < -PI {
            dphi1 += 2.0 * PI;
        }
        let mut dphi2 = phi2 - clon;
        if dphi2 > PI {
            dphi2 -= 2.0 * PI;
        }
        if dphi2 < -PI {
            dphi2 += 2.0 * PI;
        }

        if (dphi2 - dphi1).abs() < PI {
            ctrlon -= dphi * (dphi1 * f1 + dphi2 * f2) / 2.0;
        } else {
            let fac = if dphi1 > 0.0 { PI } else { -PI };
            let fint = f1 + (f2 - f1) * (fac - dphi1) / dphi.abs();
            ctrlon -=
                0.5 * dphi1 * (dphi1 - fac) * f1 - 0.5 * dphi2 * (dphi2 + fac) * f2
                    + 0.5 * fac * (dphi1 + dphi2) * fint;
        }
    }
    ctrlon * radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::area::poly_area;
    use approx::assert_relative_eq;

    #[test]
    fn centroid_of_small_cell_is_near_its_center() {
        let lons = [10.0_f64, 11.0, 11.0, 10.0].map(f64::to_radians);
        let lats = [20.0_f64, 20.0, 21.0, 21.0].map(f64::to_radians);
        let verts = lons
            .iter()
            .zip(lats.iter())
            .map(|(&lo, &la)| LonLat::new(lo, la))
            .collect();
        let poly = CellPolygon::new(verts);
        let radius = 1.0;
        let area = poly_area(&poly, radius);
        let clon = poly_ctrlon(&poly, 10.5_f64.to_radians(), radius) / area;
        let clat = poly_ctrlat(&poly, radius) / area;
        assert_relative_eq!(clon, 10.5_f64.to_radians(), epsilon = 1e-3);
        assert_relative_eq!(clat, 20.5_f64.to_radians(), epsilon = 1e-3);
    }

    #[test]
    fn box_centroid_matches_polygon_centroid_for_a_box() {
        let ll = LonLat::new(10.0_f64.to_radians(), 20.0_f64.to_radians());
        let ur = LonLat::new(11.0_f64.to_radians(), 21.0_f64.to_radians());
        let poly = CellPolygon::new(vec![
            ll,
            LonLat::new(ur.lon, ll.lat),
            ur,
            LonLat::new(ll.lon, ur.lat),
        ]);
        let radius = 1.0;
        let clon_pivot = 10.5_f64.to_radians();
        let area = poly_area(&poly, radius);

        let poly_lon = poly_ctrlon(&poly, clon_pivot, radius) / area;
        let poly_lat = poly_ctrlat(&poly, radius) / area;
        let box_lon = box_ctrlon(ll, ur, clon_pivot, radius) / area;
        let box_lat = box_ctrlat(ll, ur, radius) / area;

        assert_relative_eq!(poly_lon, box_lon, epsilon = 1e-9);
        assert_relative_eq!(poly_lat, box_lat, epsilon = 1e-9);
    }
}
