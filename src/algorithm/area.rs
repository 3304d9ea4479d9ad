//! Cell-area kernels.
//!
//! `poly_area` is the exact analytic integral of `sin(lat) dlon` around a
//! polygon whose edges are straight segments in the `(lon, lat)` plane —
//! by Green's theorem, `Area = -∮ sin(lat) dlon` for a region on the unit
//! sphere bounded by such a curve. Each edge contributes a closed form in
//! terms of its longitude span and its latitude midpoint/half-span, which
//! avoids any quadrature. `grid_area` is the companion kernel for a
//! polygon whose edges are great-circle arcs, via fan triangulation from
//! the first vertex and the Van Oosterom–Strackee solid-angle formula for
//! each triangle — this yields a *signed* area, so it doubles as a
//! convexity/orientation check.

use crate::algorithm::fix_lon::fix_lon;
use crate::error::{PolygonSlot, XgridError};
use crate::geometry::{CellPolygon, LonLat};
use crate::sphere::Xyz;
use std::f64::consts::PI;

/// Per-edge contribution to `-∮ sin(lat) dlon`, unscaled by `R²`.
fn edge_term(a: LonLat, b: LonLat) -> f64 {
    let mut dx = b.lon - a.lon;
    if dx == 0.0 {
        return 0.0;
    }
    if dx > PI {
        dx -= 2.0 * PI;
    }
    if dx < -PI {
        dx += 2.0 * PI;
    }
    let avg_lat = (a.lat + b.lat) / 2.0;
    let hdy = (b.lat - a.lat) / 2.0;
    let sinc = if hdy.abs() < 1.0e-10 {
        1.0 - hdy * hdy / 6.0
    } else {
        hdy.sin() / hdy
    };
    -dx * avg_lat.sin() * sinc
}

fn signed_area_dimensionless(vertices: &[LonLat]) -> f64 {
    let n = vertices.len();
    (0..n)
        .map(|i| edge_term(vertices[i], vertices[(i + 1) % n]))
        .sum()
}

/// Planar (lon/lat-plane) polygon area, `fix_lon`-adjusted with pivot `π`
/// before integrating, scaled by `radius²`.
pub fn poly_area(polygon: &CellPolygon, radius: f64) -> f64 {
    let adjusted = fix_lon(&polygon.vertices, PI);
    signed_area_dimensionless(&adjusted).abs() * radius * radius
}

/// As [`poly_area`], but without the `fix_lon` branch-cut adjustment —
/// for a 1-D grid with a single zonal point, where `fix_lon`'s branch
/// rotation would be meaningless.
pub fn poly_area_no_adjust(polygon: &CellPolygon, radius: f64) -> f64 {
    signed_area_dimensionless(&polygon.vertices).abs() * radius * radius
}

/// As [`poly_area`], but without the `radius²` scale factor.
pub fn poly_area_dimensionless(polygon: &CellPolygon) -> f64 {
    let adjusted = fix_lon(&polygon.vertices, PI);
    signed_area_dimensionless(&adjusted).abs()
}

/// Signed area (in solid-angle units, i.e. dimensionless, `radius = 1`) of
/// a spherical polygon with great-circle edges, given as unit-sphere xyz
/// vertices wound clockwise when viewed from outside the sphere. Positive
/// for a properly-wound convex polygon,
/// negative if the winding is reversed — callers use the sign as a
/// convexity check.
pub fn grid_area_dimensionless(vertices: &[Xyz]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let v0 = vertices[0];
    let mut total = 0.0;
    for i in 1..vertices.len() - 1 {
        let vi = vertices[i];
        let vip = vertices[i + 1];
        // Van Oosterom & Strackee solid-angle formula for the triangle
        // (v0, vi, vip), negated so that clockwise-from-outside winding
        // (this crate's convention for great-circle cells) is positive.
        let numerator = -v0.dot(vi.cross(vip));
        let d01 = v0.dot(vi);
        let d02 = v0.dot(vip);
        let d12 = vi.dot(vip);
        let denom = 1.0 + d01 + d02 + d12;
        total += 2.0 * numerator.atan2(denom);
    }
    total
}

/// [`grid_area_dimensionless`] scaled by `radius²`.
pub fn grid_area(vertices: &[Xyz], radius: f64) -> f64 {
    grid_area_dimensionless(vertices) * radius * radius
}

/// Validate that a great-circle polygon is convex (positive signed area).
pub fn require_convex(vertices: &[Xyz], which: PolygonSlot) -> Result<f64, XgridError> {
    let area = grid_area_dimensionless(vertices);
    if area <= 0.0 {
        Err(XgridError::NotConvex { which })
    } else {
        Ok(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphere::lonlat_to_xyz;
    use approx::assert_relative_eq;

    fn deg_quad(lons_deg: [f64; 4], lats_deg: [f64; 4]) -> CellPolygon {
        let verts = lons_deg
            .iter()
            .zip(lats_deg.iter())
            .map(|(&lo, &la)| LonLat::new(lo.to_radians(), la.to_radians()))
            .collect();
        CellPolygon::new(verts)
    }

    #[test]
    fn one_degree_cell_area_matches_known_value() {
        // A 1x1 degree cell at the equator; exact area is
        // R^2 * dlon * (sin(lat2) - sin(lat1)).
        let cell = deg_quad([0.0, 1.0, 1.0, 0.0], [0.0, 0.0, 1.0, 1.0]);
        let radius = 1.0;
        let expected =
            radius * radius * 1.0_f64.to_radians() * (1.0_f64.to_radians().sin() - 0.0_f64.sin());
        assert_relative_eq!(poly_area(&cell, radius), expected, epsilon = 1e-9);
    }

    #[test]
    fn dimensionless_matches_area_over_radius_squared() {
        let cell = deg_quad([10.0, 11.0, 11.0, 10.0], [20.0, 20.0, 21.0, 21.0]);
        let radius = 6371.0;
        let a = poly_area(&cell, radius);
        let d = poly_area_dimensionless(&cell);
        assert_relative_eq!(d, a / (radius * radius), epsilon = 1e-9);
    }

    #[test]
    fn great_circle_area_positive_for_clockwise_from_outside_quad() {
        // n0=(j,i), n1=(j+1,i), n2=(j+1,i+1), n3=(j,i+1).
        let corners = [
            lonlat_to_xyz(0.0_f64.to_radians(), 0.0_f64.to_radians()),
            lonlat_to_xyz(0.0_f64.to_radians(), 1.0_f64.to_radians()),
            lonlat_to_xyz(1.0_f64.to_radians(), 1.0_f64.to_radians()),
            lonlat_to_xyz(1.0_f64.to_radians(), 0.0_f64.to_radians()),
        ];
        let area = grid_area_dimensionless(&corners);
        assert!(area > 0.0, "expected positive area, got {area}");

        let mut reversed = corners;
        reversed.reverse();
        let area_rev = grid_area_dimensionless(&reversed);
        assert!(area_rev < 0.0, "expected negative area, got {area_rev}");
    }

    #[test]
    fn require_convex_rejects_reversed_winding() {
        let corners = [
            lonlat_to_xyz(0.0, 0.0),
            lonlat_to_xyz(0.0, 0.1),
            lonlat_to_xyz(0.1, 0.1),
            lonlat_to_xyz(0.1, 0.0),
        ];
        let mut reversed = corners;
        reversed.reverse();
        assert!(require_convex(&reversed, PolygonSlot::Subject).is_err());
    }
}
