//! Planar (lon/lat-plane) clippers.
//!
//! Two clippers, both classical Sutherland–Hodgman:
//! - [`clip_box`] clips a polygon against an axis-aligned rectangle in
//!   four passes, one per side.
//! - [`clip_polygon`] clips a convex polygon against another convex
//!   polygon, one pass per clip edge, using a signed-distance-from-edge
//!   test instead of the box's four independent half-plane tests.

use crate::error::XgridError;
use crate::geometry::{CellPolygon, LonLat};

/// Clip `polygon` (assumed counter-clockwise on the lon/lat plane) against
/// the axis-aligned rectangle `[ll, ur]`. Returns an empty polygon if any
/// of the four passes empties the vertex list.
pub fn clip_box(polygon: &CellPolygon, ll: LonLat, ur: LonLat) -> CellPolygon {
    let mut verts = polygon.vertices.clone();
    if verts.is_empty() {
        return CellPolygon::default();
    }

    // LEFT: keep lon >= ll.lon
    verts = clip_half_plane(&verts, |v| v.lon >= ll.lon, |a, b| {
        let y = a.lat + (ll.lon - a.lon) * (b.lat - a.lat) / (b.lon - a.lon);
        LonLat::new(ll.lon, y)
    });
    if verts.is_empty() {
        return CellPolygon::default();
    }

    // RIGHT: keep lon <= ur.lon
    verts = clip_half_plane(&verts, |v| v.lon <= ur.lon, |a, b| {
        let y = a.lat + (ur.lon - a.lon) * (b.lat - a.lat) / (b.lon - a.lon);
        LonLat::new(ur.lon, y)
    });
    if verts.is_empty() {
        return CellPolygon::default();
    }

    // BOTTOM: keep lat >= ll.lat
    verts = clip_half_plane(&verts, |v| v.lat >= ll.lat, |a, b| {
        let x = a.lon + (ll.lat - a.lat) * (b.lon - a.lon) / (b.lat - a.lat);
        LonLat::new(x, ll.lat)
    });
    if verts.is_empty() {
        return CellPolygon::default();
    }

    // TOP: keep lat <= ur.lat
    verts = clip_half_plane(&verts, |v| v.lat <= ur.lat, |a, b| {
        let x = a.lon + (ur.lat - a.lat) * (b.lon - a.lon) / (b.lat - a.lat);
        LonLat::new(x, ur.lat)
    });

    CellPolygon::new(verts)
}

fn clip_half_plane(
    verts: &[LonLat],
    inside: impl Fn(LonLat) -> bool,
    intersect: impl Fn(LonLat, LonLat) -> LonLat,
) -> Vec<LonLat> {
    let n = verts.len();
    let mut out = Vec::with_capacity(n + 1);
    let mut prev = verts[n - 1];
    let mut prev_inside = inside(prev);
    for &cur in verts {
        let cur_inside = inside(cur);
        if cur_inside != prev_inside {
            out.push(intersect(prev, cur));
        }
        if cur_inside {
            out.push(cur);
        }
        prev = cur;
        prev_inside = cur_inside;
    }
    out
}

/// Signed inside-test against the directed edge `e0 -> e1`: a point is
/// "inside" if it lies on the left of the edge (including exactly on it).
fn inside_edge(e0: LonLat, e1: LonLat, p: LonLat) -> bool {
    const SMALL: f64 = 1.0e-12;
    let product = (p.lon - e0.lon) * (e1.lat - e0.lat) + (e0.lon - e1.lon) * (p.lat - e0.lat);
    product <= SMALL
}

/// Clip convex polygon `subject` against convex polygon `clip`, both
/// counter-clockwise on the lon/lat plane. One Sutherland–Hodgman pass is
/// run per edge of `clip`.
pub fn clip_polygon(subject: &CellPolygon, clip: &CellPolygon) -> Result<CellPolygon, XgridError> {
    let mut verts = subject.vertices.clone();
    if verts.is_empty() || clip.is_empty() {
        return Ok(CellPolygon::default());
    }

    let cn = clip.len();
    let mut e0 = clip.vertices[cn - 1];
    for &e1 in &clip.vertices {
        if verts.is_empty() {
            break;
        }
        let n = verts.len();
        let mut out = Vec::with_capacity(n + 1);
        let mut prev = verts[n - 1];
        let mut prev_inside = inside_edge(e0, e1, prev);
        for &cur in &verts {
            let cur_inside = inside_edge(e0, e1, cur);
            if cur_inside != prev_inside {
                out.push(line_intersection(prev, cur, e0, e1)?);
            }
            if cur_inside {
                out.push(cur);
            }
            prev = cur;
            prev_inside = cur_inside;
        }
        verts = out;
        e0 = e1;
    }

    Ok(CellPolygon::new(verts))
}

/// Intersection of line `p0->p1` with line `e0->e1`, both extended
/// infinitely, via Cramer's rule on the 2x2 determinant form. Fails with
/// `ParallelEdges` if the determinant underflows.
fn line_intersection(p0: LonLat, p1: LonLat, e0: LonLat, e1: LonLat) -> Result<LonLat, XgridError> {
    const EPSLN30: f64 = 1.0e-30;
    let dy1 = p1.lat - p0.lat;
    let dx1 = p1.lon - p0.lon;
    let dy2 = e1.lat - e0.lat;
    let dx2 = e1.lon - e0.lon;
    let ds1 = p0.lat * p1.lon - p1.lat * p0.lon;
    let ds2 = e0.lat * e1.lon - e1.lat * e0.lon;
    let determ = dy2 * dx1 - dy1 * dx2;
    if determ.abs() < EPSLN30 {
        return Err(XgridError::ParallelEdges);
    }
    Ok(LonLat::new(
        (dx2 * ds1 - dx1 * ds2) / determ,
        (dy2 * ds1 - dy1 * ds2) / determ,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(lons: [f64; 4], lats: [f64; 4]) -> CellPolygon {
        CellPolygon::new(
            lons.iter()
                .zip(lats.iter())
                .map(|(&lo, &la)| LonLat::new(lo, la))
                .collect(),
        )
    }

    #[test]
    fn clip_box_fully_inside_is_unchanged() {
        let poly = quad([1.0, 2.0, 2.0, 1.0], [1.0, 1.0, 2.0, 2.0]);
        let out = clip_box(&poly, LonLat::new(0.0, 0.0), LonLat::new(5.0, 5.0));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn clip_box_disjoint_is_empty() {
        let poly = quad([10.0, 11.0, 11.0, 10.0], [10.0, 10.0, 11.0, 11.0]);
        let out = clip_box(&poly, LonLat::new(0.0, 0.0), LonLat::new(1.0, 1.0));
        assert!(out.is_empty());
    }

    #[test]
    fn clip_box_half_overlap_has_half_the_vertices_area() {
        let poly = quad([0.0, 2.0, 2.0, 0.0], [0.0, 0.0, 1.0, 1.0]);
        let out = clip_box(&poly, LonLat::new(1.0, -1.0), LonLat::new(3.0, 2.0));
        assert_eq!(out.len(), 4);
        for v in &out.vertices {
            assert!(v.lon >= 1.0 - 1e-9);
        }
    }

    #[test]
    fn clip_polygon_identity_overlap_returns_same_area() {
        let a = quad([0.0, 1.0, 1.0, 0.0], [0.0, 0.0, 1.0, 1.0]);
        let b = a.clone();
        let out = clip_polygon(&a, &b).unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn clip_polygon_disjoint_is_empty() {
        let a = quad([0.0, 1.0, 1.0, 0.0], [0.0, 0.0, 1.0, 1.0]);
        let b = quad([5.0, 6.0, 6.0, 5.0], [5.0, 5.0, 6.0, 6.0]);
        let out = clip_polygon(&a, &b).unwrap();
        assert!(out.is_empty());
    }
}
