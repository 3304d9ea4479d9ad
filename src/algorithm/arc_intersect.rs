//! Great-circle arc intersection.
//!
//! Each arc is treated as the intersection of the unit sphere with the
//! plane spanned by its two endpoints and the sphere's center; since that
//! plane always passes through the origin, intersecting a line segment
//! with it reduces to a single dot-product ratio rather than a general
//! plane/segment intersection.

use crate::config::XgridConfig;
use crate::sphere::Xyz;

/// Result of intersecting subject arc `a1->a2` against clip arc `q1->q2`.
#[derive(Debug, Clone, Copy)]
pub struct ArcIntersection {
    pub point: Xyz,
    /// Parametric position along the subject edge, in `[0, 1]`.
    pub u_a: f64,
    /// Parametric position along the clip edge, in `[0, 1]`.
    pub u_q: f64,
    /// 0 = undetermined (resolved later from surrounding edge geometry),
    /// 1 = subject edge crosses out of the clip polygon, 2 = crosses in.
    pub inbound: u8,
}

/// Intersect a line segment `p0->p1` with the plane through the origin
/// spanned by `plane_a`/`plane_b`, returning the segment parameter `t`
/// such that `p0 + t*(p1-p0)` lies on the plane, or `None` if the segment
/// is (numerically) parallel to the plane.
fn segment_plane_param(p0: Xyz, p1: Xyz, plane_a: Xyz, plane_b: Xyz, epsln30: f64) -> Option<f64> {
    let normal = plane_a.cross(plane_b);
    let dir = p1.sub(p0);
    let denom = normal.dot(dir);
    if denom.abs() < epsln30 {
        return None;
    }
    Some(-normal.dot(p0) / denom)
}

fn snap01(mut u: f64, epsln8: f64) -> f64 {
    if u.abs() < epsln8 {
        u = 0.0;
    }
    if (u - 1.0).abs() < epsln8 {
        u = 1.0;
    }
    u
}

/// Intersect the subject arc `a1->a2` with the clip arc `q1->q2`, where
/// `q3` is the clip polygon's next vertex after `q2` (needed to classify
/// the inbound sense of the crossing). Returns `None` if the arcs don't
/// cross within their segments, or if the two great circles coincide.
pub fn line_intersect_2d_3d(
    a1: Xyz,
    a2: Xyz,
    q1: Xyz,
    q2: Xyz,
    q3: Xyz,
    cfg: &XgridConfig,
) -> Option<ArcIntersection> {
    if a1.same_point(q1) {
        return Some(ArcIntersection { point: a1, u_a: 0.0, u_q: 0.0, inbound: 0 });
    }
    if a1.same_point(q2) {
        return Some(ArcIntersection { point: a1, u_a: 0.0, u_q: 1.0, inbound: 0 });
    }
    if a2.same_point(q1) {
        return Some(ArcIntersection { point: a2, u_a: 1.0, u_q: 0.0, inbound: 0 });
    }
    if a2.same_point(q2) {
        return Some(ArcIntersection { point: a2, u_a: 1.0, u_q: 1.0, inbound: 0 });
    }

    let mut u_a = segment_plane_param(a1, a2, q1, q2, cfg.epsln30)?;
    u_a = snap01(u_a, cfg.epsln8);
    if !(0.0..=1.0).contains(&u_a) {
        return None;
    }

    let mut u_q = segment_plane_param(q1, q2, a1, a2, cfg.epsln30)?;
    u_q = snap01(u_q, cfg.epsln8);
    if !(0.0..=1.0).contains(&u_q) {
        return None;
    }

    // Coincident-great-circle rejection: the cross of the two arc-plane
    // normals should be well away from zero.
    let c1 = a1.cross(a2);
    let c2 = q1.cross(q2);
    let c3 = c1.cross(c2);
    if c3.norm().abs() < cfg.epsln30 {
        return None;
    }

    let raw = Xyz::new(
        a1.x + u_a * (a2.x - a1.x),
        a1.y + u_a * (a2.y - a1.y),
        a1.z + u_a * (a2.z - a1.z),
    );
    let point = raw.normalized();

    let inbound = if u_q != 0.0 && u_q != 1.0 {
        let p1 = a2.sub(a1);
        let v1 = q2.sub(q1);
        let v2 = q3.sub(q2);
        let c1 = v1.cross(v2);
        let c2 = v1.cross(p1);
        let sense = c1.dot(c2);
        if sense > 0.0 {
            2
        } else {
            1
        }
    } else {
        0
    };

    Some(ArcIntersection { point, u_a, u_q, inbound })
}
