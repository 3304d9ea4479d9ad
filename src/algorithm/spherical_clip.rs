//! Spherical clipper: Weiler–Atherton clip of two convex spherical
//! polygons.
//!
//! The flow is: reject disjoint bounding boxes early, classify each
//! polygon's own corners as inside/outside the other, validate both are
//! convex, enumerate all edge-pair intersections via
//! [`crate::algorithm::arc_intersect`], build the two working vertex
//! lists with those intersections spliced in, pick the first inbound
//! crossing, and traverse. If traversal yields fewer than three vertices
//! (no crossings found), fall back to a full-containment check: one
//! polygon may sit entirely inside the other without any edge actually
//! crossing.

use crate::algorithm::arc_intersect::line_intersect_2d_3d;
use crate::algorithm::area::{grid_area_dimensionless, require_convex};
use crate::algorithm::vertex_list::{Vertex, VertexList};
use crate::config::XgridConfig;
use crate::error::{PolygonSlot, XgridError};
use crate::sphere::Xyz;
use log::trace;

fn bbox_disjoint(a: &[Xyz], b: &[Xyz], pad: f64) -> bool {
    let (min_a, max_a) = bbox(a);
    let (min_b, max_b) = bbox(b);
    min_a.x >= max_b.x + pad
        || min_b.x >= max_a.x + pad
        || min_a.y >= max_b.y + pad
        || min_b.y >= max_a.y + pad
        || min_a.z >= max_b.z + pad
        || min_b.z >= max_a.z + pad
}

fn bbox(pts: &[Xyz]) -> (Xyz, Xyz) {
    let mut min = pts[0];
    let mut max = pts[0];
    for p in &pts[1..] {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
    }
    (min, max)
}

/// Whether `p` lies inside (or on the boundary of) the convex spherical
/// polygon `polygon`, wound clockwise when viewed from outside the
/// sphere. Consistent with the sign convention
/// [`grid_area_dimensionless`] uses: the interior lies where every edge's
/// `v_i × v_{i+1}` normal has non-positive dot product with the interior.
fn inside_polygon(p: Xyz, polygon: &[Xyz]) -> bool {
    const EPS: f64 = 1.0e-10;
    let n = polygon.len();
    for i in 0..n {
        let v0 = polygon[i];
        let v1 = polygon[(i + 1) % n];
        let normal = v0.cross(v1);
        if normal.dot(p) > EPS {
            return false;
        }
    }
    true
}

#[derive(Debug, Clone, Copy)]
struct IntersectRecord {
    point: Xyz,
    inbound: u8,
}

/// Clip subject polygon `p1` against clip polygon `p2`, both wound
/// clockwise when viewed from outside the sphere. Returns the overlap
/// polygon, empty if there is no overlap.
pub fn clip_2dx2d_great_circle(
    p1: &[Xyz],
    p2: &[Xyz],
    cfg: &XgridConfig,
) -> Result<Vec<Xyz>, XgridError> {
    if bbox_disjoint(p1, p2, cfg.range_check_criteria) {
        return Ok(Vec::new());
    }

    let p1_inside: Vec<bool> = p1.iter().map(|&v| inside_polygon(v, p2)).collect();
    let p2_inside: Vec<bool> = p2.iter().map(|&v| inside_polygon(v, p1)).collect();

    require_convex(p1, PolygonSlot::Subject)?;
    require_convex(p2, PolygonSlot::Clip)?;

    let n1 = p1.len();
    let n2 = p2.len();

    // Per-edge pending intersections, collected before building the final
    // lists so no mid-loop index shifting is needed (see vertex_list.rs).
    let mut pending1: Vec<Vec<(f64, usize)>> = vec![Vec::new(); n1];
    let mut pending2: Vec<Vec<(f64, usize)>> = vec![Vec::new(); n2];
    let mut intersections: Vec<IntersectRecord> = Vec::new();

    let mut find_or_add = |point: Xyz, inbound: u8| -> usize {
        for (id, rec) in intersections.iter_mut().enumerate() {
            if rec.point.same_point(point) {
                if rec.inbound == 0 && inbound != 0 {
                    rec.inbound = inbound;
                }
                return id;
            }
        }
        intersections.push(IntersectRecord { point, inbound });
        intersections.len() - 1
    };

    for i1 in 0..n1 {
        let i1p = (i1 + 1) % n1;
        let a1 = p1[i1];
        let a2 = p1[i1p];
        for i2 in 0..n2 {
            let i2p = (i2 + 1) % n2;
            let i2p2 = (i2 + 2) % n2;
            let q1 = p2[i2];
            let q2 = p2[i2p];
            let q3 = p2[i2p2];
            if let Some(hit) = line_intersect_2d_3d(a1, a2, q1, q2, q3, cfg) {
                let id = find_or_add(hit.point, hit.inbound);
                trace!("spherical clip: edge ({i1},{i1p}) x ({i2},{i2p}) -> id {id}, u_a={}, u_q={}", hit.u_a, hit.u_q);
                if hit.u_a != 0.0 && hit.u_a != 1.0 {
                    pending1[i1].push((hit.u_a, id));
                }
                if hit.u_q != 0.0 && hit.u_q != 1.0 {
                    pending2[i2].push((hit.u_q, id));
                }
            }
        }
    }

    if intersections.is_empty() {
        return full_containment_fallback(p1, &p1_inside, p2, &p2_inside);
    }

    let subject = build_list(p1, &p1_inside, &mut pending1, &intersections, cfg.mv)?;
    let clip = build_list(p2, &p2_inside, &mut pending2, &intersections, cfg.mv)?;

    resolve_inbound(&subject, &clip, &mut intersections);

    let first_id = intersections
        .iter()
        .enumerate()
        .find(|(_, rec)| rec.inbound == 2)
        .map(|(id, _)| id);

    let Some(first_id) = first_id else {
        return full_containment_fallback(p1, &p1_inside, p2, &p2_inside);
    };

    let max_iter = intersections.len().max(1) * 4 + subject.len() + clip.len();
    match traverse(&subject, &clip, first_id, max_iter) {
        Ok(poly) if poly.len() >= 3 => Ok(poly),
        Ok(_) => full_containment_fallback(p1, &p1_inside, p2, &p2_inside),
        Err(e) => Err(e),
    }
}

fn build_list(
    orig: &[Xyz],
    inside: &[bool],
    pending: &mut [Vec<(f64, usize)>],
    intersections: &[IntersectRecord],
    max_len: usize,
) -> Result<VertexList, XgridError> {
    let n = orig.len();
    let mut verts = Vec::with_capacity(max_len);
    for i in 0..n {
        verts.push(Vertex::plain(orig[i], inside[i]));
        pending[i].sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        for &(_, id) in &pending[i] {
            verts.push(Vertex {
                p: intersections[id].point,
                is_inside: true,
                intersect_id: Some(id),
                inbound: 0,
            });
        }
    }
    if verts.len() > max_len {
        return Err(XgridError::VertexOverflow {
            attempted: verts.len(),
            limit: max_len,
        });
    }
    Ok(VertexList::from_vertices(verts, max_len))
}

fn resolve_inbound(subject: &VertexList, clip: &VertexList, intersections: &mut [IntersectRecord]) {
    for (id, rec) in intersections.iter_mut().enumerate() {
        if rec.inbound != 0 {
            continue;
        }
        if let Some(si) = subject.find_by_intersect_id(id) {
            if let Some(ci) = clip.find_by_intersect_id(id) {
                let cn = clip.len();
                let clip_prev = clip.get((ci + cn - 1) % cn).p;
                let clip_cur = clip.get(ci).p;
                let clip_next = clip.get(clip.next_index(ci)).p;
                let sn = subject.len();
                let subj_prev = subject.get((si + sn - 1) % sn).p;
                let subj_next = subject.get(subject.next_index(si)).p;

                let p1 = subj_next.sub(subj_prev);
                let v1 = clip_cur.sub(clip_prev);
                let v2 = clip_next.sub(clip_cur);
                let c1 = v1.cross(v2);
                let c2 = v1.cross(p1);
                rec.inbound = if c1.dot(c2) > 0.0 { 2 } else { 1 };
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Side {
    Subject,
    Clip,
}

fn traverse(
    subject: &VertexList,
    clip: &VertexList,
    first_id: usize,
    max_iter: usize,
) -> Result<Vec<Xyz>, XgridError> {
    let list_of = |side: Side| -> &VertexList {
        match side {
            Side::Subject => subject,
            Side::Clip => clip,
        }
    };

    let mut poly = Vec::new();
    let start_idx = subject
        .find_by_intersect_id(first_id)
        .ok_or(XgridError::DegenerateTraversal {
            detail: "firstIntersect is not in the subject list",
        })?;
    poly.push(subject.get(start_idx).p);

    let mut cur_side = Side::Subject;
    let mut cur_id = first_id;
    let mut outer_iter = 0;

    loop {
        if outer_iter >= max_iter {
            return Err(XgridError::DegenerateTraversal {
                detail: "outer traversal loop exceeded the intersection-count bound",
            });
        }
        let list = list_of(cur_side);
        let start = list
            .find_by_intersect_id(cur_id)
            .ok_or(XgridError::DegenerateTraversal {
                detail: "curIntersect missing from current list",
            })?;
        let mut idx = list.next_index(start);
        let mut inner_iter = 0;
        let max_inner = list.len();
        let mut switched_to = None;
        let mut reached_first = false;

        loop {
            if inner_iter >= max_inner {
                return Err(XgridError::DegenerateTraversal {
                    detail: "inner traversal loop exceeded the list length bound",
                });
            }
            let v = list.get(idx);
            if let Some(id) = v.intersect_id {
                if id == first_id {
                    reached_first = true;
                    break;
                }
                let next_idx = list.next_index(idx);
                let next_v = list.get(next_idx);
                let should_switch = !(next_v.intersect_id.is_some() || next_v.is_inside);
                if should_switch {
                    switched_to = Some(id);
                    break;
                } else {
                    poly.push(v.p);
                }
            } else {
                poly.push(v.p);
            }
            idx = list.next_index(idx);
            inner_iter += 1;
        }

        if reached_first {
            break;
        }
        let new_id = switched_to.ok_or(XgridError::DegenerateTraversal {
            detail: "walk exhausted the current list without finding the next intersection",
        })?;
        if new_id == first_id {
            break;
        }
        let new_list = list_of(match cur_side {
            Side::Subject => Side::Clip,
            Side::Clip => Side::Subject,
        });
        let new_idx = new_list
            .find_by_intersect_id(new_id)
            .ok_or(XgridError::DegenerateTraversal {
                detail: "intersection missing from the list being switched to",
            })?;
        poly.push(new_list.get(new_idx).p);
        cur_side = match cur_side {
            Side::Subject => Side::Clip,
            Side::Clip => Side::Subject,
        };
        cur_id = new_id;
        outer_iter += 1;
    }

    Ok(poly)
}

fn full_containment_fallback(
    p1: &[Xyz],
    p1_inside: &[bool],
    p2: &[Xyz],
    p2_inside: &[bool],
) -> Result<Vec<Xyz>, XgridError> {
    if p1_inside.iter().all(|&b| b) {
        return Ok(p1.to_vec());
    }
    if p2_inside.iter().all(|&b| b) {
        return Ok(p2.to_vec());
    }
    Ok(Vec::new())
}

/// Sanity-check a great-circle cell's own corners are convex, exposed for
/// the driver's per-cell precomputation.
pub fn area_dimensionless(vertices: &[Xyz]) -> f64 {
    grid_area_dimensionless(vertices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphere::lonlat_to_xyz;

    fn deg_quad(lons: [f64; 4], lats: [f64; 4]) -> Vec<Xyz> {
        lons.iter()
            .zip(lats.iter())
            .map(|(&lo, &la)| lonlat_to_xyz(lo.to_radians(), la.to_radians()))
            .collect()
    }

    #[test]
    fn identical_quads_yield_full_overlap() {
        let cfg = XgridConfig::default();
        let quad = deg_quad([0.0, 0.0, 1.0, 1.0], [0.0, 1.0, 1.0, 0.0]);
        let out = clip_2dx2d_great_circle(&quad, &quad, &cfg).unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn disjoint_quads_yield_no_overlap() {
        let cfg = XgridConfig::default();
        let a = deg_quad([0.0, 0.0, 1.0, 1.0], [0.0, 1.0, 1.0, 0.0]);
        let b = deg_quad([50.0, 50.0, 51.0, 51.0], [50.0, 51.0, 51.0, 50.0]);
        let out = clip_2dx2d_great_circle(&a, &b, &cfg).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn subject_fully_inside_clip_returns_subject() {
        let cfg = XgridConfig::default();
        let small = deg_quad([0.4, 0.4, 0.6, 0.6], [0.4, 0.6, 0.6, 0.4]);
        let big = deg_quad([0.0, 0.0, 1.0, 1.0], [0.0, 1.0, 1.0, 0.0]);
        let out = clip_2dx2d_great_circle(&small, &big, &cfg).unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn quarter_overlap_has_nonzero_area() {
        let _ = pretty_env_logger::try_init();
        let cfg = XgridConfig::default();
        let a = deg_quad([0.0, 0.0, 1.0, 1.0], [0.0, 1.0, 1.0, 0.0]);
        let b = deg_quad([0.5, 0.5, 1.5, 1.5], [0.5, 1.5, 1.5, 0.5]);
        let out = clip_2dx2d_great_circle(&a, &b, &cfg).unwrap();
        assert!(out.len() >= 3);
        let area = grid_area_dimensionless(&out);
        assert!(area > 0.0);
    }
}
