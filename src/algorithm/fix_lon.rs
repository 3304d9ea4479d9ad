//! Longitude normalizer.
//!
//! Two pivot conventions are used by callers: `PI` for the "absolute"
//! area/centroid kernels, `(ll_lon+ur_lon)/2` for the 2dx2d planar driver;
//! each call site in [`crate::algorithm::driver`] documents which it
//! uses, since picking the wrong pivot is a subtle source of
//! antimeridian bugs.

use crate::geometry::LonLat;
use std::f64::consts::PI;

const TWO_PI: f64 = 2.0 * PI;

/// Rotate a longitude into the half-open window `(pivot-π, pivot+π]`.
fn wrap(lon: f64, pivot: f64) -> f64 {
    let mut v = lon;
    while v <= pivot - PI {
        v += TWO_PI;
    }
    while v > pivot + PI {
        v -= TWO_PI;
    }
    v
}

/// Pole-touch tolerance for detecting two successive vertices sitting at
/// the same pole.
const POLE_EPS: f64 = 1.0e-10;

/// Rotate every vertex's longitude into the branch around `pivot`,
/// inserting a synthetic pole vertex if the polygon touches a pole.
///
/// Returns the normalized vertex list; its length is `vertices.len()` or
/// `vertices.len() + 1` if a pole vertex was inserted.
pub fn fix_lon(vertices: &[LonLat], pivot: f64) -> Vec<LonLat> {
    let n = vertices.len();
    let mut out: Vec<LonLat> = vertices
        .iter()
        .map(|v| LonLat::new(wrap(v.lon, pivot), v.lat))
        .collect();

    let mut insert_at = None;
    for i in 0..n {
        let ip = (i + 1) % n;
        let (a, b) = (out[i], out[ip]);
        let at_north = (a.lat - PI / 2.0).abs() < POLE_EPS && (b.lat - PI / 2.0).abs() < POLE_EPS;
        let at_south = (a.lat + PI / 2.0).abs() < POLE_EPS && (b.lat + PI / 2.0).abs() < POLE_EPS;
        if at_north || at_south {
            insert_at = Some((ip, LonLat::new((a.lon + b.lon) / 2.0, a.lat)));
            break;
        }
    }

    if let Some((ip, pole_vertex)) = insert_at {
        out.insert(ip, pole_vertex);
    }
    out
}

/// `fix_lon` as a plain lon/lat slice operation, for call sites that
/// already hold separate coordinate arrays.
pub fn fix_lon_xy(lons: &[f64], lats: &[f64], pivot: f64) -> (Vec<f64>, Vec<f64>) {
    let verts: Vec<LonLat> = lons
        .iter()
        .zip(lats.iter())
        .map(|(&lon, &lat)| LonLat::new(lon, lat))
        .collect();
    let out = fix_lon(&verts, pivot);
    (out.iter().map(|v| v.lon).collect(), out.iter().map(|v| v.lat).collect())
}
