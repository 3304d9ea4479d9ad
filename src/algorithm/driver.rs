//! The outer enumeration driver: one parameterized cell-pair loop behind
//! ten thin public entry points (five source/target shape combinations,
//! each in an area-only and a centroid-bearing flavor).
//!
//! All five variants share the same shape: loop the source grid, skip
//! cells the mask excludes, loop the target grid, clip, accept by
//! area-ratio, optionally compute a centroid. What differs between them
//! is only which side (if either) is a 1-D axis-aligned rectangle versus
//! a full 2-D geographic quad, and — for the 2-D-vs-2-D case — whether
//! the clip runs on the lon/lat plane or on the sphere. Each public
//! function below supplies that shape to a shared core and nothing else.

use crate::algorithm::area::{poly_area, poly_area_dimensionless, poly_area_no_adjust};
use crate::algorithm::centroid::{box_ctrlat, box_ctrlon, poly_ctrlat, poly_ctrlon};
use crate::algorithm::fix_lon::fix_lon;
use crate::algorithm::planar_clip::{clip_box, clip_polygon};
use crate::algorithm::spherical_clip::clip_2dx2d_great_circle;
use crate::config::XgridConfig;
use crate::error::XgridError;
use crate::geometry::{CellPolygon, ExchangeCell, Grid, LonLat, Mask};
use crate::sphere::lonlat_to_xyz;
use log::debug;
use std::f64::consts::PI;

#[cfg(feature = "multithreading")]
use rayon::prelude::*;

fn box_polygon(ll: LonLat, ur: LonLat) -> CellPolygon {
    CellPolygon::new(vec![
        ll,
        LonLat::new(ur.lon, ll.lat),
        ur,
        LonLat::new(ll.lon, ur.lat),
    ])
}

fn bounds_1d(lon: &[f64], lat: &[f64], i: usize, j: usize) -> (LonLat, LonLat) {
    (
        LonLat::new(lon[i], lat[j]),
        LonLat::new(lon[i + 1], lat[j + 1]),
    )
}

fn accept(overlap_area: f64, source_area: f64, target_area: f64, cfg: &XgridConfig) -> bool {
    if overlap_area <= 0.0 {
        return false;
    }
    let min_area = source_area.min(target_area);
    min_area > 0.0 && overlap_area / min_area > cfg.area_ratio_thresh
}

fn push_checked(
    out: &mut Vec<ExchangeCell>,
    cell: ExchangeCell,
    cfg: &XgridConfig,
) -> Result<(), XgridError> {
    if out.len() >= cfg.max_xgrid {
        return Err(XgridError::CapacityExceeded {
            emitted: out.len(),
            limit: cfg.max_xgrid,
        });
    }
    out.push(cell);
    Ok(())
}

fn planar_centroid(overlap: &CellPolygon, area: f64, cfg: &XgridConfig) -> (f64, f64) {
    let n = overlap.len().max(1) as f64;
    let clon_pivot = overlap.vertices.iter().map(|v| v.lon).sum::<f64>() / n;
    let clon = poly_ctrlon(overlap, clon_pivot, cfg.radius) / area;
    let clat = poly_ctrlat(overlap, cfg.radius) / area;
    (clon, clat)
}

// --- 1dx2d: 1-D lon/lat bounds (source) against a 2-D geographic grid (target) ---

fn create_xgrid_1dx2d(
    lon1: &[f64],
    lat1: &[f64],
    mask1: &Mask,
    grid2: &Grid,
    cfg: &XgridConfig,
    with_centroid: bool,
) -> Result<Vec<ExchangeCell>, XgridError> {
    let nx1 = lon1.len() - 1;
    let ny1 = lat1.len() - 1;
    let mut out = Vec::new();
    for j1 in 0..ny1 {
        for i1 in 0..nx1 {
            if !mask1.participates(i1, j1, cfg.mask_thresh) {
                continue;
            }
            let (ll, ur) = bounds_1d(lon1, lat1, i1, j1);
            let pivot = (ll.lon + ur.lon) / 2.0;
            // a single zonal column spans the full longitude range, where
            // fix_lon's branch-cut window is meaningless
            let source_area = if nx1 == 1 {
                poly_area_no_adjust(&box_polygon(ll, ur), cfg.radius)
            } else {
                poly_area(&box_polygon(ll, ur), cfg.radius)
            };
            for j2 in 0..grid2.ny {
                for i2 in 0..grid2.nx {
                    let target = grid2.cell_polygon(i2, j2);
                    let target_area = poly_area(&target, cfg.radius);
                    let target_fixed = CellPolygon::new(fix_lon(&target.vertices, pivot));
                    let overlap = clip_box(&target_fixed, ll, ur);
                    if overlap.is_empty() {
                        continue;
                    }
                    let overlap_area = poly_area(&overlap, cfg.radius);
                    if !accept(overlap_area, source_area, target_area, cfg) {
                        continue;
                    }
                    let (clon, clat) = if with_centroid {
                        if (overlap_area - source_area).abs() < 1.0e-9 * source_area.max(1.0) {
                            // overlap is the whole source box: use the closed-form
                            // box centroid instead of integrating over its corners
                            (
                                Some(box_ctrlon(ll, ur, pivot, cfg.radius) / overlap_area),
                                Some(box_ctrlat(ll, ur, cfg.radius) / overlap_area),
                            )
                        } else {
                            let (lo, la) = planar_centroid(&overlap, overlap_area, cfg);
                            (Some(lo), Some(la))
                        }
                    } else {
                        (None, None)
                    };
                    push_checked(
                        &mut out,
                        ExchangeCell {
                            i_in: i1,
                            j_in: j1,
                            i_out: i2,
                            j_out: j2,
                            area: overlap_area,
                            clon,
                            clat,
                        },
                        cfg,
                    )?;
                }
            }
        }
    }
    debug!("create_xgrid_1dx2d: emitted {} exchange cells", out.len());
    Ok(out)
}

/// Area-only `1dx2d` variant.
pub fn create_xgrid_1dx2d_order1(
    lon1: &[f64],
    lat1: &[f64],
    mask1: &Mask,
    grid2: &Grid,
    cfg: &XgridConfig,
) -> Result<Vec<ExchangeCell>, XgridError> {
    create_xgrid_1dx2d(lon1, lat1, mask1, grid2, cfg, false)
}

/// Area + centroid `1dx2d` variant.
pub fn create_xgrid_1dx2d_order2(
    lon1: &[f64],
    lat1: &[f64],
    mask1: &Mask,
    grid2: &Grid,
    cfg: &XgridConfig,
) -> Result<Vec<ExchangeCell>, XgridError> {
    create_xgrid_1dx2d(lon1, lat1, mask1, grid2, cfg, true)
}

// --- 2dx1d: 2-D geographic grid (source) against 1-D lon/lat bounds (target) ---

fn create_xgrid_2dx1d(
    grid1: &Grid,
    mask1: &Mask,
    lon2: &[f64],
    lat2: &[f64],
    cfg: &XgridConfig,
    with_centroid: bool,
) -> Result<Vec<ExchangeCell>, XgridError> {
    let nx2 = lon2.len() - 1;
    let ny2 = lat2.len() - 1;
    let mut out = Vec::new();
    for j1 in 0..grid1.ny {
        for i1 in 0..grid1.nx {
            if !mask1.participates(i1, j1, cfg.mask_thresh) {
                continue;
            }
            let source = grid1.cell_polygon(i1, j1);
            let source_area = poly_area(&source, cfg.radius);
            for j2 in 0..ny2 {
                for i2 in 0..nx2 {
                    let (ll, ur) = bounds_1d(lon2, lat2, i2, j2);
                    let pivot = (ll.lon + ur.lon) / 2.0;
                    // a single zonal column spans the full longitude range, where
                    // fix_lon's branch-cut window is meaningless
                    let target_area = if nx2 == 1 {
                        poly_area_no_adjust(&box_polygon(ll, ur), cfg.radius)
                    } else {
                        poly_area(&box_polygon(ll, ur), cfg.radius)
                    };
                    let source_fixed = CellPolygon::new(fix_lon(&source.vertices, pivot));
                    let overlap = clip_box(&source_fixed, ll, ur);
                    if overlap.is_empty() {
                        continue;
                    }
                    let overlap_area = poly_area(&overlap, cfg.radius);
                    if !accept(overlap_area, source_area, target_area, cfg) {
                        continue;
                    }
                    let (clon, clat) = if with_centroid {
                        if (overlap_area - target_area).abs() < 1.0e-9 * target_area.max(1.0) {
                            (
                                Some(box_ctrlon(ll, ur, pivot, cfg.radius) / overlap_area),
                                Some(box_ctrlat(ll, ur, cfg.radius) / overlap_area),
                            )
                        } else {
                            let (lo, la) = planar_centroid(&overlap, overlap_area, cfg);
                            (Some(lo), Some(la))
                        }
                    } else {
                        (None, None)
                    };
                    push_checked(
                        &mut out,
                        ExchangeCell {
                            i_in: i1,
                            j_in: j1,
                            i_out: i2,
                            j_out: j2,
                            area: overlap_area,
                            clon,
                            clat,
                        },
                        cfg,
                    )?;
                }
            }
        }
    }
    debug!("create_xgrid_2dx1d: emitted {} exchange cells", out.len());
    Ok(out)
}

/// Area-only `2dx1d` variant.
pub fn create_xgrid_2dx1d_order1(
    grid1: &Grid,
    mask1: &Mask,
    lon2: &[f64],
    lat2: &[f64],
    cfg: &XgridConfig,
) -> Result<Vec<ExchangeCell>, XgridError> {
    create_xgrid_2dx1d(grid1, mask1, lon2, lat2, cfg, false)
}

/// Area + centroid `2dx1d` variant.
pub fn create_xgrid_2dx1d_order2(
    grid1: &Grid,
    mask1: &Mask,
    lon2: &[f64],
    lat2: &[f64],
    cfg: &XgridConfig,
) -> Result<Vec<ExchangeCell>, XgridError> {
    create_xgrid_2dx1d(grid1, mask1, lon2, lat2, cfg, true)
}

// --- 2dx2d: 2-D geographic grid against 2-D geographic grid, planar clip ---

struct TargetPrecomp {
    polygon: CellPolygon,
    area: f64,
    lon_avg: f64,
    lat_min: f64,
    lat_max: f64,
}

fn precompute_target(grid2: &Grid, cfg: &XgridConfig) -> Vec<TargetPrecomp> {
    let mut out = Vec::with_capacity(grid2.nx * grid2.ny);
    for j in 0..grid2.ny {
        for i in 0..grid2.nx {
            let raw = grid2.cell_polygon_planar(i, j);
            let fixed = CellPolygon::new(fix_lon(&raw.vertices, PI));
            let area = poly_area_dimensionless(&raw) * cfg.radius * cfg.radius;
            let lon_avg = fixed.vertices.iter().map(|v| v.lon).sum::<f64>() / fixed.len() as f64;
            let lat_min = fixed
                .vertices
                .iter()
                .map(|v| v.lat)
                .fold(f64::INFINITY, f64::min);
            let lat_max = fixed
                .vertices
                .iter()
                .map(|v| v.lat)
                .fold(f64::NEG_INFINITY, f64::max);
            out.push(TargetPrecomp {
                polygon: fixed,
                area,
                lon_avg,
                lat_min,
                lat_max,
            });
        }
    }
    out
}

fn process_2dx2d_block(
    grid1: &Grid,
    mask1: &Mask,
    target: &[TargetPrecomp],
    nx2: usize,
    block_range: std::ops::Range<usize>,
    cfg: &XgridConfig,
    with_centroid: bool,
    block_limit: usize,
) -> Result<Vec<ExchangeCell>, XgridError> {
    let mut out = Vec::new();
    for j1 in 0..grid1.ny {
        for i1 in 0..grid1.nx {
            if !mask1.participates(i1, j1, cfg.mask_thresh) {
                continue;
            }
            let source_raw = grid1.cell_polygon_planar(i1, j1);
            let source = CellPolygon::new(fix_lon(&source_raw.vertices, PI));
            let source_area = poly_area_dimensionless(&source_raw) * cfg.radius * cfg.radius;
            let source_lat_min = source
                .vertices
                .iter()
                .map(|v| v.lat)
                .fold(f64::INFINITY, f64::min);
            let source_lat_max = source
                .vertices
                .iter()
                .map(|v| v.lat)
                .fold(f64::NEG_INFINITY, f64::max);
            let source_lon_avg =
                source.vertices.iter().map(|v| v.lon).sum::<f64>() / source.len() as f64;

            for ij in block_range.clone() {
                let i2 = ij % nx2;
                let j2 = ij / nx2;
                let t = &target[ij];
                if t.lat_min >= source_lat_max || source_lat_min >= t.lat_max {
                    continue;
                }

                let mut shift = 0.0;
                let dlon = t.lon_avg - source_lon_avg;
                if dlon > PI {
                    shift = -2.0 * PI;
                } else if dlon < -PI {
                    shift = 2.0 * PI;
                }
                let target_poly = if shift != 0.0 {
                    CellPolygon::new(
                        t.polygon
                            .vertices
                            .iter()
                            .map(|v| LonLat::new(v.lon + shift, v.lat))
                            .collect(),
                    )
                } else {
                    t.polygon.clone()
                };

                let target_lon_min = target_poly
                    .vertices
                    .iter()
                    .map(|v| v.lon)
                    .fold(f64::INFINITY, f64::min);
                let target_lon_max = target_poly
                    .vertices
                    .iter()
                    .map(|v| v.lon)
                    .fold(f64::NEG_INFINITY, f64::max);
                let source_lon_min = source
                    .vertices
                    .iter()
                    .map(|v| v.lon)
                    .fold(f64::INFINITY, f64::min);
                let source_lon_max = source
                    .vertices
                    .iter()
                    .map(|v| v.lon)
                    .fold(f64::NEG_INFINITY, f64::max);
                if target_lon_min >= source_lon_max || source_lon_min >= target_lon_max {
                    continue;
                }

                let overlap = clip_polygon(&source, &target_poly)?;
                if overlap.is_empty() {
                    continue;
                }
                let overlap_area = poly_area(&overlap, cfg.radius);
                if !accept(overlap_area, source_area, t.area, cfg) {
                    continue;
                }
                let (clon, clat) = if with_centroid {
                    let (lo, la) = planar_centroid(&overlap, overlap_area, cfg);
                    (Some(lo), Some(la))
                } else {
                    (None, None)
                };
                if out.len() >= block_limit {
                    return Err(XgridError::CapacityExceeded {
                        emitted: out.len(),
                        limit: block_limit,
                    });
                }
                out.push(ExchangeCell {
                    i_in: i1,
                    j_in: j1,
                    i_out: i2,
                    j_out: j2,
                    area: overlap_area,
                    clon,
                    clat,
                });
            }
        }
    }
    Ok(out)
}

fn block_ranges(total: usize, nblocks: usize) -> Vec<std::ops::Range<usize>> {
    let nblocks = nblocks.max(1);
    let base = total / nblocks;
    let rem = total % nblocks;
    let mut ranges = Vec::with_capacity(nblocks);
    let mut start = 0;
    for b in 0..nblocks {
        let len = base + if b < rem { 1 } else { 0 };
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

#[cfg(feature = "multithreading")]
fn num_blocks() -> usize {
    rayon::current_num_threads()
}

#[cfg(not(feature = "multithreading"))]
fn num_blocks() -> usize {
    1
}

fn create_xgrid_2dx2d(
    grid1: &Grid,
    mask1: &Mask,
    grid2: &Grid,
    cfg: &XgridConfig,
    with_centroid: bool,
) -> Result<Vec<ExchangeCell>, XgridError> {
    let target = precompute_target(grid2, cfg);
    let total = grid2.nx * grid2.ny;
    let nblocks = num_blocks();
    let ranges = block_ranges(total, nblocks);
    let block_limit = (cfg.max_xgrid / nblocks.max(1)).max(1);

    #[cfg(feature = "multithreading")]
    let blocks: Result<Vec<Vec<ExchangeCell>>, XgridError> = ranges
        .into_par_iter()
        .map(|r| {
            process_2dx2d_block(
                grid1,
                mask1,
                &target,
                grid2.nx,
                r,
                cfg,
                with_centroid,
                block_limit,
            )
        })
        .collect();

    #[cfg(not(feature = "multithreading"))]
    let blocks: Result<Vec<Vec<ExchangeCell>>, XgridError> = ranges
        .into_iter()
        .map(|r| {
            process_2dx2d_block(
                grid1,
                mask1,
                &target,
                grid2.nx,
                r,
                cfg,
                with_centroid,
                block_limit,
            )
        })
        .collect();

    let blocks = blocks?;
    let mut out = Vec::new();
    for block in blocks {
        for cell in block {
            push_checked(&mut out, cell, cfg)?;
        }
    }
    debug!(
        "create_xgrid_2dx2d: {} blocks, emitted {} exchange cells",
        nblocks,
        out.len()
    );
    Ok(out)
}

/// Area-only `2dx2d` variant, planar clip, block-parallel when the
/// `multithreading` feature is enabled.
pub fn create_xgrid_2dx2d_order1(
    grid1: &Grid,
    mask1: &Mask,
    grid2: &Grid,
    cfg: &XgridConfig,
) -> Result<Vec<ExchangeCell>, XgridError> {
    create_xgrid_2dx2d(grid1, mask1, grid2, cfg, false)
}

/// Area + centroid `2dx2d` variant.
pub fn create_xgrid_2dx2d_order2(
    grid1: &Grid,
    mask1: &Mask,
    grid2: &Grid,
    cfg: &XgridConfig,
) -> Result<Vec<ExchangeCell>, XgridError> {
    create_xgrid_2dx2d(grid1, mask1, grid2, cfg, true)
}

// --- great_circle: 2-D geographic grid against 2-D geographic grid, spherical clip ---

/// Spherical (great-circle) variant. Runs single-threaded, matching the
/// concurrency note that the clipper's working vertex lists aren't meant
/// to be shared across threads. `with_centroid` must be `false`; passing
/// `true` returns [`XgridError::CentroidUnsupported`] rather than
/// silently emitting zeroed centroids.
pub fn create_xgrid_great_circle(
    grid1: &Grid,
    mask1: &Mask,
    grid2: &Grid,
    cfg: &XgridConfig,
    with_centroid: bool,
) -> Result<Vec<ExchangeCell>, XgridError> {
    if with_centroid {
        return Err(XgridError::CentroidUnsupported);
    }

    let target_xyz: Vec<Vec<crate::sphere::Xyz>> = (0..grid2.ny)
        .flat_map(|j| (0..grid2.nx).map(move |i| (i, j)))
        .map(|(i, j)| {
            grid2
                .cell_corners(i, j)
                .iter()
                .map(|v| lonlat_to_xyz(v.lon, v.lat))
                .collect()
        })
        .collect();

    let mut out = Vec::new();
    for j1 in 0..grid1.ny {
        for i1 in 0..grid1.nx {
            if !mask1.participates(i1, j1, cfg.mask_thresh) {
                continue;
            }
            let source_xyz: Vec<_> = grid1
                .cell_corners(i1, j1)
                .iter()
                .map(|v| lonlat_to_xyz(v.lon, v.lat))
                .collect();
            let source_area = crate::algorithm::area::grid_area(&source_xyz, cfg.radius);

            for j2 in 0..grid2.ny {
                for i2 in 0..grid2.nx {
                    let target = &target_xyz[j2 * grid2.nx + i2];
                    let target_area = crate::algorithm::area::grid_area(target, cfg.radius);
                    let overlap = clip_2dx2d_great_circle(&source_xyz, target, cfg)?;
                    if overlap.len() < 3 {
                        continue;
                    }
                    let overlap_area = crate::algorithm::area::grid_area(&overlap, cfg.radius);
                    if !accept(overlap_area, source_area, target_area, cfg) {
                        continue;
                    }
                    push_checked(
                        &mut out,
                        ExchangeCell {
                            i_in: i1,
                            j_in: j1,
                            i_out: i2,
                            j_out: j2,
                            area: overlap_area,
                            clon: None,
                            clat: None,
                        },
                        cfg,
                    )?;
                }
            }
        }
    }
    debug!(
        "create_xgrid_great_circle: emitted {} exchange cells",
        out.len()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deg_grid(nx: usize, ny: usize, lon0: f64, lat0: f64, step: f64) -> Grid {
        let lon: Vec<f64> = (0..=nx).map(|i| (lon0 + i as f64 * step).to_radians()).collect();
        let lat: Vec<f64> = (0..=ny).map(|j| (lat0 + j as f64 * step).to_radians()).collect();
        Grid::from_rectangular(nx, ny, &lon, &lat)
    }

    #[test]
    fn identical_2dx2d_grids_conserve_area() {
        let cfg = XgridConfig::default();
        let grid1 = deg_grid(4, 4, 0.0, 0.0, 1.0);
        let grid2 = deg_grid(4, 4, 0.0, 0.0, 1.0);
        let mask1 = Mask::ones(4, 4);
        let cells = create_xgrid_2dx2d_order1(&grid1, &mask1, &grid2, &cfg).unwrap();
        // every source cell maps onto exactly the coincident target cell
        assert_eq!(cells.len(), 16);
        for c in &cells {
            assert_eq!(c.i_in, c.i_out);
            assert_eq!(c.j_in, c.j_out);
        }
    }

    #[test]
    fn mask_excludes_source_cells() {
        let cfg = XgridConfig::default();
        let grid1 = deg_grid(2, 2, 0.0, 0.0, 1.0);
        let grid2 = deg_grid(2, 2, 0.0, 0.0, 1.0);
        let mut weights = vec![1.0; 4];
        weights[0] = 0.0;
        let mask1 = Mask::new(2, 2, weights);
        let cells = create_xgrid_2dx2d_order1(&grid1, &mask1, &grid2, &cfg).unwrap();
        assert!(cells.iter().all(|c| !(c.i_in == 0 && c.j_in == 0)));
    }

    #[test]
    fn great_circle_order2_is_unsupported() {
        let cfg = XgridConfig::default();
        let grid1 = deg_grid(2, 2, 0.0, 0.0, 1.0);
        let grid2 = deg_grid(2, 2, 0.0, 0.0, 1.0);
        let mask1 = Mask::ones(2, 2);
        let err = create_xgrid_great_circle(&grid1, &mask1, &grid2, &cfg, true).unwrap_err();
        assert_eq!(err, XgridError::CentroidUnsupported);
    }

    #[test]
    fn great_circle_identical_grids_conserve_area() {
        let _ = pretty_env_logger::try_init();
        let cfg = XgridConfig::default();
        let grid1 = deg_grid(3, 3, 0.0, 0.0, 1.0);
        let grid2 = deg_grid(3, 3, 0.0, 0.0, 1.0);
        let mask1 = Mask::ones(3, 3);
        let cells = create_xgrid_great_circle(&grid1, &mask1, &grid2, &cfg, false).unwrap();
        assert_eq!(cells.len(), 9);
    }

    #[test]
    fn single_zonal_column_1dx2d_conserves_area() {
        // a 1-D source with nx1 == 1 takes the poly_area_no_adjust path;
        // covering it with 4 equal target columns should conserve area.
        let cfg = XgridConfig::default();
        let lon1 = vec![10.0_f64.to_radians(), 190.0_f64.to_radians()];
        let lat1 = vec![0.0, 10.0_f64.to_radians()];
        let mask1 = Mask::ones(1, 1);
        let lon2: Vec<f64> = [10.0, 55.0, 100.0, 145.0, 190.0]
            .iter()
            .map(|d: &f64| d.to_radians())
            .collect();
        let lat2 = vec![0.0, 10.0_f64.to_radians()];
        let grid2 = Grid::from_rectangular(4, 1, &lon2, &lat2);

        let cells = create_xgrid_1dx2d_order1(&lon1, &lat1, &mask1, &grid2, &cfg).unwrap();
        assert_eq!(cells.len(), 4);
        let total: f64 = cells.iter().map(|c| c.area).sum();
        let expected = poly_area_no_adjust(
            &box_polygon(
                LonLat::new(10.0_f64.to_radians(), 0.0),
                LonLat::new(190.0_f64.to_radians(), 10.0_f64.to_radians()),
            ),
            cfg.radius,
        );
        assert!((total - expected).abs() / expected < 1e-6, "total {total} vs expected {expected}");
    }
}
