//! General invariants a caller can rely on, independent of any one
//! scenario: conservation, symmetry, mask gating, identity overlap, and
//! `fix_lon` idempotence.

use xgrid::algorithm::fix_lon::fix_lon;
use xgrid::{create_xgrid_2dx2d_order1, Grid, LonLat, Mask, XgridConfig};

fn deg_grid(nx: usize, ny: usize, lon0: f64, lat0: f64, step: f64) -> Grid {
    let lon: Vec<f64> = (0..=nx)
        .map(|i| (lon0 + i as f64 * step).to_radians())
        .collect();
    let lat: Vec<f64> = (0..=ny)
        .map(|j| (lat0 + j as f64 * step).to_radians())
        .collect();
    Grid::from_rectangular(nx, ny, &lon, &lat)
}

#[test]
fn conservation_per_source_cell_when_target_fully_covers() {
    let cfg = XgridConfig::default();
    let grid1 = deg_grid(3, 3, 0.0, 0.0, 2.0);
    let grid2 = deg_grid(9, 9, 0.0, 0.0, 2.0 / 3.0);
    let mask1 = Mask::ones(3, 3);
    let cells = create_xgrid_2dx2d_order1(&grid1, &mask1, &grid2, &cfg).unwrap();

    for i1 in 0..3 {
        for j1 in 0..3 {
            let source_area = create_xgrid_2dx2d_order1(
                &deg_grid(1, 1, i1 as f64 * 2.0, j1 as f64 * 2.0, 2.0),
                &Mask::ones(1, 1),
                &deg_grid(1, 1, i1 as f64 * 2.0, j1 as f64 * 2.0, 2.0),
                &cfg,
            )
            .unwrap()[0]
                .area;
            let total: f64 = cells
                .iter()
                .filter(|c| c.i_in == i1 && c.j_in == j1)
                .map(|c| c.area)
                .sum();
            assert!(
                (total - source_area).abs() < cfg.area_ratio_thresh * source_area,
                "cell ({i1},{j1}): total {total} vs source {source_area}"
            );
        }
    }
}

#[test]
fn symmetry_swapping_source_and_target() {
    let cfg = XgridConfig::default();
    let grid1 = deg_grid(3, 3, 10.0, 10.0, 1.0);
    let grid2 = deg_grid(3, 3, 10.3, 10.3, 1.0);
    let mask = Mask::ones(3, 3);

    let forward = create_xgrid_2dx2d_order1(&grid1, &mask, &grid2, &cfg).unwrap();
    let backward = create_xgrid_2dx2d_order1(&grid2, &mask, &grid1, &cfg).unwrap();

    assert_eq!(forward.len(), backward.len());
    for f in &forward {
        let matched = backward
            .iter()
            .find(|b| b.i_in == f.i_out && b.j_in == f.j_out && b.i_out == f.i_in && b.j_out == f.j_in);
        let matched = matched.expect("swapped triple should appear in the backward run");
        assert!((matched.area - f.area).abs() / f.area < 1e-9);
    }
}

#[test]
fn mask_gating_excludes_masked_source_cells() {
    let cfg = XgridConfig::default();
    let grid = deg_grid(2, 2, 0.0, 0.0, 1.0);
    let mut weights = vec![1.0; 4];
    weights[3] = 0.5; // exactly at MASK_THRESH: must not participate
    let mask = Mask::new(2, 2, weights);
    let cells = create_xgrid_2dx2d_order1(&grid, &mask, &grid, &cfg).unwrap();
    assert!(cells.iter().all(|c| !(c.i_in == 1 && c.j_in == 1)));
}

#[test]
fn identity_overlap_one_cell_per_source() {
    let cfg = XgridConfig::default();
    let grid = deg_grid(5, 5, -2.0, -2.0, 1.0);
    let mask = Mask::ones(5, 5);
    let cells = create_xgrid_2dx2d_order1(&grid, &mask, &grid, &cfg).unwrap();
    assert_eq!(cells.len(), 25);
    for c in &cells {
        assert_eq!(c.i_in, c.i_out);
        assert_eq!(c.j_in, c.j_out);
    }
}

#[test]
fn fix_lon_is_idempotent_as_a_vertex_multiset() {
    let lon170 = 170.0_f64.to_radians();
    let lon_neg170 = (-170.0_f64).to_radians();
    let p = vec![
        LonLat::new(lon170, 0.0),
        LonLat::new(lon_neg170, 0.0),
        LonLat::new(lon_neg170, 0.1),
        LonLat::new(lon170, 0.1),
    ];
    let once = fix_lon(&p, std::f64::consts::PI);
    let twice = fix_lon(&once, std::f64::consts::PI);
    assert_eq!(once.len(), twice.len());
    for (a, b) in once.iter().zip(twice.iter()) {
        assert!((a.lon - b.lon).abs() < 1e-12);
        assert!((a.lat - b.lat).abs() < 1e-12);
    }
}

#[test]
fn antimeridian_rotation_preserves_area() {
    let _ = pretty_env_logger::try_init();
    let cfg = XgridConfig::default();
    let grid1 = deg_grid(1, 1, 170.0, 0.0, 1.0); // [170,171]
    let grid2 = deg_grid(1, 1, 170.0, 0.0, 1.0);
    let mask = Mask::ones(1, 1);
    let baseline = create_xgrid_2dx2d_order1(&grid1, &mask, &grid2, &cfg).unwrap()[0].area;

    // same target cell, expressed on the other side of the antimeridian
    let rotated = deg_grid(1, 1, 170.0 - 360.0, 0.0, 1.0);
    let rotated_area = create_xgrid_2dx2d_order1(&grid1, &mask, &rotated, &cfg).unwrap()[0].area;
    assert!((baseline - rotated_area).abs() / baseline < 1e-9);
}
