//! Exchange-grid (xgrid) generation: intersect every source cell of one
//! logically-rectangular spherical grid against every target cell of
//! another, producing the overlap area (and, optionally, area-weighted
//! centroid) of each non-empty intersection. This is the computational
//! core feeding conservative remapping weight generation between
//! climate/ocean model grids.
//!
//! Two clipping geometries are supported: planar Sutherland–Hodgman
//! clipping on the lon/lat plane ([`algorithm::planar_clip`]), and
//! Weiler–Atherton clipping of great-circle quadrilaterals on the unit
//! sphere ([`algorithm::spherical_clip`]). [`algorithm::driver`] wires
//! both into the five source/target-shape combinations a caller actually
//! invokes.
//!
//! File I/O of the input grids, CLI argument handling, and the
//! downstream remap-weight writer are out of scope: this crate exposes a
//! pure, in-process API for a caller to build those around.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod geometry;
mod sphere;

pub use algorithm::driver::{
    create_xgrid_1dx2d_order1, create_xgrid_1dx2d_order2, create_xgrid_2dx1d_order1,
    create_xgrid_2dx1d_order2, create_xgrid_2dx2d_order1, create_xgrid_2dx2d_order2,
    create_xgrid_great_circle,
};
pub use config::XgridConfig;
pub use error::{PolygonSlot, XgridError};
pub use geometry::{CellPolygon, ExchangeCell, Grid, LonLat, Mask};
