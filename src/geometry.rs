//! The grid/mask/cell data model.
//!
//! Coordinates are always radians; this crate works exclusively in `f64`
//! since the driver's tolerances are tuned for that precision, so there's
//! no generic-over-float parameter here the way `geo::GeoFloat` offers
//! one.

/// A single longitude/latitude vertex, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        LonLat { lon, lat }
    }
}

/// An ordered polygon of lon/lat vertices, the shape the planar clipper
/// and the area/centroid kernels operate on.
///
/// The area and centroid kernels and [`crate::algorithm::planar_clip::clip_box`]
/// are winding-agnostic. [`crate::algorithm::planar_clip::clip_polygon`] is
/// not: both of its operands must be counter-clockwise on the lon/lat
/// plane (see [`Grid::cell_corners_planar`]).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellPolygon {
    pub vertices: Vec<LonLat>,
}

impl CellPolygon {
    pub fn new(vertices: Vec<LonLat>) -> Self {
        CellPolygon { vertices }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn lons(&self) -> Vec<f64> {
        self.vertices.iter().map(|v| v.lon).collect()
    }

    pub fn lats(&self) -> Vec<f64> {
        self.vertices.iter().map(|v| v.lat).collect()
    }
}

/// A logically-rectangular `nx × ny` mesh of quadrilateral cells.
///
/// Corners are stored flat, `(nx+1) × (ny+1)`, indexed `k = j*(nx+1) + i`.
/// `lon`/`lat` may represent either a 1-D rectangular
/// grid (`nx+1`/`ny+1` independent bound arrays, broadcast across the
/// other axis by the caller before construction) or a full 2-D geographic
/// grid; this type only ever sees the broadcast, flat form.
#[derive(Debug, Clone)]
pub struct Grid {
    pub nx: usize,
    pub ny: usize,
    lon: Vec<f64>,
    lat: Vec<f64>,
}

impl Grid {
    /// Build a grid from flat corner arrays, each of length
    /// `(nx+1)*(ny+1)`.
    pub fn new(nx: usize, ny: usize, lon: Vec<f64>, lat: Vec<f64>) -> Self {
        assert_eq!(lon.len(), (nx + 1) * (ny + 1));
        assert_eq!(lat.len(), (nx + 1) * (ny + 1));
        Grid { nx, ny, lon, lat }
    }

    /// Build a 2-D geographic grid by broadcasting 1-D lon/lat bound
    /// arrays (lengths `nx+1` and `ny+1`) across the other axis.
    pub fn from_rectangular(nx: usize, ny: usize, lon_1d: &[f64], lat_1d: &[f64]) -> Self {
        assert_eq!(lon_1d.len(), nx + 1);
        assert_eq!(lat_1d.len(), ny + 1);
        let nxp = nx + 1;
        let nyp = ny + 1;
        let mut lon = vec![0.0; nxp * nyp];
        let mut lat = vec![0.0; nxp * nyp];
        for j in 0..nyp {
            for i in 0..nxp {
                lon[j * nxp + i] = lon_1d[i];
                lat[j * nxp + i] = lat_1d[j];
            }
        }
        Grid::new(nx, ny, lon, lat)
    }

    fn corner(&self, i: usize, j: usize) -> LonLat {
        let nxp = self.nx + 1;
        LonLat::new(self.lon[j * nxp + i], self.lat[j * nxp + i])
    }

    /// Gather the four corners of cell `(i, j)` in great-circle winding:
    /// `n0=(j,i), n1=(j+1,i), n2=(j+1,i+1), n3=(j,i+1)` — clockwise when
    /// viewed from outside the sphere. This order is *clockwise* on the
    /// lon/lat plane too (shoelace area is negative), so it is only valid
    /// for [`crate::algorithm::spherical_clip`], not for the planar
    /// convex-vs-convex clipper. Use [`Grid::cell_corners_planar`] there.
    pub fn cell_corners(&self, i: usize, j: usize) -> [LonLat; 4] {
        debug_assert!(i < self.nx && j < self.ny);
        [
            self.corner(i, j),
            self.corner(i, j + 1),
            self.corner(i + 1, j + 1),
            self.corner(i + 1, j),
        ]
    }

    pub fn cell_polygon(&self, i: usize, j: usize) -> CellPolygon {
        CellPolygon::new(self.cell_corners(i, j).to_vec())
    }

    /// Gather the four corners of cell `(i, j)` counter-clockwise on the
    /// lon/lat plane, with `n1`/`n3` swapped relative to
    /// [`Grid::cell_corners`]. This is the order the planar convex-vs-
    /// convex clipper ([`crate::algorithm::planar_clip::clip_polygon`])
    /// requires of both of its operands.
    pub fn cell_corners_planar(&self, i: usize, j: usize) -> [LonLat; 4] {
        debug_assert!(i < self.nx && j < self.ny);
        [
            self.corner(i, j),
            self.corner(i + 1, j),
            self.corner(i + 1, j + 1),
            self.corner(i, j + 1),
        ]
    }

    pub fn cell_polygon_planar(&self, i: usize, j: usize) -> CellPolygon {
        CellPolygon::new(self.cell_corners_planar(i, j).to_vec())
    }
}

/// An `nx × ny` array of mask weights in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct Mask {
    nx: usize,
    weights: Vec<f64>,
}

impl Mask {
    pub fn new(nx: usize, ny: usize, weights: Vec<f64>) -> Self {
        assert_eq!(weights.len(), nx * ny);
        Mask { nx, weights }
    }

    /// A mask of all ones, for the common "no masking" case.
    pub fn ones(nx: usize, ny: usize) -> Self {
        Mask::new(nx, ny, vec![1.0; nx * ny])
    }

    pub fn participates(&self, i: usize, j: usize, thresh: f64) -> bool {
        self.weights[j * self.nx + i] > thresh
    }
}

/// One accepted overlap between a source cell and a target cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeCell {
    pub i_in: usize,
    pub j_in: usize,
    pub i_out: usize,
    pub j_out: usize,
    pub area: f64,
    /// Area-weighted centroid longitude, radians; `None` for order-1 calls.
    pub clon: Option<f64>,
    /// Area-weighted centroid latitude, radians; `None` for order-1 calls.
    pub clat: Option<f64>,
}
