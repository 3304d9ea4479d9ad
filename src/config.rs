//! Tunable constants for the exchange-grid generator.
//!
//! Grouped into a configuration struct with a [`Default`] impl, so a
//! caller can, e.g., raise `max_xgrid` for a high-resolution model
//! without recompiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XgridConfig {
    /// Global cap on the number of exchange cells a single call may emit.
    pub max_xgrid: usize,
    /// Max vertices of a working polygon in the spherical clipper (either
    /// operand's original corners plus spliced-in intersection points).
    pub mv: usize,
    /// Source-cell participation threshold on the mask.
    pub mask_thresh: f64,
    /// Minimum accepted overlap/min-parent area ratio.
    pub area_ratio_thresh: f64,
    /// Snap-to-0-or-1 tolerance for arc parameters.
    pub epsln8: f64,
    /// General small-value tolerance (e.g. degenerate `dy` in centroid integral).
    pub epsln10: f64,
    /// Near-zero tolerance for determinants / coincident-plane tests.
    pub epsln30: f64,
    /// Bounding-box padding used by the spherical clipper's early reject,
    /// sized for unit-sphere xyz coordinates.
    pub range_check_criteria: f64,
    /// Earth radius, in meters, used to scale areas and centroids.
    pub radius: f64,
}

impl Default for XgridConfig {
    fn default() -> Self {
        XgridConfig {
            max_xgrid: 1_000_000,
            mv: 20,
            mask_thresh: 0.5,
            area_ratio_thresh: 1.0e-6,
            epsln8: 1.0e-8,
            epsln10: 1.0e-10,
            epsln30: 1.0e-30,
            range_check_criteria: 0.05,
            radius: 6_371_000.0,
        }
    }
}
