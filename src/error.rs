//! Error taxonomy for the exchange-grid kernels.
//!
//! Every fallible kernel returns `Result<_, XgridError>` so a caller can
//! decide how to handle a bad cell pair instead of taking the whole
//! process down.

use core::fmt;

/// Errors that can occur while building an exchange grid.
///
/// All variants are fatal to the call that produced them: the geometry
/// kernels in this crate assume convex, non-degenerate input and do not
/// attempt partial recovery.
#[derive(Debug, Clone, PartialEq)]
pub enum XgridError {
    /// `nxgrid` exceeded [`crate::config::XgridConfig::max_xgrid`], either
    /// globally or (divided by thread count) within a single block.
    CapacityExceeded {
        /// Number of exchange cells already staged when the cap was hit.
        emitted: usize,
        /// The cap that was exceeded.
        limit: usize,
    },
    /// A clipped polygon grew past `mv` vertices.
    VertexOverflow {
        /// Number of vertices the clip attempted to emit.
        attempted: usize,
        /// The configured vertex cap.
        limit: usize,
    },
    /// An input spherical quadrilateral has non-positive signed area,
    /// i.e. it is not convex / not wound the way the spherical clipper
    /// requires.
    NotConvex {
        /// Which operand failed the convexity check.
        which: PolygonSlot,
    },
    /// The Weiler–Atherton traversal failed to close within the bound on
    /// iterations, or the expected `firstIntersect` node was not found on
    /// the subject list.
    DegenerateTraversal {
        /// Human-readable detail of which traversal invariant broke.
        detail: &'static str,
    },
    /// Two edges that needed to be intersected in the planar polygon-vs-
    /// polygon clip were parallel (determinant below
    /// [`crate::config::XgridConfig::epsln30`]).
    ParallelEdges,
    /// The great-circle centroid integral is not implemented for this
    /// call; request area-only (order-1) output instead.
    CentroidUnsupported,
}

/// Which of the two operand polygons a convexity failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonSlot {
    /// The subject (source-cell) polygon.
    Subject,
    /// The clip (target-cell) polygon.
    Clip,
}

impl fmt::Display for XgridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XgridError::CapacityExceeded { emitted, limit } => write!(
                f,
                "nxgrid ({emitted}) exceeded the configured limit ({limit}); \
                 increase max_xgrid, decrease thread count, or split the call"
            ),
            XgridError::VertexOverflow { attempted, limit } => write!(
                f,
                "clipped polygon has {attempted} vertices, exceeding the limit of {limit}"
            ),
            XgridError::NotConvex { which } => write!(
                f,
                "{which:?} grid box is not convex (non-positive signed area)"
            ),
            XgridError::DegenerateTraversal { detail } => {
                write!(f, "spherical clip traversal did not close: {detail}")
            }
            XgridError::ParallelEdges => write!(
                f,
                "two edges to be intersected in the planar clip are parallel"
            ),
            XgridError::CentroidUnsupported => write!(
                f,
                "great-circle centroid is not implemented; request area-only (order-1) output"
            ),
        }
    }
}

impl std::error::Error for XgridError {}
