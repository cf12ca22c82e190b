pub mod crossing;
pub mod grid;
pub mod isocurve;
pub mod metrics;
pub mod pipeline;
pub mod projection;
pub mod render;
pub mod runtime;
pub mod scene;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetError {
    /// An (i, j) index outside the fixed facet lattice.
    IndexOutOfRange,
    /// A move or insert that the grid editing rules reject.
    InvalidEdit,
    /// A path segment was requested before its first point was placed.
    MissingCurrentPoint,
    /// A scene could not be built or serialized.
    Render,
}

impl fmt::Display for FacetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacetError::IndexOutOfRange => write!(f, "facet index out of range"),
            FacetError::InvalidEdit => write!(f, "invalid grid edit"),
            FacetError::MissingCurrentPoint => write!(f, "missing current point"),
            FacetError::Render => write!(f, "scene rendering failed"),
        }
    }
}

impl std::error::Error for FacetError {}

pub type Result<T> = std::result::Result<T, error_stack::Report<FacetError>>;

pub mod prelude {
    pub use crate::FacetError;
    pub use crate::crossing::*;
    pub use crate::grid::*;
    pub use crate::isocurve::*;
    pub use crate::metrics::*;
    pub use crate::pipeline::*;
    pub use crate::projection::*;
    pub use crate::render::*;
    pub use crate::runtime::*;
    pub use crate::scene::*;
}
