//! Full recompute: grid → isocurves → crossing mesh → cell metrics.

use serde::Serialize;
use tracing::debug;

use crate::crossing::CrossingMesh;
use crate::grid::FacetGrid;
use crate::isocurve::{Field, IsocurveFamily};
use crate::metrics::compute_cell_metrics;

/// Output of one recompute. Every grid edit supersedes it entirely.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recompute {
    pub iso_x: IsocurveFamily,
    pub iso_y: IsocurveFamily,
    pub mesh: CrossingMesh,
    pub tilt_deg: f64,
}

pub fn recompute(grid: &FacetGrid, tilt_deg: f64) -> Recompute {
    let iso_x = IsocurveFamily::extract(grid, Field::X);
    let iso_y = IsocurveFamily::extract(grid, Field::Y);
    let mut mesh = CrossingMesh::detect(&iso_x, &iso_y);
    compute_cell_metrics(&mut mesh, tilt_deg);

    debug!(
        x_levels = iso_x.non_empty_levels(),
        y_levels = iso_y.non_empty_levels(),
        crossings = mesh.valid_count(),
        cells = mesh.measured_count(),
        "recompute finished"
    );

    Recompute {
        iso_x,
        iso_y,
        mesh,
        tilt_deg,
    }
}
