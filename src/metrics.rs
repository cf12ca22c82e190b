//! Per-cell metrics over blocks of four neighbouring crossings.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crossing::CrossingMesh;
use crate::isocurve::{LEVEL_MAX, LEVEL_MIN};
use crate::projection::{SphericalPoint, rotate_centroids};

/// Facet density calibration constant of the opening-angle formula.
pub const DENSITY_CALIBRATION: f64 = 25.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellMetrics {
    pub area: f64,
    /// Mean corner position, in the tilted frame.
    pub centroid: SphericalPoint,
    pub cdiam: Option<f64>,
    /// Opening angle in degrees.
    pub io_angle: f64,
    pub dfx: f64,
    pub dfy: f64,
    pub dfz: f64,
}

/// Fills in the metrics of every cell `(m1, m2)` whose block
/// `(m1, m2)`, `(m1+1, m2)`, `(m1+1, m2+1)`, `(m1, m2+1)` is fully valid.
///
/// Existing metrics are cleared first, so the pass can run on any mesh.
pub fn compute_cell_metrics(mesh: &mut CrossingMesh, tilt_deg: f64) {
    for m1 in LEVEL_MIN..=LEVEL_MAX {
        for m2 in LEVEL_MIN..=LEVEL_MAX {
            let metrics = block_metrics(mesh, m1, m2, tilt_deg);
            if let Some(cell) = mesh.get_mut(m1, m2) {
                cell.metrics = metrics;
            }
        }
    }
    debug!(cells = mesh.measured_count(), tilt_deg, "cell metrics computed");
}

fn block_metrics(mesh: &CrossingMesh, m1: i32, m2: i32, tilt_deg: f64) -> Option<CellMetrics> {
    let c1 = mesh.valid(m1, m2)?;
    let c2 = mesh.valid(m1 + 1, m2)?;
    let c3 = mesh.valid(m1 + 1, m2 + 1)?;
    let c4 = mesh.valid(m1, m2 + 1)?;

    let corners = [c1, c2, c3, c4].map(|c| SphericalPoint::new(c.theta, c.phi));
    let [z1, z2, _, z4] = corners;

    let area = tetragon_area(corners);
    let centroid = SphericalPoint::new(
        corners.iter().map(|z| z.theta).sum::<f64>() / 4.0,
        corners.iter().map(|z| z.phi).sum::<f64>() / 4.0,
    );
    let io_angle = opening_angle(area, centroid.theta)?;

    let cdiam = match (c1.diam, c2.diam, c3.diam, c4.diam) {
        (Some(d1), Some(d2), Some(d3), Some(d4)) => Some((d1 + d2 + d3 + d4) / 4.0),
        _ => None,
    };

    Some(CellMetrics {
        area,
        centroid: rotate_centroids(centroid.theta, centroid.phi, tilt_deg),
        cdiam,
        io_angle,
        dfx: angular_delta(&z1, &z2, centroid.theta),
        dfy: angular_delta(&z1, &z4, centroid.theta),
        dfz: angular_delta(&z2, &z4, centroid.theta),
    })
}

/// Area of the tetragon `z1 z2 z3 z4` as triangles `(z1, z2, z3)` and
/// `(z3, z4, z1)`.
pub fn tetragon_area([z1, z2, z3, z4]: [SphericalPoint; 4]) -> f64 {
    triangle_area(&z1, &z2, &z3) + triangle_area(&z3, &z4, &z1)
}

/// Heron's formula on the flat (theta, phi) distances.
pub fn triangle_area(a: &SphericalPoint, b: &SphericalPoint, c: &SphericalPoint) -> f64 {
    let (d1, d2, d3) = (a.distance(b), b.distance(c), c.distance(a));
    let s = (d1 + d2 + d3) / 2.0;
    // rounding can push a degenerate triangle slightly below zero
    (s * (s - d1) * (s - d2) * (s - d3)).max(0.0).sqrt()
}

/// Opening angle in degrees of a cell of `area` at elevation `theta`.
///
/// `None` for empty cells and for results that are not finite.
pub fn opening_angle(area: f64, theta: f64) -> Option<f64> {
    if area <= 0.0 {
        return None;
    }
    let del = DENSITY_CALIBRATION / area / theta.cos();
    let angle = (2.0 / del / 3f64.sqrt()).sqrt() * 180.0 / PI;
    angle.is_finite().then_some(angle)
}

/// Separation of two corners with the phi difference shortened by
/// `cos(theta)`.
pub fn angular_delta(a: &SphericalPoint, b: &SphericalPoint, theta: f64) -> f64 {
    ((a.theta - b.theta).powi(2) + ((a.phi - b.phi) * theta.cos()).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crossing::AREA_UNSET;

    fn sp(theta: f64, phi: f64) -> SphericalPoint {
        SphericalPoint::new(theta, phi)
    }

    #[test]
    fn unit_square_has_unit_area() {
        let area = tetragon_area([sp(0.0, 0.0), sp(0.0, 1.0), sp(1.0, 1.0), sp(1.0, 0.0)]);
        assert!((area - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_tetragon_is_not_negative() {
        let area = tetragon_area([sp(0.0, 0.0), sp(0.0, 1.0), sp(0.0, 2.0), sp(0.0, 3.0)]);
        assert!(area >= 0.0);
        assert!(area < 1e-7);
    }

    #[test]
    fn opening_angle_matches_closed_form() {
        let angle = opening_angle(1.0, 0.0).unwrap();
        let expected = (2.0 / 25.0 / 3f64.sqrt()).sqrt().to_degrees();
        assert!((angle - expected).abs() < 1e-12);
        assert!(opening_angle(0.0, 0.0).is_none());
        assert!(opening_angle(-1.0, 0.0).is_none());
    }

    #[test]
    fn delta_shrinks_phi_with_elevation() {
        let d = angular_delta(&sp(0.0, 0.0), &sp(0.0, 1.0), 60f64.to_radians());
        assert!((d - 0.5).abs() < 1e-12);
    }

    #[test]
    fn only_full_blocks_get_metrics() {
        let mut mesh = CrossingMesh::new();
        let step = 0.1;
        for (m1, m2) in [(0, 0), (1, 0), (1, 1), (0, 1), (2, 0)] {
            let cell = mesh.get_mut(m1, m2).unwrap();
            cell.valid = true;
            cell.theta = m1 as f64 * step;
            cell.phi = m2 as f64 * step;
            cell.diam = Some(4.0);
        }
        compute_cell_metrics(&mut mesh, 0.0);

        let head = mesh.get(0, 0).unwrap().metrics.unwrap();
        assert!((head.area - step * step).abs() < 1e-12);
        assert!((head.centroid.theta - 0.05).abs() < 1e-12);
        assert!((head.centroid.phi - 0.05).abs() < 1e-12);
        assert_eq!(head.cdiam, Some(4.0));
        assert!((head.dfx - step).abs() < 1e-12);

        assert_eq!(mesh.get(1, 0).unwrap().area(), AREA_UNSET);
        assert_eq!(mesh.get(2, 0).unwrap().area(), AREA_UNSET);
        assert_eq!(mesh.measured_count(), 1);
    }

    #[test]
    fn centroid_is_stored_in_tilted_frame() {
        let mut mesh = CrossingMesh::new();
        for (m1, m2) in [(0, 0), (1, 0), (1, 1), (0, 1)] {
            let cell = mesh.get_mut(m1, m2).unwrap();
            cell.valid = true;
            cell.theta = m1 as f64 * 0.1 - 0.05;
            cell.phi = m2 as f64 * 0.1 - 0.05;
        }
        compute_cell_metrics(&mut mesh, 20.0);
        let m = mesh.get(0, 0).unwrap().metrics.unwrap();
        assert!((m.centroid.theta - 20f64.to_radians()).abs() < 1e-9);
        assert!(m.centroid.phi.abs() < 1e-9);
        assert_eq!(m.cdiam, None);
    }
}
