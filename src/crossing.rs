//! Crossing mesh: intersections of the X and Y contour families.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::isocurve::{
    IsoPoint, IsocurveFamily, LEVEL_COUNT, LEVEL_MAX, LEVEL_MIN, level_slot, levels,
};
use crate::metrics::CellMetrics;

/// Segment pairs with a smaller determinant are treated as parallel.
pub const DETERMINANT_EPSILON: f64 = 1e-6;

/// Area reported by cells without a complete 2×2 block.
pub const AREA_UNSET: f64 = -1.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossingCell {
    pub valid: bool,
    pub theta: f64,
    pub phi: f64,
    pub diam: Option<f64>,
    /// Set only when the cell heads a full block of valid crossings.
    pub metrics: Option<CellMetrics>,
}

impl CrossingCell {
    pub fn area(&self) -> f64 {
        self.metrics.map_or(AREA_UNSET, |m| m.area)
    }
}

/// Parameters of an accepted intersection: `t` along the first segment,
/// `u` along the second.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentHit {
    pub t: f64,
    pub u: f64,
}

/// Solves `x0 + t·(x1 − x0) = y0 + u·(y1 − y0)` in (theta, phi).
///
/// Returns `None` for near-parallel segments and for intersections outside
/// either segment; both bounds are inclusive.
pub fn segment_intersection(
    x0: &IsoPoint,
    x1: &IsoPoint,
    y0: &IsoPoint,
    y1: &IsoPoint,
) -> Option<SegmentHit> {
    let dtx = x1.theta - x0.theta;
    let dfx = x1.phi - x0.phi;
    let dty = y1.theta - y0.theta;
    let dfy = y1.phi - y0.phi;

    let det = dty * dfx - dtx * dfy;
    if det.abs() <= DETERMINANT_EPSILON {
        return None;
    }

    let dt = y0.theta - x0.theta;
    let df = y0.phi - x0.phi;
    let t = (dty * df - dfy * dt) / det;
    let u = (dtx * df - dfx * dt) / det;

    ((0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)).then_some(SegmentHit { t, u })
}

/// 61 × 61 cells indexed by `(m1, m2)`, X level first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrossingMesh {
    cells: Vec<CrossingCell>,
}

impl Default for CrossingMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossingMesh {
    /// A mesh with every cell invalid.
    pub fn new() -> Self {
        Self {
            cells: vec![CrossingCell::default(); LEVEL_COUNT * LEVEL_COUNT],
        }
    }

    /// Intersects every X polyline with every Y polyline.
    ///
    /// Segments are scanned in ascending order along the X curve, then the Y
    /// curve; the first hit of a level pair is kept.
    pub fn detect(iso_x: &IsocurveFamily, iso_y: &IsocurveFamily) -> Self {
        let mut mesh = Self::new();

        for cx in iso_x.iter() {
            for cy in iso_y.iter() {
                let hit = cx.segments().find_map(|(x0, x1)| {
                    cy.segments().find_map(|(y0, y1)| {
                        segment_intersection(x0, x1, y0, y1).map(|h| (x0, x1, h.t))
                    })
                });

                let Some((x0, x1, t)) = hit else {
                    continue;
                };
                if let Some(cell) = mesh.get_mut(cx.level, cy.level) {
                    *cell = CrossingCell {
                        valid: true,
                        theta: x0.theta + (x1.theta - x0.theta) * t,
                        phi: x0.phi + (x1.phi - x0.phi) * t,
                        diam: match (x0.diam, x1.diam) {
                            (Some(d0), Some(d1)) => Some(d0 + (d1 - d0) * t),
                            _ => None,
                        },
                        metrics: None,
                    };
                }
            }
        }

        mesh
    }

    fn slot(m1: i32, m2: i32) -> Option<usize> {
        Some(level_slot(m1)? * LEVEL_COUNT + level_slot(m2)?)
    }

    pub fn get(&self, m1: i32, m2: i32) -> Option<&CrossingCell> {
        Self::slot(m1, m2).map(|s| &self.cells[s])
    }

    pub fn get_mut(&mut self, m1: i32, m2: i32) -> Option<&mut CrossingCell> {
        Self::slot(m1, m2).map(|s| &mut self.cells[s])
    }

    /// The cell at `(m1, m2)` when it holds a crossing.
    pub fn valid(&self, m1: i32, m2: i32) -> Option<&CrossingCell> {
        self.get(m1, m2).filter(|c| c.valid)
    }

    /// Every cell with its level pair, m1-major.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, &CrossingCell)> {
        self.cells.iter().enumerate().map(|(s, cell)| {
            let m1 = LEVEL_MIN + (s / LEVEL_COUNT) as i32;
            let m2 = LEVEL_MIN + (s % LEVEL_COUNT) as i32;
            (m1, m2, cell)
        })
    }

    pub fn valid_count(&self) -> usize {
        self.cells.iter().filter(|c| c.valid).count()
    }

    pub fn measured_count(&self) -> usize {
        self.cells.iter().filter(|c| c.metrics.is_some()).count()
    }

    /// Level pairs `(m1, m2)` along a constant `m1 + m2` diagonal, from high
    /// m1 to low m1.
    pub fn diagonal(mm: i32) -> impl Iterator<Item = (i32, i32)> {
        levels()
            .rev()
            .map(move |m1| (m1, mm - m1))
            .filter(|&(_, m2)| levels().contains(&m2))
    }

    /// Valid crossings on the diagonal `m1 + m2 = mm`, in [`Self::diagonal`]
    /// order.
    pub fn z_line(&self, mm: i32) -> impl Iterator<Item = &CrossingCell> {
        Self::diagonal(mm).filter_map(|(m1, m2)| self.valid(m1, m2))
    }
}

/// Every `m1 + m2` sum reachable inside the mesh.
pub fn diagonal_sums() -> RangeInclusive<i32> {
    2 * LEVEL_MIN..=2 * LEVEL_MAX
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isocurve::Field;

    fn iso(theta: f64, phi: f64) -> IsoPoint {
        IsoPoint {
            theta,
            phi,
            diam: Some(theta + phi),
        }
    }

    #[test]
    fn crossing_segments_report_parameters_in_unit_range() {
        let hit = segment_intersection(
            &iso(0.0, -1.0),
            &iso(0.0, 1.0),
            &iso(-1.0, 0.5),
            &iso(1.0, 0.5),
        )
        .unwrap();
        assert!((hit.t - 0.75).abs() < 1e-12);
        assert!((hit.u - 0.5).abs() < 1e-12);
    }

    #[test]
    fn disjoint_and_parallel_segments_do_not_cross() {
        assert!(
            segment_intersection(&iso(0.0, 0.0), &iso(0.0, 1.0), &iso(1.0, 2.0), &iso(2.0, 2.0))
                .is_none()
        );
        assert!(
            segment_intersection(&iso(0.0, 0.0), &iso(0.0, 1.0), &iso(1.0, 0.0), &iso(1.0, 1.0))
                .is_none()
        );
    }

    #[test]
    fn touching_endpoints_count_as_crossing() {
        let hit = segment_intersection(
            &iso(0.0, 0.0),
            &iso(0.0, 1.0),
            &iso(0.0, 1.0),
            &iso(1.0, 1.0),
        )
        .unwrap();
        assert_eq!(hit.t, 1.0);
        assert_eq!(hit.u, 0.0);
    }

    #[test]
    fn empty_families_give_invalid_mesh() {
        let mesh = CrossingMesh::detect(
            &IsocurveFamily::empty(Field::X),
            &IsocurveFamily::empty(Field::Y),
        );
        assert_eq!(mesh.valid_count(), 0);
        assert!(mesh.iter().all(|(_, _, c)| c.area() == AREA_UNSET));
        assert_eq!(mesh.iter().count(), LEVEL_COUNT * LEVEL_COUNT);
    }

    fn family(field: Field, m: i32, points: Vec<IsoPoint>) -> IsocurveFamily {
        let mut family = IsocurveFamily::empty(field);
        if let Some(curve) = family.curve_mut(m) {
            curve.points = points;
        }
        family
    }

    #[test]
    fn first_hit_along_x_curve_wins() {
        // x runs out along phi = 0, turns and comes back along phi = 2
        let x = vec![iso(0.0, 0.0), iso(2.0, 0.0), iso(2.0, 2.0), iso(0.0, 2.0)];
        // y starts collinear with the first x segment, then climbs theta = 1.5
        let y = vec![iso(0.5, 0.0), iso(1.5, 0.0), iso(1.5, 3.0)];

        assert!(segment_intersection(&x[0], &x[1], &y[0], &y[1]).is_none());
        assert!(segment_intersection(&x[2], &x[3], &y[1], &y[2]).is_some());

        let mesh = CrossingMesh::detect(&family(Field::X, 2, x), &family(Field::Y, -1, y));
        assert_eq!(mesh.valid_count(), 1);
        let cell = mesh.valid(2, -1).unwrap();
        assert_eq!((cell.theta, cell.phi), (1.5, 0.0));
        assert_eq!(cell.diam, Some(1.5));
    }

    #[test]
    fn iteration_reports_level_pairs() {
        let mut mesh = CrossingMesh::new();
        mesh.get_mut(3, -7).unwrap().valid = true;
        let found: Vec<(i32, i32)> = mesh
            .iter()
            .filter(|(_, _, c)| c.valid)
            .map(|(m1, m2, _)| (m1, m2))
            .collect();
        assert_eq!(found, vec![(3, -7)]);
        assert!(mesh.get(31, 0).is_none());
    }

    #[test]
    fn diagonal_stays_inside_levels() {
        let pairs: Vec<(i32, i32)> = CrossingMesh::diagonal(59).collect();
        assert_eq!(pairs, vec![(30, 29), (29, 30)]);
        assert_eq!(CrossingMesh::diagonal(0).count(), LEVEL_COUNT);
        assert_eq!(diagonal_sums(), -60..=60);
    }

    #[test]
    fn z_line_skips_invalid_cells() {
        let mut mesh = CrossingMesh::new();
        for (m1, m2, phi) in [(2, -1, 0.2), (0, 1, 0.0), (1, 1, 9.0)] {
            let cell = mesh.get_mut(m1, m2).unwrap();
            cell.valid = true;
            cell.phi = phi;
        }
        let phis: Vec<f64> = mesh.z_line(1).map(|c| c.phi).collect();
        assert_eq!(phis, vec![0.2, 0.0]);
    }
}
