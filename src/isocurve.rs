//! Isocurve extraction over the facet grid.
//!
//! For each of the 61 target levels `m · 5` (m ∈ [-30, 30]) the grid edges
//! are scanned for sign changes of the chosen field, the hits are chained
//! into a polyline by greedy nearest-neighbour sequencing and coincident
//! neighbours are collapsed.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::grid::{FacetGrid, GridIndex, GridPoint, I_MAX, I_MIN, J_MAX, J_MIN};

pub const LEVEL_MIN: i32 = -30;
pub const LEVEL_MAX: i32 = 30;
pub const LEVEL_COUNT: usize = (LEVEL_MAX - LEVEL_MIN + 1) as usize;

/// Field units between neighbouring contour levels.
pub const LEVEL_SPACING: f64 = 5.0;

/// Neighbouring polyline points closer than this are the same point.
pub const DUPLICATE_TOLERANCE: f64 = 1e-7;

// Candidates farther than this are never chosen while sequencing.
const SEQUENCE_SEARCH_RADIUS: f64 = 100.0;

pub fn levels() -> RangeInclusive<i32> {
    LEVEL_MIN..=LEVEL_MAX
}

pub fn level_target(m: i32) -> f64 {
    m as f64 * LEVEL_SPACING
}

pub(crate) fn level_slot(m: i32) -> Option<usize> {
    levels().contains(&m).then(|| (m - LEVEL_MIN) as usize)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    X,
    Y,
}

impl Field {
    pub fn value(self, point: &GridPoint) -> f64 {
        match self {
            Field::X => point.x,
            Field::Y => point.y,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IsoPoint {
    pub theta: f64,
    pub phi: f64,
    pub diam: Option<f64>,
}

impl IsoPoint {
    /// Euclidean distance in (theta, phi).
    pub fn distance(&self, other: &IsoPoint) -> f64 {
        ((self.phi - other.phi).powi(2) + (self.theta - other.theta).powi(2)).sqrt()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Isocurve {
    pub level: i32,
    pub points: Vec<IsoPoint>,
}

impl Isocurve {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the last point, -1 for an empty curve.
    pub fn last_index(&self) -> i32 {
        self.points.len() as i32 - 1
    }

    /// Consecutive point pairs along the polyline.
    pub fn segments(&self) -> impl Iterator<Item = (&IsoPoint, &IsoPoint)> {
        self.points.windows(2).map(|w| (&w[0], &w[1]))
    }
}

/// All contour levels of one field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IsocurveFamily {
    pub field: Field,
    curves: Vec<Isocurve>,
}

impl IsocurveFamily {
    pub fn empty(field: Field) -> Self {
        Self {
            field,
            curves: levels()
                .map(|level| Isocurve {
                    level,
                    points: Vec::new(),
                })
                .collect(),
        }
    }

    pub fn extract(grid: &FacetGrid, field: Field) -> Self {
        let curves = levels()
            .map(|level| {
                let mut points = scan_edges(grid, field, level_target(level));
                sequence_greedy(&mut points);
                eliminate_doubles(&mut points);
                Isocurve { level, points }
            })
            .collect();
        Self { field, curves }
    }

    pub fn curve(&self, m: i32) -> Option<&Isocurve> {
        level_slot(m).map(|s| &self.curves[s])
    }

    pub fn curve_mut(&mut self, m: i32) -> Option<&mut Isocurve> {
        level_slot(m).map(|s| &mut self.curves[s])
    }

    pub fn point(&self, k: usize, m: i32) -> Option<&IsoPoint> {
        self.curve(m).and_then(|c| c.points.get(k))
    }

    /// Index of the last point on level `m`; -1 when the level is empty.
    pub fn k_num(&self, m: i32) -> i32 {
        self.curve(m).map_or(-1, Isocurve::last_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Isocurve> {
        self.curves.iter()
    }

    pub fn non_empty_levels(&self) -> usize {
        self.curves.iter().filter(|c| !c.is_empty()).count()
    }
}

/// Collects one interpolated point per grid edge whose field values
/// straddle `target`.
///
/// For every row i the edges along j are visited first, then the edges
/// towards row i + 1.
pub fn scan_edges(grid: &FacetGrid, field: Field, target: f64) -> Vec<IsoPoint> {
    let with_diam = grid.has_diameter();
    let mut hits = Vec::new();

    let mut visit = |a: GridIndex, b: GridIndex| {
        let (Some(p0), Some(p1)) = (grid.valid_point(a), grid.valid_point(b)) else {
            return;
        };
        let (v0, v1) = (field.value(p0), field.value(p1));
        if (v0 - target) * (v1 - target) <= 0.0 {
            hits.push(interpolate_edge(p0, p1, v0, v1, target, with_diam));
        }
    };

    for i in I_MIN..=I_MAX {
        for j in J_MIN..J_MAX {
            visit(GridIndex::new(i, j), GridIndex::new(i, j + 1));
        }
        if i < I_MAX {
            for j in J_MIN..=J_MAX {
                visit(GridIndex::new(i, j), GridIndex::new(i + 1, j));
            }
        }
    }

    hits
}

/// Linear interpolation of the edge `p0 → p1` at the point where the field
/// reaches `target`. Equal field values fall back to `p0`.
pub fn interpolate_edge(
    p0: &GridPoint,
    p1: &GridPoint,
    v0: f64,
    v1: f64,
    target: f64,
    with_diam: bool,
) -> IsoPoint {
    let denom = v1 - v0;
    let lerp = |a: f64, b: f64| {
        if denom == 0.0 {
            a
        } else {
            a + (b - a) * (target - v0) / denom
        }
    };

    let diam = if with_diam {
        match (p0.diam, p1.diam) {
            (Some(d0), Some(d1)) => Some(lerp(d0, d1)),
            (d0, _) => d0,
        }
    } else {
        None
    };

    IsoPoint {
        theta: lerp(p0.theta(), p1.theta()),
        phi: lerp(p0.phi(), p1.phi()),
        diam,
    }
}

/// Reorders the points into a walk by repeatedly swapping the nearest
/// remaining point into the next slot.
///
/// Ties go to the last candidate scanned (`<=`), which keeps the output
/// identical to the established drawings.
pub fn sequence_greedy(points: &mut [IsoPoint]) {
    let n = points.len();
    for k1 in 0..n.saturating_sub(1) {
        let mut min_distance = SEQUENCE_SEARCH_RADIUS;
        let mut nearest = None;
        for j in k1 + 1..n {
            let distance = points[k1].distance(&points[j]);
            if distance <= min_distance {
                min_distance = distance;
                nearest = Some(j);
            }
        }
        if let Some(j) = nearest {
            points.swap(k1 + 1, j);
        }
    }
}

/// Removes the later point of every consecutive pair closer than
/// [`DUPLICATE_TOLERANCE`], re-checking the same position after a removal.
pub fn eliminate_doubles(points: &mut Vec<IsoPoint>) {
    let mut k = 0;
    while k + 1 < points.len() {
        if points[k].distance(&points[k + 1]) < DUPLICATE_TOLERANCE {
            points.remove(k + 1);
        } else {
            k += 1;
        }
    }
}
