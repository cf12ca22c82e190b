//! Facet grid store.
//!
//! The lattice is fixed at i ∈ [-4, 12] (azimuth) and j ∈ [-9, 9]
//! (elevation), 10° apart. Every cell carries its angular position from
//! creation on; only the planar facet coordinates, the diameter and the
//! validity flags change afterwards.

use std::ops::Deref;
use std::sync::Arc;

use error_stack::Report;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{FacetError, Result};

pub const I_MIN: i32 = -4;
pub const I_MAX: i32 = 12;
pub const J_MIN: i32 = -9;
pub const J_MAX: i32 = 9;

/// Angular distance between neighbouring lattice cells, in degrees.
pub const ANGLE_STEP_DEG: f64 = 10.0;

/// Last i row mirrored by [`FacetGrid::reverse_y`].
pub const REVERSE_Y_I_MAX: i32 = 9;

const J_SPAN: usize = (J_MAX - J_MIN + 1) as usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridIndex {
    pub i: i32,
    pub j: i32,
}

impl GridIndex {
    pub const fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    pub fn in_range(self) -> bool {
        (I_MIN..=I_MAX).contains(&self.i) && (J_MIN..=J_MAX).contains(&self.j)
    }

    /// Elevation of the cell in radians.
    pub fn theta(self) -> f64 {
        (self.j as f64 * ANGLE_STEP_DEG).to_radians()
    }

    /// Azimuth of the cell in radians.
    pub fn phi(self) -> f64 {
        (self.i as f64 * ANGLE_STEP_DEG).to_radians()
    }

    fn slot(self) -> Option<usize> {
        self.in_range()
            .then(|| (self.i - I_MIN) as usize * J_SPAN + (self.j - J_MIN) as usize)
    }
}

/// One row of a facet data set: `(j·10, i·10, x, y[, diam])`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub j10: f64,
    pub i10: f64,
    pub x: f64,
    pub y: f64,
    pub diam: Option<f64>,
}

impl Sample {
    /// Lattice index of the sample, `None` unless both angles are finite
    /// whole multiples of the lattice step.
    pub fn index(&self) -> Option<GridIndex> {
        Some(GridIndex::new(
            lattice_step(self.i10)?,
            lattice_step(self.j10)?,
        ))
    }
}

fn lattice_step(deg: f64) -> Option<i32> {
    let steps = deg / ANGLE_STEP_DEG;
    let rounded = steps.round();
    (steps.is_finite() && (steps - rounded).abs() < 1e-9).then_some(rounded as i32)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GridPoint {
    pub valid: bool,
    /// Synthetic cell: never loaded from data, or inserted by the user.
    pub fake: bool,
    pub x: f64,
    pub y: f64,
    pub diam: Option<f64>,
    theta: f64,
    phi: f64,
}

impl GridPoint {
    fn empty(index: GridIndex) -> Self {
        Self {
            valid: false,
            fake: true,
            x: 0.0,
            y: 0.0,
            diam: None,
            theta: index.theta(),
            phi: index.phi(),
        }
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FacetGrid {
    points: Vec<GridPoint>,
    has_diameter: bool,
}

impl Default for FacetGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl FacetGrid {
    /// Full lattice, every cell invalid.
    pub fn new() -> Self {
        let points = Self::indices().map(GridPoint::empty).collect();
        Self {
            points,
            has_diameter: false,
        }
    }

    pub fn from_samples(samples: &[Sample], has_diameter: bool) -> Result<Self> {
        let mut grid = Self::new();
        grid.load(samples, has_diameter)?;
        Ok(grid)
    }

    /// Marks every listed cell valid and sets its coordinates.
    ///
    /// Samples off the lattice (outside it, between cells or not finite) are
    /// rejected and leave the grid untouched.
    pub fn load(&mut self, samples: &[Sample], has_diameter: bool) -> Result<()> {
        let indices = samples
            .iter()
            .map(|s| {
                s.index().filter(|index| index.in_range()).ok_or_else(|| {
                    Report::new(FacetError::IndexOutOfRange)
                        .attach(format!("sample j10={} i10={}", s.j10, s.i10))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.has_diameter = has_diameter;
        for (sample, index) in samples.iter().zip(indices) {
            let Some(point) = self.slot_mut(index) else {
                continue;
            };
            point.valid = true;
            point.fake = false;
            point.x = sample.x;
            point.y = sample.y;
            point.diam = if has_diameter { sample.diam } else { None };
        }

        debug!(
            samples = samples.len(),
            valid = self.valid_count(),
            has_diameter,
            "facet grid loaded"
        );
        Ok(())
    }

    pub fn has_diameter(&self) -> bool {
        self.has_diameter
    }

    /// Every lattice index, i-major.
    pub fn indices() -> impl Iterator<Item = GridIndex> {
        (I_MIN..=I_MAX).flat_map(|i| (J_MIN..=J_MAX).map(move |j| GridIndex::new(i, j)))
    }

    pub fn get(&self, i: i32, j: i32) -> Option<&GridPoint> {
        self.point(GridIndex::new(i, j))
    }

    pub fn point(&self, index: GridIndex) -> Option<&GridPoint> {
        index.slot().map(|s| &self.points[s])
    }

    /// The point at `index` if it exists and is valid.
    pub fn valid_point(&self, index: GridIndex) -> Option<&GridPoint> {
        self.point(index).filter(|p| p.valid)
    }

    fn slot_mut(&mut self, index: GridIndex) -> Option<&mut GridPoint> {
        index.slot().map(|s| &mut self.points[s])
    }

    fn checked_slot_mut(&mut self, index: GridIndex) -> Result<&mut GridPoint> {
        self.slot_mut(index).ok_or_else(|| {
            Report::new(FacetError::IndexOutOfRange)
                .attach(format!("i={} j={}", index.i, index.j))
        })
    }

    pub fn valid_points(&self) -> impl Iterator<Item = (GridIndex, &GridPoint)> {
        Self::indices()
            .zip(self.points.iter())
            .filter(|(_, p)| p.valid)
    }

    pub fn valid_count(&self) -> usize {
        self.points.iter().filter(|p| p.valid).count()
    }

    /// Sets the planar coordinates of a cell and marks it valid.
    ///
    /// Angular coordinates stay those of the lattice index.
    pub fn set_point(&mut self, i: i32, j: i32, x: f64, y: f64) -> Result<()> {
        let point = self.checked_slot_mut(GridIndex::new(i, j))?;
        point.x = x;
        point.y = y;
        point.valid = true;
        Ok(())
    }

    /// Drags an existing facet to a new planar position.
    pub fn move_point(&mut self, i: i32, j: i32, x: f64, y: f64) -> Result<GridSnapshot> {
        let index = GridIndex::new(i, j);
        if !self.checked_slot_mut(index)?.valid {
            return Err(Report::new(FacetError::InvalidEdit)
                .attach(format!("cannot move empty facet i={i} j={j}")));
        }
        self.set_point(i, j, x, y)?;
        Ok(self.snapshot())
    }

    /// Inserts a facet one lattice step beyond `neighbor`, continuing the
    /// direction from `anchor` to `neighbor`.
    ///
    /// The two selected facets must be valid direct lattice neighbours along
    /// i or along j, and the target cell must be inside the lattice and
    /// empty. The new facet copies the diameter of `neighbor` and stays
    /// marked fake.
    pub fn insert_point(
        &mut self,
        anchor: GridIndex,
        neighbor: GridIndex,
        x: f64,
        y: f64,
    ) -> Result<(GridIndex, GridSnapshot)> {
        for selected in [anchor, neighbor] {
            let point = self.point(selected).ok_or_else(|| {
                Report::new(FacetError::IndexOutOfRange)
                    .attach(format!("i={} j={}", selected.i, selected.j))
            })?;
            if !point.valid {
                return Err(Report::new(FacetError::InvalidEdit)
                    .attach("insertion extrapolates from existing facets only")
                    .attach(format!("empty facet i={} j={}", selected.i, selected.j)));
            }
        }

        let di = neighbor.i - anchor.i;
        let dj = neighbor.j - anchor.j;

        let target = match (di, dj) {
            (-1 | 1, 0) => GridIndex::new(2 * neighbor.i - anchor.i, anchor.j),
            (0, -1 | 1) => GridIndex::new(anchor.i, 2 * neighbor.j - anchor.j),
            _ => {
                return Err(Report::new(FacetError::InvalidEdit)
                    .attach("insertion needs two directly adjacent facets")
                    .attach(format!(
                        "anchor=({}, {}) neighbor=({}, {})",
                        anchor.i, anchor.j, neighbor.i, neighbor.j
                    )));
            }
        };

        if !target.in_range() {
            return Err(Report::new(FacetError::InvalidEdit)
                .attach("insertion target outside the lattice")
                .attach(format!("i={} j={}", target.i, target.j)));
        }
        if self.valid_point(target).is_some() {
            return Err(Report::new(FacetError::InvalidEdit)
                .attach("insertion target already occupied")
                .attach(format!("i={} j={}", target.i, target.j)));
        }

        let diam = self.valid_point(neighbor).and_then(|p| p.diam);
        let point = self.checked_slot_mut(target)?;
        point.x = x;
        point.y = y;
        point.diam = diam;
        point.valid = true;
        point.fake = true;

        debug!(i = target.i, j = target.j, "facet inserted");
        Ok((target, self.snapshot()))
    }

    /// Mirrors the layout vertically by negating y on the rows i ≤ 9.
    pub fn reverse_y(&mut self) -> GridSnapshot {
        for i in I_MIN..=REVERSE_Y_I_MAX {
            for j in J_MIN..=J_MAX {
                if let Some(point) = self.slot_mut(GridIndex::new(i, j))
                    && point.valid
                {
                    point.y = -point.y;
                }
            }
        }
        self.snapshot()
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot(Arc::new(self.clone()))
    }
}

/// Immutable copy of the grid handed to readers after every edit.
#[derive(Clone, Debug)]
pub struct GridSnapshot(Arc<FacetGrid>);

impl Deref for GridSnapshot {
    type Target = FacetGrid;

    fn deref(&self) -> &FacetGrid {
        &self.0
    }
}
