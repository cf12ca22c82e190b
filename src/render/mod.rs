//! Scene builders for the facet, angular and globe views.

pub mod angular;
pub mod facet;
pub mod globe;

pub use angular::*;
pub use facet::*;
pub use globe::*;

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::isocurve::LEVEL_SPACING;
use crate::metrics::CellMetrics;
use crate::projection::DEFAULT_RADIUS;
use crate::scene::Color;

/// Per-cell value printed next to each centroid in an export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelMetric {
    /// `A`: opening angle.
    #[default]
    OpeningAngle,
    /// `X`: z1–z2 separation in level steps.
    DeltaX,
    /// `Y`: z1–z4 separation in level steps.
    DeltaY,
    /// `Z`: z2–z4 separation in level steps.
    DeltaZ,
    /// `p`: diameter times opening angle.
    Pitch,
    /// `D`: mean diameter.
    Diameter,
}

impl LabelMetric {
    pub const ALL: [LabelMetric; 6] = [
        LabelMetric::OpeningAngle,
        LabelMetric::DeltaX,
        LabelMetric::DeltaY,
        LabelMetric::DeltaZ,
        LabelMetric::Pitch,
        LabelMetric::Diameter,
    ];

    /// Selector index 1–6.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index).checked_sub(1)?).copied()
    }

    pub fn index(self) -> u8 {
        match self {
            LabelMetric::OpeningAngle => 1,
            LabelMetric::DeltaX => 2,
            LabelMetric::DeltaY => 3,
            LabelMetric::DeltaZ => 4,
            LabelMetric::Pitch => 5,
            LabelMetric::Diameter => 6,
        }
    }

    /// One-letter code used in export file names.
    pub fn code(self) -> char {
        match self {
            LabelMetric::OpeningAngle => 'A',
            LabelMetric::DeltaX => 'X',
            LabelMetric::DeltaY => 'Y',
            LabelMetric::DeltaZ => 'Z',
            LabelMetric::Pitch => 'p',
            LabelMetric::Diameter => 'D',
        }
    }

    pub fn needs_diameter(self) -> bool {
        matches!(self, LabelMetric::Pitch | LabelMetric::Diameter)
    }

    /// Formatted value without the surrounding parentheses. `None` when the
    /// metric needs a diameter the cell does not have.
    pub fn value(self, m: &CellMetrics) -> Option<String> {
        let steps = |df: f64| df * 180.0 / PI / LEVEL_SPACING;
        Some(match self {
            LabelMetric::OpeningAngle => format!("{:.2}", m.io_angle),
            LabelMetric::DeltaX => format!("{:.2}", steps(m.dfx)),
            LabelMetric::DeltaY => format!("{:.2}", steps(m.dfy)),
            LabelMetric::DeltaZ => format!("{:.2}", steps(m.dfz)),
            LabelMetric::Pitch => format!("{:.3}", m.cdiam? * m.io_angle * PI / 180.0),
            LabelMetric::Diameter => format!("{}", m.cdiam?.round() as i64),
        })
    }

    pub fn label(self, m: &CellMetrics) -> Option<String> {
        self.value(m).map(|v| format!("({v})"))
    }
}

/// Colors and sizes shared by the scene builders.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneStyle {
    pub radius: f64,
    pub visible: Color,
    pub hidden: Color,
    pub globe: Color,
    pub outline: Color,
    pub axis: Color,
    pub iso_x: Color,
    pub iso_y: Color,
    pub reference_grid: Color,
    pub current_grid: Color,
    pub label_size: f64,
    pub label_offset: f64,
    pub caption_size: f64,
    pub axis_label_size: f64,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            visible: Color::DARK_GREEN,
            hidden: Color::RED,
            globe: Color::gray(0.5),
            outline: Color::BLACK,
            axis: Color::GOLDENROD,
            iso_x: Color::RED,
            iso_y: Color::BLUE,
            reference_grid: Color::DARK_GREEN,
            current_grid: Color::BLACK,
            label_size: 7.0,
            label_offset: 4.0,
            caption_size: 12.0,
            axis_label_size: 16.0,
        }
    }
}
