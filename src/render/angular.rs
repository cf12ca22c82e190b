//! Angular view: the grid, both contour families and the Z lines plotted
//! in (phi, theta) degrees.

use glam::DVec2;

use super::SceneStyle;
use crate::crossing::diagonal_sums;
use crate::grid::FacetGrid;
use crate::isocurve::{IsoPoint, IsocurveFamily};
use crate::pipeline::Recompute;
use crate::scene::{Color, Scene, Stroke};

/// Scene units per degree.
pub const ANGULAR_SCALE: f64 = 3.0;

/// Scene position of phi = 0, theta = 0 measured from the top-left corner
/// of the plot.
pub const ANGULAR_ORIGIN: DVec2 = DVec2::new(120.0, 300.0);

const AXIS_LENGTH: f64 = 600.0;

pub fn angular_to_screen(theta: f64, phi: f64) -> DVec2 {
    DVec2::new(
        ANGULAR_ORIGIN.x + ANGULAR_SCALE * phi.to_degrees(),
        ANGULAR_SCALE * theta.to_degrees() - ANGULAR_ORIGIN.y,
    )
}

pub fn angular_scene(grid: &FacetGrid, result: &Recompute, style: &SceneStyle) -> Scene {
    let mut scene = Scene::new();
    axes(&mut scene, style);

    for (_, p) in grid.valid_points() {
        scene.circle(angular_to_screen(p.theta(), p.phi()), 1.0, Some(Color::BLACK), None);
    }

    contours(&mut scene, &result.iso_x, style.iso_x);
    contours(&mut scene, &result.iso_y, style.iso_y);

    for mm in diagonal_sums() {
        let line = result
            .mesh
            .z_line(mm)
            .map(|c| angular_to_screen(c.theta, c.phi))
            .collect();
        scene.polyline(line, Stroke::new(style.visible, 1.0));
    }

    scene
}

fn contours(scene: &mut Scene, family: &IsocurveFamily, color: Color) {
    let to_screen = |p: &IsoPoint| angular_to_screen(p.theta, p.phi);
    for curve in family.iter() {
        scene.polyline(curve.points.iter().map(to_screen).collect(), Stroke::new(color, 1.0));
    }
}

fn axes(scene: &mut Scene, style: &SceneStyle) {
    let stroke = Stroke::new(style.axis, 1.0);
    let phi_axis_y = -ANGULAR_ORIGIN.y;
    scene.line(
        DVec2::new(0.0, phi_axis_y),
        DVec2::new(AXIS_LENGTH, phi_axis_y),
        stroke,
    );
    scene.line(
        DVec2::new(ANGULAR_ORIGIN.x, 0.0),
        DVec2::new(ANGULAR_ORIGIN.x, -AXIS_LENGTH),
        stroke,
    );
    scene.text(DVec2::new(550.0, phi_axis_y + 2.0), "Φ", style.axis_label_size, style.axis);
    scene.text(DVec2::new(110.0, -15.0), "θ", style.axis_label_size, style.axis);
}
