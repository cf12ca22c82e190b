//! Facet view: the planar (x, y) layout on a 60° skewed lattice.

use glam::DVec2;

use super::SceneStyle;
use crate::grid::{FacetGrid, GridIndex, I_MAX, I_MIN, J_MAX, J_MIN};
use crate::scene::{Color, Scene, Stroke};

/// Scene units per facet unit.
pub const FACET_SCALE: f64 = 6.0;

/// Half the side of a facet blob.
pub const BLOB_HALF_SIZE: f64 = 3.0;

const COS60: f64 = 0.5;
const SIN60: f64 = 0.866_025_403_784_438_6;

pub fn facet_to_screen(x: f64, y: f64) -> DVec2 {
    DVec2::new(FACET_SCALE * (x + y * COS60), FACET_SCALE * y * SIN60)
}

/// Inverse of [`facet_to_screen`], used to place dragged and inserted facets.
pub fn screen_to_facet(p: DVec2) -> DVec2 {
    let y = p.y / FACET_SCALE / SIN60;
    let x = p.x / FACET_SCALE - y * COS60;
    DVec2::new(x, y)
}

/// Blobs for every valid facet (hollow when fake), the `reference` lattice
/// lines underneath and the `current` ones on top.
pub fn facet_scene(current: &FacetGrid, reference: &FacetGrid, style: &SceneStyle) -> Scene {
    let mut scene = Scene::new();
    axes(&mut scene, style);

    for j in (J_MIN..=J_MAX).rev() {
        for i in I_MIN..=I_MAX {
            let Some(p) = current.valid_point(GridIndex::new(i, j)) else {
                continue;
            };
            let c = facet_to_screen(p.x, p.y);
            let half = DVec2::splat(BLOB_HALF_SIZE);
            if p.fake {
                scene.rect(c - half, c + half, Some(Color::WHITE), Some(Stroke::new(Color::BLACK, 1.0)));
            } else {
                scene.rect(c - half, c + half, Some(Color::BLACK), None);
            }
        }
    }

    lattice_lines(&mut scene, reference, Stroke::new(style.reference_grid, 1.0));
    lattice_lines(&mut scene, current, Stroke::new(style.current_grid, 1.0));
    scene
}

/// Lines joining neighbouring valid facets, first along j for every i,
/// then along i for every j. Invalid cells break the line.
fn lattice_lines(scene: &mut Scene, grid: &FacetGrid, stroke: Stroke) {
    let at = |i: i32, j: i32| {
        grid.valid_point(GridIndex::new(i, j))
            .map(|p| facet_to_screen(p.x, p.y))
    };
    for i in I_MIN..=I_MAX {
        scene.runs((J_MIN..=J_MAX).rev().map(|j| at(i, j)), stroke);
    }
    for j in (J_MIN..=J_MAX).rev() {
        scene.runs((I_MIN..=I_MAX).map(|i| at(i, j)), stroke);
    }
}

fn axes(scene: &mut Scene, style: &SceneStyle) {
    let stroke = Stroke::new(style.axis, 1.0);
    scene.line(DVec2::new(-500.0, 0.0), DVec2::new(410.0, 0.0), stroke);
    let skew = DVec2::new(-80.0, 0.0);
    scene.line(skew, skew + DVec2::new(231.0, 400.0), stroke);
    scene.line(skew, skew - DVec2::new(231.0, 400.0), stroke);
    scene.text(DVec2::new(400.0, 5.0), "X", style.axis_label_size, style.axis);
    scene.text(DVec2::new(125.0, 350.0), "Y", style.axis_label_size, style.axis);
}
