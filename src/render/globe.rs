//! Orthographic globe: preview with the crossing mesh, and labeled export.

use glam::DVec2;
use tracing::{info, warn};

use super::{LabelMetric, SceneStyle};
use crate::Result;
use crate::crossing::{CrossingCell, CrossingMesh, diagonal_sums};
use crate::isocurve::levels;
use crate::projection::{Projected, Projector, SphericalPoint, ViewState, rotate_centroids};
use crate::scene::{Pen, Scene, Stroke};

/// Latitude circles are drawn for j in this range, 10° apart.
pub const LATITUDE_STEPS: std::ops::RangeInclusive<i32> = -8..=8;
pub const MERIDIAN_COUNT: i32 = 36;

const BOLD_WIDTH: f64 = 1.0;
const THIN_WIDTH: f64 = 0.25;

/// Sphere outline with the front halves of the latitude and meridian
/// circles.
pub fn globe_outline(projector: &Projector, style: &SceneStyle) -> Scene {
    let mut scene = Scene::new();
    let visible = |p: SphericalPoint| {
        let projected = projector.project(p);
        projected.hemisphere.is_visible().then_some(projected.screen)
    };

    for j in LATITUDE_STEPS {
        let theta = (j as f64 * 10.0).to_radians();
        let width = if j == 0 { BOLD_WIDTH } else { THIN_WIDTH };
        let samples = (0..=360).map(|deg| visible(SphericalPoint::new(theta, (deg as f64).to_radians())));
        scene.runs(samples, Stroke::new(style.globe, width));
    }

    for k in 0..MERIDIAN_COUNT {
        let phi = (k as f64 * 10.0).to_radians();
        // quarter meridians
        let width = if k % 9 == 0 { BOLD_WIDTH } else { THIN_WIDTH };
        let samples = (-90..=90).map(|deg| visible(SphericalPoint::new((deg as f64).to_radians(), phi)));
        scene.runs(samples, Stroke::new(style.globe, width));
    }

    scene.circle(
        DVec2::ZERO,
        projector.radius,
        None,
        Some(Stroke::new(style.outline, 1.0)),
    );
    scene
}

/// Interactive preview: globe, caption and the X, Y and Z lines of the
/// crossing mesh in the frame tilted by `tilt_deg`.
///
/// Each segment takes the color of the hemisphere its end point lies in.
/// A failure discards the whole scene.
pub fn preview_scene(
    mesh: &CrossingMesh,
    tilt_deg: f64,
    view: ViewState,
    style: &SceneStyle,
) -> Result<Scene> {
    let projector = Projector::new(style.radius, view);
    let mut scene = globe_outline(&projector, style);

    let project = |cell: &CrossingCell| {
        projector.project(rotate_centroids(cell.theta, cell.phi, tilt_deg))
    };

    if let Err(report) = mesh_lines(&mut scene, mesh, &project, style) {
        warn!(?report, "preview scene discarded");
        return Err(report);
    }

    let r = projector.radius;
    scene.text(
        DVec2::new(-r - 15.0, -r - 15.0),
        view.caption(),
        style.caption_size,
        style.outline,
    );
    Ok(scene)
}

fn mesh_lines(
    scene: &mut Scene,
    mesh: &CrossingMesh,
    project: &impl Fn(&CrossingCell) -> Projected,
    style: &SceneStyle,
) -> Result<()> {
    // X lines at fixed m1, Y lines at fixed m2, Z lines along m1 + m2
    for m1 in levels() {
        let line = levels().filter_map(|m2| mesh.valid(m1, m2)).map(project);
        trace_line(scene, line, style)?;
    }
    for m2 in levels() {
        let line = levels().filter_map(|m1| mesh.valid(m1, m2)).map(project);
        trace_line(scene, line, style)?;
    }
    for mm in diagonal_sums() {
        trace_line(scene, mesh.z_line(mm).map(project), style)?;
    }
    Ok(())
}

fn trace_line(
    scene: &mut Scene,
    points: impl Iterator<Item = Projected>,
    style: &SceneStyle,
) -> Result<()> {
    let mut pen = Pen::default();
    for (n, p) in points.enumerate() {
        if n == 0 {
            pen.begin(p.screen);
            continue;
        }
        let from = pen.advance(p.screen)?;
        let color = if p.hemisphere.is_visible() {
            style.visible
        } else {
            style.hidden
        };
        scene.line(from, p.screen, Stroke::new(color, 1.0));
    }
    Ok(())
}

/// Export view: globe outline, a dot on every front-hemisphere centroid and
/// the chosen metric as a label beside it.
pub fn export_scene(
    mesh: &CrossingMesh,
    view: ViewState,
    metric: LabelMetric,
    style: &SceneStyle,
) -> Scene {
    let projector = Projector::new(style.radius, view);
    let mut scene = globe_outline(&projector, style);
    let offset = DVec2::splat(style.label_offset);

    let mut dots = 0usize;
    let mut labels = 0usize;
    for (_, _, cell) in mesh.iter() {
        let Some(metrics) = cell.metrics.filter(|_| cell.valid) else {
            continue;
        };
        let p = projector.project(metrics.centroid);
        if !p.hemisphere.is_visible() {
            continue;
        }
        scene.circle(p.screen, 1.0, Some(style.visible), None);
        dots += 1;
        if let Some(label) = metric.label(&metrics) {
            scene.text(p.screen - offset, label, style.label_size, style.outline);
            labels += 1;
        }
    }

    info!(dots, labels, metric = %metric.code(), "export scene built");
    scene
}

/// `<stem>-<code> <theta0> <fi0>.svg`
pub fn export_file_name(stem: &str, metric: LabelMetric, view: ViewState) -> String {
    format!("{stem}-{} {} {}.svg", metric.code(), view.theta0, view.fi0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::CellMetrics;
    use crate::scene::Primitive;

    fn polylines(scene: &Scene) -> Vec<&Vec<DVec2>> {
        scene
            .primitives()
            .iter()
            .filter_map(|p| match p {
                Primitive::Polyline { points, .. } => Some(points),
                _ => None,
            })
            .collect()
    }

    fn texts(scene: &Scene) -> Vec<(DVec2, String)> {
        scene
            .primitives()
            .iter()
            .filter_map(|p| match p {
                Primitive::Text { at, content, .. } => Some((*at, content.clone())),
                _ => None,
            })
            .collect()
    }

    fn set(mesh: &mut CrossingMesh, m1: i32, m2: i32, theta: f64, phi: f64) {
        let cell = mesh.get_mut(m1, m2).unwrap();
        cell.valid = true;
        cell.theta = theta;
        cell.phi = phi;
    }

    #[test]
    fn outline_stays_on_front_hemisphere() {
        let style = SceneStyle::default();
        let projector = Projector::new(style.radius, ViewState::new(30.0, 40.0));
        let scene = globe_outline(&projector, &style);
        let lines = polylines(&scene);
        assert!(!lines.is_empty());
        for p in lines.into_iter().flatten() {
            assert!(p.length() <= style.radius + 1e-6);
        }
        assert!(matches!(
            scene.primitives().last(),
            Some(Primitive::Circle { radius, .. }) if *radius == style.radius
        ));
    }

    #[test]
    fn preview_colors_segments_by_end_point() {
        let mut mesh = CrossingMesh::new();
        set(&mut mesh, 0, 0, 0.0, 0.0);
        set(&mut mesh, 0, 1, 0.0, 0.1);
        // far side of the globe
        set(&mut mesh, 0, 2, 0.0, 3.0);
        let style = SceneStyle::default();
        let scene = preview_scene(&mesh, 0.0, ViewState::default(), &style).unwrap();

        let mesh_strokes: Vec<Stroke> = scene
            .primitives()
            .iter()
            .filter_map(|p| match p {
                Primitive::Polyline { points, stroke } if points.len() == 2 && stroke.width == 1.0 => {
                    Some(*stroke)
                }
                _ => None,
            })
            .filter(|s| s.color == style.visible || s.color == style.hidden)
            .collect();
        // one X line of two segments, no Y lines, no diagonals
        assert_eq!(mesh_strokes.len(), 2);
        assert_eq!(mesh_strokes[0].color, style.visible);
        assert_eq!(mesh_strokes[1].color, style.hidden);
    }

    #[test]
    fn preview_caption_shows_view_angles() {
        let style = SceneStyle::default();
        let scene =
            preview_scene(&CrossingMesh::new(), 0.0, ViewState::new(20.0, -30.0), &style).unwrap();
        let captions = texts(&scene);
        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].1, "20 -30");
    }

    #[test]
    fn export_labels_front_centroids_only() {
        let mut mesh = CrossingMesh::new();
        let metrics = |phi: f64| CellMetrics {
            area: 0.01,
            centroid: SphericalPoint::new(0.0, phi),
            cdiam: Some(10.0),
            io_angle: 2.0,
            dfx: 0.1,
            dfy: 0.1,
            dfz: 0.1,
        };
        for (m1, phi) in [(0, 0.0), (1, 3.0)] {
            let cell = mesh.get_mut(m1, 0).unwrap();
            cell.valid = true;
            cell.metrics = Some(metrics(phi));
        }

        let style = SceneStyle::default();
        let scene = export_scene(&mesh, ViewState::default(), LabelMetric::Diameter, &style);
        let labels = texts(&scene);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].1, "(10)");
        assert_eq!(labels[0].0, DVec2::new(-4.0, -4.0));
        let dots = scene
            .primitives()
            .iter()
            .filter(|p| matches!(p, Primitive::Circle { radius, .. } if *radius == 1.0))
            .count();
        assert_eq!(dots, 1);
    }

    #[test]
    fn export_name_carries_code_and_angles() {
        let name = export_file_name("dome", LabelMetric::Pitch, ViewState::new(-10.0, 170.0));
        assert_eq!(name, "dome-p -10 170.svg");
        let name = export_file_name("dome", LabelMetric::OpeningAngle, ViewState::default());
        assert_eq!(name, "dome-A 0 0.svg");
    }
}
