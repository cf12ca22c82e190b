//! Interactive globe preview window.

use bevy::math::Isometry2d;
use bevy::prelude::*;
use error_stack::Report;

use crate::crossing::CrossingMesh;
use crate::projection::{ViewState, ViewStep};
use crate::render::{SceneStyle, preview_scene};
use crate::scene::{Primitive, Scene};
use crate::{FacetError, Result};

#[derive(Resource)]
pub struct PreviewState {
    mesh: CrossingMesh,
    tilt_deg: f64,
    view: ViewState,
    style: SceneStyle,
    /// Last scene that built without error.
    scene: Scene,
    dirty: bool,
}

impl PreviewState {
    pub fn new(mesh: CrossingMesh, tilt_deg: f64, view: ViewState, style: SceneStyle) -> Result<Self> {
        let scene = preview_scene(&mesh, tilt_deg, view, &style)?;
        Ok(Self {
            mesh,
            tilt_deg,
            view,
            style,
            scene,
            dirty: false,
        })
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Applies a view step and rebuilds the scene. On failure the previous
    /// scene and view stay in place.
    pub fn step(&mut self, step: ViewStep) -> Result<()> {
        let view = self.view.stepped(step);
        let scene = preview_scene(&self.mesh, self.tilt_deg, view, &self.style)?;
        self.view = view;
        self.scene = scene;
        self.dirty = true;
        Ok(())
    }
}

/// Text primitives of the current scene, respawned on every rebuild.
#[derive(Component)]
struct SceneLabel;

#[derive(Component)]
struct StatusLine;

pub struct PreviewPlugin;

impl Plugin for PreviewPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (setup_camera, spawn_labels))
            .add_systems(Update, (rotate_view, spawn_labels, draw_scene).chain());
    }
}

/// Opens the preview window and blocks until it is closed.
pub fn run_preview(
    mesh: CrossingMesh,
    tilt_deg: f64,
    view: ViewState,
    style: SceneStyle,
) -> Result<()> {
    let mut state = PreviewState::new(mesh, tilt_deg, view, style)?;
    state.dirty = true;

    let exit = App::new()
        .insert_resource(ClearColor(Color::WHITE))
        .insert_resource(state)
        .add_plugins((
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Ortho Space".into(),
                        ..default()
                    }),
                    ..default()
                })
                .disable::<bevy::log::LogPlugin>(),
            PreviewPlugin,
        ))
        .run();

    match exit {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => Err(Report::new(FacetError::Render)
            .attach(format!("preview exited with code {code}"))),
    }
}

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
    commands.spawn((
        Text2d::new(""),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        TextColor(Color::srgb(0.8, 0.0, 0.0)),
        Transform::from_xyz(0.0, 285.0, 2.0),
        StatusLine,
    ));
}

fn rotate_view(
    keys: Res<ButtonInput<KeyCode>>,
    mut state: ResMut<PreviewState>,
    mut status: Query<&mut Text2d, With<StatusLine>>,
) {
    let bindings = [
        (KeyCode::ArrowLeft, ViewStep::Left),
        (KeyCode::ArrowRight, ViewStep::Right),
        (KeyCode::ArrowUp, ViewStep::Up),
        (KeyCode::ArrowDown, ViewStep::Down),
    ];

    for (key, step) in bindings {
        if !keys.just_pressed(key) {
            continue;
        }
        let message = match state.step(step) {
            Ok(()) => String::new(),
            Err(report) => {
                error!(?report, "preview rebuild failed, keeping last scene");
                format!("Error: {}", report.current_context())
            }
        };
        for mut text in &mut status {
            text.0.clone_from(&message);
        }
    }
}

fn spawn_labels(
    mut commands: Commands,
    mut state: ResMut<PreviewState>,
    labels: Query<Entity, With<SceneLabel>>,
) {
    if !state.dirty {
        return;
    }
    state.dirty = false;

    for entity in &labels {
        commands.entity(entity).despawn();
    }
    for primitive in state.scene.primitives() {
        if let Primitive::Text {
            at,
            content,
            size,
            color,
        } = primitive
        {
            commands.spawn((
                Text2d::new(content.clone()),
                TextFont {
                    font_size: *size as f32,
                    ..default()
                },
                TextColor((*color).into()),
                Transform::from_xyz(at.x as f32, at.y as f32, 1.0),
                SceneLabel,
            ));
        }
    }
}

fn draw_scene(mut gizmos: Gizmos, state: Res<PreviewState>) {
    for primitive in state.scene.primitives() {
        match primitive {
            Primitive::Polyline { points, stroke } => {
                gizmos.linestrip_2d(points.iter().map(|p| p.as_vec2()), stroke.color);
            }
            Primitive::Circle {
                center,
                radius,
                fill,
                stroke,
            } => {
                let Some(color) = stroke.map(|s| s.color).or(*fill) else {
                    continue;
                };
                gizmos.circle_2d(
                    Isometry2d::from_translation(center.as_vec2()),
                    *radius as f32,
                    color,
                );
            }
            Primitive::Rect {
                min,
                max,
                fill,
                stroke,
            } => {
                let Some(color) = stroke.map(|s| s.color).or(*fill) else {
                    continue;
                };
                gizmos.rect_2d(
                    Isometry2d::from_translation(((*min + *max) * 0.5).as_vec2()),
                    (*max - *min).as_vec2(),
                    color,
                );
            }
            // drawn as Text2d entities
            Primitive::Text { .. } => {}
        }
    }
}
