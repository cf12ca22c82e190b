//! Sphere rotations, orthographic projection and hemisphere visibility.

use std::f64::consts::PI;

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Radius of the preview globe in scene units.
pub const DEFAULT_RADIUS: f64 = 270.0;

/// Degrees per arrow-key step of the interactive view.
pub const VIEW_STEP_DEG: f64 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SphericalPoint {
    pub theta: f64,
    pub phi: f64,
}

impl SphericalPoint {
    pub const fn new(theta: f64, phi: f64) -> Self {
        Self { theta, phi }
    }

    pub fn distance(&self, other: &SphericalPoint) -> f64 {
        ((self.theta - other.theta).powi(2) + (self.phi - other.phi).powi(2)).sqrt()
    }
}

/// Re-expresses `(theta, phi)` in a frame tilted by `tilt_deg` about the
/// axis orthogonal to the pole, keeping phi in (-π, π].
pub fn rotate_centroids(theta: f64, phi: f64, tilt_deg: f64) -> SphericalPoint {
    let (st, ct) = tilt_deg.to_radians().sin_cos();

    let s = (phi.cos() * theta.cos() * st + theta.sin() * ct).clamp(-1.0, 1.0);
    let theta_out = (s / (1.0 - s * s).sqrt()).atan();

    let sf = phi.sin() * theta.cos() / theta_out.cos();
    let cf = (phi.cos() * theta.cos() * ct - theta.sin() * st) / theta_out.cos();

    let mut phi_out = (sf / cf).atan();
    if cf < 0.0 {
        phi_out += PI;
    }
    if phi_out > PI {
        phi_out -= 2.0 * PI;
    }

    SphericalPoint::new(theta_out, phi_out)
}

/// Rotates `(x, z)` by `angle_deg` about the y axis.
pub fn rotate_y(x: f64, z: f64, angle_deg: f64) -> (f64, f64) {
    let (s, c) = angle_deg.to_radians().sin_cos();
    (x * c + z * s, -x * s + z * c)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    Front,
    Back,
}

impl Hemisphere {
    /// Depth 0 belongs to the front.
    pub fn classify(depth: f64) -> Self {
        if depth >= 0.0 {
            Hemisphere::Front
        } else {
            Hemisphere::Back
        }
    }

    pub fn is_visible(self) -> bool {
        self == Hemisphere::Front
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewStep {
    Left,
    Right,
    Up,
    Down,
}

/// Interactive view rotation, in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub theta0: f64,
    pub fi0: f64,
}

impl ViewState {
    pub const fn new(theta0: f64, fi0: f64) -> Self {
        Self { theta0, fi0 }
    }

    pub fn stepped(self, step: ViewStep) -> Self {
        let mut next = self;
        match step {
            ViewStep::Right => next.fi0 -= VIEW_STEP_DEG,
            ViewStep::Left => next.fi0 += VIEW_STEP_DEG,
            ViewStep::Up => next.theta0 += VIEW_STEP_DEG,
            ViewStep::Down => next.theta0 -= VIEW_STEP_DEG,
        }
        if next.fi0 > 180.0 {
            next.fi0 -= 360.0;
        } else if next.fi0 < -180.0 {
            next.fi0 += 360.0;
        }
        next.theta0 = next.theta0.clamp(-90.0, 90.0);
        next
    }

    pub fn caption(&self) -> String {
        format!("{} {}", self.theta0, self.fi0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    /// Scene position, y up.
    pub screen: DVec2,
    /// Rotated x; positive towards the viewer.
    pub depth: f64,
    pub hemisphere: Hemisphere,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projector {
    pub radius: f64,
    pub view: ViewState,
}

impl Projector {
    pub const fn new(radius: f64, view: ViewState) -> Self {
        Self { radius, view }
    }

    pub fn project(&self, p: SphericalPoint) -> Projected {
        let azimuth = p.phi - self.view.fi0.to_radians();
        let x = self.radius * p.theta.cos() * azimuth.cos();
        let y = self.radius * p.theta.cos() * azimuth.sin();
        let z = -self.radius * p.theta.sin();

        let (x, z) = rotate_y(x, z, self.view.theta0);
        Projected {
            screen: DVec2::new(y, -z),
            depth: x,
            hemisphere: Hemisphere::classify(x),
        }
    }
}
