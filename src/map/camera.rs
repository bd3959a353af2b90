use glam::{DMat4, DVec3};
use std::f64::consts::{PI, TAU};

use crate::config::CameraConfig;

/// Minimum movement (squared distance) that counts as a camera change.
const EPS: f64 = 1e-6;

/// Perspective camera looking at a target point, Y up.
/// Right-handed with OpenGL clip space (NDC z in [-1, 1]).
#[derive(Clone, Debug)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees
    pub fov_deg: f64,
    /// Width / height of the drawing surface
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
    pub position: DVec3,
    pub target: DVec3,
    pub up: DVec3,
}

impl PerspectiveCamera {
    pub fn new(config: &CameraConfig, aspect: f64) -> Self {
        Self {
            fov_deg: config.fov_deg,
            aspect,
            near: config.near,
            far: config.far,
            position: DVec3::new(0.0, 0.0, config.distance),
            target: DVec3::ZERO,
            up: DVec3::Y,
        }
    }

    /// Update aspect ratio after the surface was resized.
    /// Degenerate sizes keep the previous aspect.
    pub fn set_aspect(&mut self, aspect: f64) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// World → camera transform (the camera's inverse world matrix)
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> DMat4 {
        DMat4::perspective_rh_gl(self.fov_deg.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn world_position(&self) -> DVec3 {
        self.position
    }
}

/// Damped orbit controls around a fixed target. No panning.
///
/// Input accumulates a pending rotation; each `update` applies a
/// `damping_factor` share of it and decays the rest, so the camera keeps
/// gliding for a few frames after input stops.
#[derive(Clone, Debug)]
pub struct OrbitControls {
    pub target: DVec3,
    pub min_distance: f64,
    pub max_distance: f64,
    pub damping_factor: f64,
    /// Pending azimuth change (radians)
    delta_theta: f64,
    /// Pending polar change (radians)
    delta_phi: f64,
    /// Pending dolly scale, applied in one step
    scale: f64,
    last_position: DVec3,
}

impl OrbitControls {
    pub fn new(config: &CameraConfig, camera: &PerspectiveCamera) -> Self {
        Self {
            target: camera.target,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            damping_factor: config.damping_factor,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            last_position: camera.position,
        }
    }

    /// Orbit horizontally. Positive angle moves the camera to the left (globe spins right).
    pub fn rotate_left(&mut self, angle: f64) {
        self.delta_theta -= angle;
    }

    /// Orbit vertically. Positive angle moves the camera up.
    pub fn rotate_up(&mut self, angle: f64) {
        self.delta_phi -= angle;
    }

    /// Translate a pointer drag (in surface pixels) into rotation.
    /// A drag across the full surface height is one full turn.
    pub fn drag(&mut self, dx: f64, dy: f64, surface_height: f64) {
        if surface_height <= 0.0 {
            return;
        }
        self.rotate_left(TAU * dx / surface_height);
        self.rotate_up(TAU * dy / surface_height);
    }

    /// Move closer to the target by `factor` (> 1)
    pub fn dolly_in(&mut self, factor: f64) {
        self.scale /= factor;
    }

    /// Move away from the target by `factor` (> 1)
    pub fn dolly_out(&mut self, factor: f64) {
        self.scale *= factor;
    }

    /// Drop any pending motion
    pub fn stop(&mut self) {
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.scale = 1.0;
    }

    /// Advance one step. Returns true if the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let radius = offset.length();
        if radius < EPS {
            self.stop();
            return false;
        }

        // Spherical coordinates with Y as the polar axis
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        theta += self.delta_theta * self.damping_factor;
        phi += self.delta_phi * self.damping_factor;
        phi = phi.clamp(EPS, PI - EPS);

        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        let zoom_changed = self.scale != 1.0;

        let (sin_phi, cos_phi) = phi.sin_cos();
        let (sin_theta, cos_theta) = theta.sin_cos();
        camera.position = self.target
            + DVec3::new(radius * sin_phi * sin_theta, radius * cos_phi, radius * sin_phi * cos_theta);
        camera.target = self.target;

        self.delta_theta *= 1.0 - self.damping_factor;
        self.delta_phi *= 1.0 - self.damping_factor;
        if self.delta_theta.abs() < EPS {
            self.delta_theta = 0.0;
        }
        if self.delta_phi.abs() < EPS {
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;

        if zoom_changed || self.last_position.distance_squared(camera.position) > EPS {
            self.last_position = camera.position;
            return true;
        }
        false
    }
}
