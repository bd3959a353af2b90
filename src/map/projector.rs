use glam::{DMat3, DMat4, DQuat, DVec3};
use rayon::prelude::*;
use std::f64::consts::PI;

use crate::config::LabelSettings;
use crate::map::camera::PerspectiveCamera;

/// Presentation handle for one on-screen label.
/// The projector never creates labels; it only writes these three properties.
pub trait LabelHandle {
    fn set_visible(&mut self, visible: bool);
    /// Screen position of the label center, in surface pixels
    fn set_position(&mut self, x: f64, y: f64);
    /// Stacking priority: higher draws on top
    fn set_z_order(&mut self, z_order: i32);
}

/// A labeled place on the globe. Immutable after load.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Footprint weight used as a visibility threshold
    pub area: f64,
    /// Index of this location's label in the UI layer's label list
    pub label: usize,
    world_position: DVec3,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, area: f64, label: usize) -> Self {
        Self {
            latitude,
            longitude,
            area,
            label,
            world_position: GeoProjector::anchor(latitude, longitude),
        }
    }

    /// Anchor point on the unit sphere. Also the outward surface normal.
    #[inline]
    pub fn world_position(&self) -> DVec3 {
        self.world_position
    }
}

/// Result of one visibility update
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LabelPlacement {
    Hidden,
    Visible { x: f64, y: f64, z_order: i32 },
}

impl LabelPlacement {
    pub fn is_visible(&self) -> bool {
        matches!(self, LabelPlacement::Visible { .. })
    }

    /// Write this placement to a label. Hidden labels keep their last position.
    pub fn apply_to<H: LabelHandle + ?Sized>(&self, handle: &mut H) {
        match *self {
            LabelPlacement::Hidden => handle.set_visible(false),
            LabelPlacement::Visible { x, y, z_order } => {
                handle.set_visible(true);
                handle.set_position(x, y);
                handle.set_z_order(z_order);
            }
        }
    }
}

/// Camera-derived matrices for one frame. Rebuilt from the live camera each
/// frame, never carried over.
#[derive(Clone, Debug)]
pub struct FrameState {
    pub camera_position: DVec3,
    /// Camera inverse world matrix
    pub view: DMat4,
    /// Inverse transpose of the view matrix's upper 3x3
    pub normal_matrix: DMat3,
    pub view_projection: DMat4,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl FrameState {
    pub fn from_camera(camera: &PerspectiveCamera, viewport_width: f64, viewport_height: f64) -> Self {
        let view = camera.view_matrix();
        Self {
            camera_position: camera.world_position(),
            view,
            normal_matrix: DMat3::from_mat4(view).inverse().transpose(),
            view_projection: camera.projection_matrix() * view,
            viewport_width,
            viewport_height,
        }
    }
}

/// Places geographic locations on the globe and decides, per frame, which
/// labels are shown and where.
#[derive(Debug, Default)]
pub struct GeoProjector {
    /// Per-frame placements, reused across frames
    placements: Vec<LabelPlacement>,
}

impl GeoProjector {
    /// Longitude calibration (radians). Aligns longitude 0° with the +Z
    /// axis that faces the default camera. Depends on how the globe surface
    /// is drawn; recalibrate here if the surface orientation changes.
    pub const LON_OFFSET: f64 = PI;
    /// Latitude calibration (radians). Puts the equator on the XZ plane with
    /// the north pole at +Y. Surface-dependent like `LON_OFFSET`.
    pub const LAT_OFFSET: f64 = PI;

    /// Below this many locations the update runs on the calling thread
    const PARALLEL_THRESHOLD: usize = 512;

    pub fn new() -> Self {
        Self::default()
    }

    /// World-space anchor of a lat/lon (degrees) on the unit globe.
    /// Any finite input is accepted; out-of-range angles simply wrap.
    pub fn anchor(latitude: f64, longitude: f64) -> DVec3 {
        let lon = DQuat::from_rotation_y(longitude.to_radians() + Self::LON_OFFSET);
        let lat = DQuat::from_rotation_x(latitude.to_radians() + Self::LAT_OFFSET);
        lon * (lat * DVec3::Z)
    }

    /// Decide whether a location's label is shown this frame and where.
    pub fn update_visibility(
        location: &Location,
        frame: &FrameState,
        settings: &LabelSettings,
    ) -> LabelPlacement {
        if location.area < settings.area_threshold() {
            return LabelPlacement::Hidden;
        }

        let position = location.world_position();

        // Back-face test in camera space
        let normal = frame.normal_matrix * position;
        let Some(camera_to_point) = frame.view.transform_point3(position).try_normalize() else {
            return LabelPlacement::Hidden;
        };
        let dot = normal.dot(camera_to_point);
        if !dot.is_finite() || dot > settings.max_visible_dot {
            return LabelPlacement::Hidden;
        }

        let ndc = frame.view_projection.project_point3(position);
        if !ndc.is_finite() {
            return LabelPlacement::Hidden;
        }
        let (x, y) = ndc_to_screen(ndc, frame.viewport_width, frame.viewport_height);

        LabelPlacement::Visible {
            x,
            y,
            z_order: stacking_order(ndc.z),
        }
    }

    /// Update every location's label. Returns the number of visible labels.
    /// Labels whose index is out of range are skipped.
    pub fn update_all<H: LabelHandle>(
        &mut self,
        locations: &[Location],
        frame: &FrameState,
        settings: &LabelSettings,
        labels: &mut [H],
    ) -> usize {
        self.placements.clear();
        if locations.len() >= Self::PARALLEL_THRESHOLD {
            locations
                .par_iter()
                .map(|loc| Self::update_visibility(loc, frame, settings))
                .collect_into_vec(&mut self.placements);
        } else {
            self.placements.extend(
                locations
                    .iter()
                    .map(|loc| Self::update_visibility(loc, frame, settings)),
            );
        }

        let mut visible = 0;
        for (loc, placement) in locations.iter().zip(&self.placements) {
            if let Some(label) = labels.get_mut(loc.label) {
                placement.apply_to(label);
                if placement.is_visible() {
                    visible += 1;
                }
            }
        }
        visible
    }
}

/// Map NDC x/y in [-1, 1] to surface pixels. Screen Y grows downward.
#[inline]
pub fn ndc_to_screen(ndc: DVec3, width: f64, height: f64) -> (f64, f64) {
    let x = (ndc.x * 0.5 + 0.5) * width;
    let y = (ndc.y * -0.5 + 0.5) * height;
    (x, y)
}

/// Stacking order from NDC depth: nearer points get higher values.
#[inline]
pub fn stacking_order(ndc_z: f64) -> i32 {
    ((-ndc_z * 0.5 + 0.5) * 100_000.0).floor() as i32
}
