use glam::DVec3;
use std::f64::consts::TAU;

use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_dot, draw_polyline};
use crate::map::projector::{ndc_to_screen, FrameState, GeoProjector};

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Spacing of graticule lines in degrees
const GRATICULE_STEP: f64 = 30.0;

/// Sampling step along graticule lines in degrees
const SAMPLE_STEP: f64 = 2.0;

/// Points sampled around the silhouette
const OUTLINE_SAMPLES: usize = 128;

/// Wireframe globe surface: silhouette, graticule and coastlines.
/// Drawn with the same anchoring as labels so both stay aligned.
#[derive(Default)]
pub struct GlobeSurface {
    coastlines: Vec<LineString>,
    pub show_graticule: bool,
}

impl GlobeSurface {
    pub fn new() -> Self {
        Self {
            coastlines: Vec::new(),
            show_graticule: true,
        }
    }

    pub fn add_coastline(&mut self, line: LineString) {
        if line.len() >= 2 {
            self.coastlines.push(line);
        }
    }

    pub fn coastline_count(&self) -> usize {
        self.coastlines.len()
    }

    /// Rasterize the globe as seen from this frame's camera
    pub fn draw(&self, canvas: &mut BrailleCanvas, frame: &FrameState) {
        draw_outline(canvas, frame);

        if self.show_graticule {
            self.draw_graticule(canvas, frame);
        }

        for line in &self.coastlines {
            let mut points = Vec::with_capacity(line.len() * 2);
            points.push(project_surface(GeoProjector::anchor(line[0].1, line[0].0), frame));
            for pair in line.windows(2) {
                let (lon0, lat0) = pair[0];
                let (lon1, lat1) = pair[1];
                walk_great_circle(
                    GeoProjector::anchor(lat0, lon0),
                    GeoProjector::anchor(lat1, lon1),
                    |p| points.push(project_surface(p, frame)),
                );
            }
            draw_polyline(canvas, points);
        }
    }

    fn draw_graticule(&self, canvas: &mut BrailleCanvas, frame: &FrameState) {
        let samples = |from: f64, to: f64| {
            let n = ((to - from) / SAMPLE_STEP).round() as usize;
            (0..=n).map(move |i| from + i as f64 * SAMPLE_STEP)
        };

        // Meridians
        let mut lon = -180.0;
        while lon < 180.0 {
            draw_polyline(
                canvas,
                samples(-90.0, 90.0).map(|lat| project_surface(GeoProjector::anchor(lat, lon), frame)),
            );
            lon += GRATICULE_STEP;
        }

        // Parallels, skipping the poles
        let mut lat = -90.0 + GRATICULE_STEP;
        while lat < 90.0 {
            draw_polyline(
                canvas,
                samples(-180.0, 180.0).map(|lon| project_surface(GeoProjector::anchor(lat, lon), frame)),
            );
            lat += GRATICULE_STEP;
        }
    }
}

/// Draw the globe's silhouette: the circle where sight lines graze the sphere.
fn draw_outline(canvas: &mut BrailleCanvas, frame: &FrameState) {
    let eye = frame.camera_position;
    let distance = eye.length();
    // Inside or on the sphere there is no silhouette
    if distance <= 1.0 + 1e-9 {
        return;
    }

    let axis = eye / distance;
    let center = axis / distance;
    let radius = (1.0 - 1.0 / (distance * distance)).sqrt();
    let (u, v) = axis.any_orthonormal_pair();

    let points = (0..=OUTLINE_SAMPLES).map(|i| {
        let angle = i as f64 / OUTLINE_SAMPLES as f64 * TAU;
        let (sin_a, cos_a) = angle.sin_cos();
        project_point(center + (u * cos_a + v * sin_a) * radius, frame)
    });
    draw_polyline(canvas, points);
}

/// Mark a label's anchor on the surface
pub fn draw_anchor(canvas: &mut BrailleCanvas, x: f64, y: f64) {
    draw_dot(canvas, x.round() as i32, y.round() as i32, 1);
}

/// Project a point on the unit sphere, culling the far hemisphere.
#[inline]
fn project_surface(p: DVec3, frame: &FrameState) -> Option<(i32, i32)> {
    // Front-facing when the camera lies above the tangent plane at p
    if p.dot(frame.camera_position) <= 1.0 {
        return None;
    }
    project_point(p, frame)
}

#[inline]
fn project_point(p: DVec3, frame: &FrameState) -> Option<(i32, i32)> {
    let ndc = frame.view_projection.project_point3(p);
    if !ndc.is_finite() || ndc.z.abs() > 1.0 {
        return None;
    }
    let (x, y) = ndc_to_screen(ndc, frame.viewport_width, frame.viewport_height);
    Some((x.round() as i32, y.round() as i32))
}

/// Interpolate along the great circle between two unit vectors, calling
/// `visitor` for each subdivision point after `a` (ending at `b`).
/// Subdivides into ~2° segments for smooth curves at Braille resolution.
#[inline]
pub fn walk_great_circle(a: DVec3, b: DVec3, mut visitor: impl FnMut(DVec3)) {
    let angle = a.dot(b).clamp(-1.0, 1.0).acos();
    let steps = ((angle.to_degrees() / SAMPLE_STEP).ceil() as usize).max(1);

    let sin_angle = angle.sin();
    if steps == 1 || sin_angle.abs() < 1e-10 {
        // Short, identical or antipodal: no well-defined arc
        visitor(b);
        return;
    }

    for i in 1..=steps {
        let t = i as f64 / steps as f64;
        let sa = ((1.0 - t) * angle).sin() / sin_angle;
        let sb = (t * angle).sin() / sin_angle;
        visitor(a * sa + b * sb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::map::camera::PerspectiveCamera;

    fn frame(cols: usize, rows: usize) -> FrameState {
        let (w, h) = ((cols * 2) as f64, (rows * 4) as f64);
        let camera = PerspectiveCamera::new(&CameraConfig::default(), w / h);
        FrameState::from_camera(&camera, w, h)
    }

    fn lit_cells(canvas: &BrailleCanvas) -> usize {
        canvas.to_string().chars().filter(|&c| c != '\u{2800}' && c != '\n').count()
    }

    #[test]
    fn test_outline_drawn_around_center() {
        let mut canvas = BrailleCanvas::new(40, 20);
        draw_outline(&mut canvas, &frame(40, 20));
        assert!(lit_cells(&canvas) > 0);
        // The center of the disk stays empty
        assert_eq!(canvas.char_at(20, 10), '\u{2800}');
    }

    #[test]
    fn test_far_side_culled() {
        let f = frame(40, 20);
        assert!(project_surface(DVec3::Z, &f).is_some());
        assert!(project_surface(DVec3::NEG_Z, &f).is_none());
        assert!(project_surface(DVec3::X, &f).is_none());
    }

    #[test]
    fn test_surface_draws_coastline() {
        let f = frame(40, 20);
        let mut surface = GlobeSurface::new();
        surface.show_graticule = false;
        surface.add_coastline(vec![(-20.0, 0.0), (20.0, 0.0)]);
        surface.add_coastline(vec![(0.0, 0.0)]);
        assert_eq!(surface.coastline_count(), 1);

        let mut canvas = BrailleCanvas::new(40, 20);
        surface.draw(&mut canvas, &f);
        // Equator segment crosses the screen center row
        assert_ne!(canvas.row_to_string(10).replace('\u{2800}', ""), "");
    }

    #[test]
    fn test_great_circle_ends_at_target() {
        let a = GeoProjector::anchor(0.0, 0.0);
        let b = GeoProjector::anchor(0.0, 90.0);
        let mut points = Vec::new();
        walk_great_circle(a, b, |p| points.push(p));

        assert_eq!(points.len(), 45);
        assert!((points[points.len() - 1] - b).length() < 1e-9);
        for p in &points {
            assert!((p.length() - 1.0).abs() < 1e-9);
        }
    }
}
