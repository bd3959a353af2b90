use log::{debug, error, info};
use ratatui::Frame;
use std::sync::mpsc::TryRecvError;

use crate::braille::BrailleCanvas;
use crate::config::{CameraConfig, LabelSettings};
use crate::data::{LoadError, LocationRecord, PendingLocations};
use crate::labels::LabelLayer;
use crate::map::{draw_anchor, FrameState, GeoProjector, GlobeSurface, Location, OrbitControls, PerspectiveCamera};
use crate::scheduler::RenderScheduler;
use crate::ui::{self, LabelStatus, UiLayout};

/// Orbit step for one key press (radians)
const ROTATE_STEP: f64 = 0.15;

/// Dolly factor for one zoom step
const DOLLY_SCALE: f64 = 1.0 / 0.95;

/// Progress of the location dataset
enum LoadState {
    NotRequested,
    Pending(PendingLocations),
    Loaded,
    Failed,
}

/// Application state
pub struct App {
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    camera_config: CameraConfig,
    pub settings: LabelSettings,
    pub projector: GeoProjector,
    /// `None` until the dataset finishes loading
    pub locations: Option<Vec<Location>>,
    pub labels: LabelLayer,
    pub surface: GlobeSurface,
    pub canvas: BrailleCanvas,
    pub scheduler: RenderScheduler,
    /// Status bar message (last opened link, load failure)
    pub message: Option<String>,
    pub should_quit: bool,
    load: LoadState,
    /// Layout of the last rendered frame, for mouse hit-testing
    layout: UiLayout,
    last_mouse: Option<(u16, u16)>,
    drag_moved: bool,
}

impl App {
    pub fn new(settings: LabelSettings, camera_config: CameraConfig) -> Self {
        // Aspect is corrected on the first frame once the surface size is known
        let camera = PerspectiveCamera::new(&camera_config, 2.0);
        let controls = OrbitControls::new(&camera_config, &camera);

        let mut scheduler = RenderScheduler::new();
        scheduler.request_render();

        Self {
            camera,
            controls,
            camera_config,
            settings,
            projector: GeoProjector::new(),
            locations: None,
            labels: LabelLayer::default(),
            surface: GlobeSurface::new(),
            canvas: BrailleCanvas::new(0, 0),
            scheduler,
            message: None,
            should_quit: false,
            load: LoadState::NotRequested,
            layout: UiLayout::default(),
            last_mouse: None,
            drag_moved: false,
        }
    }

    /// Track a background dataset load
    pub fn set_pending_load(&mut self, pending: PendingLocations) {
        self.load = LoadState::Pending(pending);
    }

    /// Check the background load without blocking. Returns true once it
    /// completes (successfully or not).
    pub fn poll_load(&mut self) -> bool {
        let LoadState::Pending(rx) = &self.load else {
            return false;
        };
        match rx.try_recv() {
            Ok(Ok(records)) => {
                self.install_locations(records);
                true
            }
            Ok(Err(err)) => {
                self.fail_load(&err);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                error!("location loader exited without a result");
                self.load = LoadState::Failed;
                true
            }
        }
    }

    /// Background load still in flight
    pub fn is_loading(&self) -> bool {
        matches!(self.load, LoadState::Pending(_))
    }

    /// Anchor every record on the globe and create its label
    pub fn install_locations(&mut self, records: Vec<LocationRecord>) {
        let locations: Vec<Location> = records
            .iter()
            .enumerate()
            .map(|(i, r)| Location::new(r.latitude, r.longitude, r.area, i))
            .collect();
        info!("loaded {} locations", locations.len());

        self.labels = LabelLayer::from_records(&records);
        self.locations = Some(locations);
        self.load = LoadState::Loaded;
        self.scheduler.request_render();
    }

    fn fail_load(&mut self, err: &LoadError) {
        error!("location load failed: {err}");
        self.message = Some("location data unavailable".to_string());
        self.load = LoadState::Failed;
    }

    pub fn label_status(&self) -> LabelStatus {
        match (&self.locations, &self.load) {
            (Some(_), _) if !self.labels.show => LabelStatus::Hidden,
            (Some(locations), _) => LabelStatus::Shown {
                visible: self.labels.visible_count(),
                total: locations.len(),
            },
            (None, LoadState::Failed) => LabelStatus::Unavailable,
            (None, _) => LabelStatus::Loading,
        }
    }

    pub fn camera_distance(&self) -> f64 {
        self.camera.position.distance(self.controls.target)
    }

    /// Orbit by whole key steps
    pub fn orbit(&mut self, left: f64, up: f64) {
        self.controls.rotate_left(left * ROTATE_STEP);
        self.controls.rotate_up(up * ROTATE_STEP);
        self.scheduler.request_render();
    }

    pub fn zoom_in(&mut self) {
        self.controls.dolly_in(DOLLY_SCALE);
        self.scheduler.request_render();
    }

    pub fn zoom_out(&mut self) {
        self.controls.dolly_out(DOLLY_SCALE);
        self.scheduler.request_render();
    }

    pub fn toggle_labels(&mut self) {
        self.labels.toggle();
        self.scheduler.request_render();
    }

    /// Back to the initial camera
    pub fn reset_camera(&mut self) {
        self.camera = PerspectiveCamera::new(&self.camera_config, self.camera.aspect);
        self.controls = OrbitControls::new(&self.camera_config, &self.camera);
        self.scheduler.request_render();
    }

    /// Terminal was resized
    pub fn on_resize(&mut self) {
        self.scheduler.request_render();
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn begin_drag(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.drag_moved = false;
    }

    pub fn drag_to(&mut self, col: u16, row: u16) {
        let Some((last_col, last_row)) = self.last_mouse else {
            return;
        };
        if (col, row) == (last_col, last_row) {
            return;
        }
        // Each terminal cell is 2 braille pixels wide, 4 tall
        let dx = (col as f64 - last_col as f64) * 2.0;
        let dy = (row as f64 - last_row as f64) * 4.0;
        self.controls.drag(dx, dy, self.canvas.pixel_size().1 as f64);
        self.last_mouse = Some((col, row));
        self.drag_moved = true;
        self.scheduler.request_render();
    }

    /// Finish a press. A press released without dragging is a click; if it
    /// lands on a label, that label's link is returned.
    pub fn end_drag(&mut self, col: u16, row: u16) -> Option<String> {
        let was_click = self.last_mouse.is_some() && !self.drag_moved;
        self.last_mouse = None;
        self.drag_moved = false;
        if was_click {
            self.click(col, row)
        } else {
            None
        }
    }

    fn click(&mut self, col: u16, row: u16) -> Option<String> {
        let area = self.layout.globe;
        if col < area.x || row < area.y || col >= area.x + area.width || row >= area.y + area.height {
            return None;
        }
        let label = self.labels.hit_test(col - area.x, row - area.y, area)?;
        let url = label.url.clone();
        debug!("label '{}' clicked", label.name);
        self.message = Some(url.clone());
        self.scheduler.request_render();
        Some(url)
    }

    /// Run one frame if a render is pending: resize, step controls, update
    /// labels, draw.
    pub fn render_frame(&mut self, frame: &mut Frame) {
        if !self.scheduler.begin_frame() {
            return;
        }

        let layout = ui::layout(frame.area());
        self.layout = layout;

        let (cols, rows) = (layout.globe.width as usize, layout.globe.height as usize);
        if self.canvas.resize(cols, rows) {
            let (width, height) = self.canvas.pixel_size();
            if width > 0 && height > 0 {
                self.camera.set_aspect(width as f64 / height as f64);
            }
            debug!("globe surface resized to {cols}x{rows} cells");
        }

        // Damped controls keep moving after input stops; keep frames coming
        if self.controls.update(&mut self.camera) {
            self.scheduler.request_render();
        }

        let (width, height) = self.canvas.pixel_size();
        let frame_state = FrameState::from_camera(&self.camera, width as f64, height as f64);

        if let Some(locations) = &self.locations {
            if self.labels.show {
                self.projector.update_all(
                    locations,
                    &frame_state,
                    &self.settings,
                    &mut self.labels.elements,
                );
            }
        }

        self.surface.draw(&mut self.canvas, &frame_state);
        for label in self.labels.draw_order() {
            draw_anchor(&mut self.canvas, label.x, label.y);
        }

        ui::render(frame, self, &layout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::path::PathBuf;
    use std::sync::mpsc;

    fn terminal() -> Terminal<TestBackend> {
        Terminal::new(TestBackend::new(80, 24)).unwrap()
    }

    fn app() -> App {
        App::new(LabelSettings::default(), CameraConfig::default())
    }

    fn record(name: &str, latitude: f64, longitude: f64, area: f64) -> LocationRecord {
        LocationRecord {
            latitude,
            longitude,
            name: name.to_string(),
            url: format!("https://example.com/{}", name.to_lowercase()),
            area,
        }
    }

    fn screen_cells(terminal: &Terminal<TestBackend>, y: u16) -> Vec<String> {
        let buf = terminal.backend().buffer();
        (0..buf.area.width).map(|x| buf[(x, y)].symbol().to_string()).collect()
    }

    #[test]
    fn test_first_frame_then_idle() {
        let mut terminal = terminal();
        let mut app = app();
        assert!(app.scheduler.is_pending());

        terminal.draw(|f| app.render_frame(f)).unwrap();
        assert_eq!(app.scheduler.frames_rendered(), 1);
        assert!(!app.scheduler.is_pending());
        assert_eq!(app.canvas.size(), (78, 21));
        assert!((app.camera.aspect - 156.0 / 84.0).abs() < 1e-9);
        assert_eq!(app.label_status(), LabelStatus::Loading);
    }

    #[test]
    fn test_triggers_coalesce_into_one_frame() {
        let mut terminal = terminal();
        let mut app = app();
        terminal.draw(|f| app.render_frame(f)).unwrap();

        for _ in 0..5 {
            app.on_resize();
        }
        while app.scheduler.is_pending() {
            terminal.draw(|f| app.render_frame(f)).unwrap();
        }
        assert_eq!(app.scheduler.frames_rendered(), 2);
    }

    #[test]
    fn test_damping_keeps_rendering_until_settled() {
        let mut terminal = terminal();
        let mut app = app();
        terminal.draw(|f| app.render_frame(f)).unwrap();

        app.orbit(1.0, 0.0);
        let mut frames = 0;
        while app.scheduler.is_pending() {
            terminal.draw(|f| app.render_frame(f)).unwrap();
            frames += 1;
            assert!(frames < 10_000);
        }
        assert!(frames > 1);
        // Camera swung left of its start on the +Z axis
        assert!(app.camera.position.x < -0.1);
    }

    #[test]
    fn test_loaded_label_drawn_at_center() {
        let mut terminal = terminal();
        let mut app = app();
        terminal.draw(|f| app.render_frame(f)).unwrap();

        app.install_locations(vec![
            record("Origin", 0.0, 0.0, 1000.0),
            record("Antipode", 0.0, 180.0, 1000.0),
            record("Tiny", 10.0, 10.0, 10.0),
        ]);
        assert!(app.scheduler.is_pending());
        terminal.draw(|f| app.render_frame(f)).unwrap();

        assert!(app.labels.elements[0].visible);
        assert!(!app.labels.elements[1].visible);
        assert!(!app.labels.elements[2].visible);
        assert_eq!(app.label_status(), LabelStatus::Shown { visible: 1, total: 3 });

        // Globe area starts at (1, 1); label centered on cell (39, 10)
        let row = screen_cells(&terminal, 11);
        assert_eq!(row[37..43].concat(), "Origin");
    }

    #[test]
    fn test_click_on_label_returns_link() {
        let mut terminal = terminal();
        let mut app = app();
        app.install_locations(vec![record("Origin", 0.0, 0.0, 1000.0)]);
        terminal.draw(|f| app.render_frame(f)).unwrap();

        app.begin_drag(39, 11);
        assert_eq!(app.end_drag(39, 11).as_deref(), Some("https://example.com/origin"));
        assert_eq!(app.message.as_deref(), Some("https://example.com/origin"));

        // Empty space
        app.begin_drag(5, 5);
        assert_eq!(app.end_drag(5, 5), None);

        // A drag is not a click
        app.begin_drag(39, 11);
        app.drag_to(45, 11);
        assert_eq!(app.end_drag(45, 11), None);
    }

    #[test]
    fn test_hidden_labels_not_drawn() {
        let mut terminal = terminal();
        let mut app = app();
        app.install_locations(vec![record("Origin", 0.0, 0.0, 1000.0)]);
        app.toggle_labels();
        terminal.draw(|f| app.render_frame(f)).unwrap();

        assert_eq!(app.label_status(), LabelStatus::Hidden);
        assert!(!screen_cells(&terminal, 11).concat().contains("Origin"));
    }

    #[test]
    fn test_poll_load_installs_locations() {
        let mut app = app();
        let (tx, rx) = mpsc::channel();
        app.set_pending_load(rx);
        assert!(!app.poll_load());
        assert!(app.is_loading());

        tx.send(Ok(vec![record("Origin", 0.0, 0.0, 1000.0)])).unwrap();
        assert!(app.poll_load());
        assert!(!app.is_loading());
        assert_eq!(app.locations.as_ref().map(Vec::len), Some(1));
        assert!(app.scheduler.is_pending());
        assert!(!app.poll_load());
    }

    #[test]
    fn test_failed_load_leaves_globe_without_labels() {
        let mut terminal = terminal();
        let mut app = app();
        let (tx, rx) = mpsc::channel();
        app.set_pending_load(rx);
        tx.send(Err(LoadError::Io {
            path: PathBuf::from("data/locations.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }))
        .unwrap();

        assert!(app.poll_load());
        assert_eq!(app.label_status(), LabelStatus::Unavailable);
        assert!(app.locations.is_none());

        terminal.draw(|f| app.render_frame(f)).unwrap();
        assert_eq!(app.scheduler.frames_rendered(), 1);
    }

    #[test]
    fn test_reset_camera_restores_distance() {
        let mut terminal = terminal();
        let mut app = app();
        app.zoom_in();
        terminal.draw(|f| app.render_frame(f)).unwrap();
        assert!(app.camera_distance() < 2.5);

        app.reset_camera();
        assert!((app.camera_distance() - 2.5).abs() < 1e-9);
    }
}
