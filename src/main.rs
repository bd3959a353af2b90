use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use globe_labels::app::App;
use globe_labels::config::{Args, CameraConfig};
use globe_labels::data;
use log::{info, warn};
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Poll interval while frames are pending (~60fps)
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Poll interval with nothing to draw and no load in flight
const IDLE_INTERVAL: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    info!("starting with {args:?}");

    let mut app = App::new(args.label_settings(), CameraConfig::default());

    if args.coastlines.exists() {
        match data::load_coastlines(&mut app.surface, &args.coastlines) {
            Ok(count) => info!("loaded {count} coastline segments"),
            Err(e) => warn!("{e}"),
        }
    }
    app.set_pending_load(data::spawn_location_load(args.data.clone()));

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &mut app);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Route logs to a file; the terminal belongs to the UI
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(())
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        // A finished load requests its own frame
        app.poll_load();
        if app.scheduler.is_pending() {
            terminal.draw(|frame| app.render_frame(frame))?;
        }
        if app.should_quit {
            return Ok(());
        }

        let timeout = if app.scheduler.is_pending() || app.is_loading() {
            FRAME_INTERVAL
        } else {
            IDLE_INTERVAL
        };
        if event::poll(timeout)? {
            handle_event(app, event::read()?);
            // Fold everything already queued into the next frame
            while event::poll(Duration::ZERO)? {
                handle_event(app, event::read()?);
            }
        }
    }
}

fn handle_event(app: &mut App, event: Event) {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => app.quit(),

            // Orbit with hjkl or arrow keys
            KeyCode::Left | KeyCode::Char('h') => app.orbit(1.0, 0.0),
            KeyCode::Right | KeyCode::Char('l') => app.orbit(-1.0, 0.0),
            KeyCode::Up | KeyCode::Char('k') => app.orbit(0.0, 1.0),
            KeyCode::Down | KeyCode::Char('j') => app.orbit(0.0, -1.0),

            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

            KeyCode::Char('L') => app.toggle_labels(),
            KeyCode::Char('r') | KeyCode::Char('0') => app.reset_camera(),
            _ => {}
        },
        Event::Mouse(mouse) => handle_mouse(app, mouse),
        Event::Resize(width, height) => {
            info!("terminal resized to {width}x{height}");
            app.on_resize();
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in(),
        MouseEventKind::ScrollDown => app.zoom_out(),
        MouseEventKind::Down(MouseButton::Left) => app.begin_drag(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.drag_to(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => {
            if let Some(url) = app.end_drag(mouse.column, mouse.row) {
                if let Err(e) = open_link(&url) {
                    warn!("failed to open {url}: {e}");
                }
            }
        }
        _ => {}
    }
}

/// Open a link with the platform's default handler, without waiting for it
fn open_link(url: &str) -> std::io::Result<()> {
    info!("opening {url}");
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };
    command
        .arg(url)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map(|_| ())
}
