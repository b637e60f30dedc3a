use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use risk_map::app::App;
use risk_map::config::{Args, Config};
use risk_map::data;
use risk_map::map::{Basemap, MapSurface};
use risk_map::overlay::{LoadingGate, LoggingDialer};
use risk_map::ui;

/// Zoom levels per scroll notch
const SCROLL_ZOOM: f64 = 0.5;

fn main() -> Result<()> {
    let config = Config::try_from(Args::parse())?;
    init_tracing(&config)?;

    // Bad data is reported before the terminal is taken over
    let dataset = match &config.data {
        Some(path) => data::load_dataset(path)?,
        None => {
            info!("no data file configured, using built-in sample");
            data::sample_dataset()?
        }
    };
    let surface = MapSurface::new(Arc::new(dataset), config.home);

    let gate = Arc::new(LoadingGate::new());
    let loader = spawn_basemap_loader(config.basemap_dir.clone(), Arc::clone(&gate));

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, surface, gate, loader);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        error!(error = %e, "exiting with error");
    }
    result
}

fn init_tracing(config: &Config) -> Result<()> {
    let file = File::create(&config.log_file)
        .with_context(|| format!("creating log file {}", config.log_file.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Load the basemap off the UI thread and open the gate when done
fn spawn_basemap_loader(dir: PathBuf, gate: Arc<LoadingGate>) -> JoinHandle<Basemap> {
    thread::spawn(move || {
        let mut basemap = Basemap::new();
        if dir.exists() {
            if let Err(e) = data::load_basemap(&mut basemap, &dir) {
                error!(dir = %dir.display(), error = %e, "basemap load failed");
            }
        }
        if !basemap.has_data() {
            info!("no basemap data found, using coarse outlines");
            data::generate_simple_world(&mut basemap);
        }
        gate.open();
        basemap
    })
}

/// Handle mouse events for panning, zooming and clicking
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_at(mouse.column, mouse.row, SCROLL_ZOOM),
        MouseEventKind::ScrollDown => app.zoom_at(mouse.column, mouse.row, -SCROLL_ZOOM),
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => app.mouse_down(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.release(mouse.column, mouse.row),
        _ => {}
    }
}

fn handle_key(app: &mut App, code: KeyCode) {
    if app.contacts.is_open() {
        match code {
            KeyCode::Esc | KeyCode::Char('e') => app.close_contacts(),
            KeyCode::Char(c @ '1'..='9') => app.dial(c as usize - '1' as usize),
            KeyCode::Char('q') => app.quit(),
            _ => {}
        }
        return;
    }

    match code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc | KeyCode::Char('x') => app.dismiss(),
        KeyCode::Char('e') => app.open_contacts(),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-20, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(20, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -12),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 12),

        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),
        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),
        _ => {}
    }
}

fn run(
    terminal: &mut DefaultTerminal,
    surface: MapSurface,
    gate: Arc<LoadingGate>,
    loader: JoinHandle<Basemap>,
) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(
        surface,
        Basemap::new(),
        Box::new(LoggingDialer::default()),
        Arc::clone(&gate),
        size.width,
        size.height,
    );
    let mut loader = Some(loader);

    loop {
        if gate.is_ready() {
            if let Some(handle) = loader.take() {
                app.basemap = handle
                    .join()
                    .map_err(|_| anyhow::anyhow!("basemap loader panicked"))?;
                info!("map ready");
            }
        }

        terminal.draw(|frame| ui::render(frame, &app))?;

        // ~60fps
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut app, key.code),
                Event::Mouse(mouse) if gate.is_ready() => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
