use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use disaster_map::app::{
    compute_view, initial_params, unknown_scenario, unmapped_subregions, App,
};
use disaster_map::config::Args;
use disaster_map::data::{Dataset, GeometryStore};
use disaster_map::query::QueryParams;
use disaster_map::ui;

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;

    let options = args.csv_options()?;
    let dataset = Dataset::load(&args.data, &options)
        .with_context(|| format!("loading dataset {}", args.data.display()))?;
    let geometry = GeometryStore::load(&args.geometry)
        .with_context(|| format!("loading boundaries {}", args.geometry.display()))?;
    tracing::info!(
        records = dataset.len(),
        regions = geometry.len(),
        bounds = ?geometry.bounds(),
        "stores loaded"
    );

    let params = initial_params(
        &dataset,
        args.decade_range()?,
        args.disaster.as_deref(),
        args.impact.into(),
        args.scenario_filter(),
    );

    if let Some(code) = unknown_scenario(&dataset, params.scenario) {
        tracing::warn!(
            scenario = code,
            available = ?dataset.scenarios(),
            "no record carries the selected scenario; every selection will be empty"
        );
    }
    let unmapped = unmapped_subregions(&dataset, &geometry);
    if !unmapped.is_empty() {
        tracing::warn!(?unmapped, "sub-regions without a boundary will not be drawn");
    }

    if args.print {
        print_view(&dataset, &geometry, &params);
        return Ok(());
    }

    let mut terminal = ratatui::init();
    let result = terminal
        .clear()
        .and_then(|()| execute!(io::stdout(), EnableMouseCapture))
        .map_err(anyhow::Error::from)
        .and_then(|()| run(&mut terminal, &dataset, &geometry, params));

    let _ = execute!(io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// The TUI owns the terminal, so logs go to a file or nowhere
fn init_tracing(args: &Args) -> Result<()> {
    let writer = match (&args.log_file, args.print) {
        (Some(path), _) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        (None, true) => BoxMakeWriter::new(io::stderr),
        (None, false) => BoxMakeWriter::new(io::sink),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(())
}

fn print_view(dataset: &Dataset, geometry: &GeometryStore, params: &QueryParams) {
    let view = compute_view(dataset, geometry, params);
    println!("{}", view.caption);
    println!(
        "{} | {} impact ({}) | {} | {} records",
        params.disaster_type,
        params.metric.label(),
        view.descriptor.color_scale.name(),
        params.scenario,
        view.matched_records
    );
    if view.descriptor.is_empty() {
        println!("No data for this selection");
    }
    for rendered in &view.descriptor.regions {
        println!("{}\t{}", rendered.label, rendered.value);
    }
    for warning in &view.descriptor.warnings {
        eprintln!("warning: {warning}");
    }
}

/// Handle mouse events for panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for hover readout
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
}

fn run(
    terminal: &mut DefaultTerminal,
    dataset: &Dataset,
    geometry: &GeometryStore,
    params: QueryParams,
) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(dataset, geometry, params, size.width as usize, size.height as usize);

    loop {
        terminal.draw(|frame| ui::render(frame, &mut app))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                    // Pan with hjkl or arrow keys
                    KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                    KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                    KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                    KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                    KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                    // Decade range
                    KeyCode::Char('[') => {
                        app.move_range_start(-1);
                    }
                    KeyCode::Char(']') => {
                        app.move_range_start(1);
                    }
                    KeyCode::Char('{') => {
                        app.move_range_end(-1);
                    }
                    KeyCode::Char('}') => {
                        app.move_range_end(1);
                    }
                    KeyCode::Char('<') | KeyCode::Char(',') => {
                        app.shift_range(-1);
                    }
                    KeyCode::Char('>') | KeyCode::Char('.') => {
                        app.shift_range(1);
                    }

                    KeyCode::Tab | KeyCode::Char('d') => {
                        app.cycle_disaster(true);
                    }
                    KeyCode::BackTab | KeyCode::Char('D') => {
                        app.cycle_disaster(false);
                    }
                    KeyCode::Char('i') | KeyCode::Char('I') => {
                        app.toggle_metric();
                    }

                    KeyCode::Char('L') => app.map_renderer.toggle_labels(),
                    KeyCode::Char('o') | KeyCode::Char('O') => {
                        app.map_renderer.toggle_outlines();
                    }
                    KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

                    _ => {}
                },
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                // The next draw resizes the viewport to the new map area
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
