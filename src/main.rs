use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use leafview::event_source::KeyboardEventSource;
use leafview::panic_handler;
use leafview::pdf::RenderService;
use leafview::settings::{Settings, load_settings};
use leafview::viewer::ViewerController;
use leafview::{App, run_app_with_event_source};

#[derive(Parser, Debug)]
#[command(name = "leafview", version, about = "A terminal PDF viewer")]
struct Args {
    /// Document to open (defaults to the configured document)
    file: Option<String>,

    /// Initial zoom factor (1.0 = 100%)
    #[arg(long)]
    scale: Option<f32>,

    /// Fit the first page to the window width once loaded
    #[arg(long)]
    fit_width: bool,

    /// Settings file to use instead of the user config
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "PATH", default_value = "leafview.log")]
    log_file: PathBuf,

    /// Log at debug level
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    WriteLogger::init(level, Config::default(), File::create(&args.log_file)?)?;

    info!("Starting leafview");

    let settings = load_settings(args.config.as_deref());
    let reference = args
        .file
        .clone()
        .unwrap_or_else(|| settings.document_or_fallback().to_string());

    let service = spawn_render_service()?;
    let mut viewer = ViewerController::new(service, viewer_config(&settings, &args));
    viewer.open(&reference);
    let mut app = App::new(viewer);

    panic_handler::initialize_panic_handler();

    // Terminal initialization
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app_with_event_source(&mut terminal, &mut app, &mut KeyboardEventSource);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down leafview");
    Ok(())
}

fn viewer_config(settings: &Settings, args: &Args) -> leafview::viewer::ViewerConfig {
    let mut config = settings.viewer_config();
    if let Some(scale) = args.scale {
        config.initial_scale = scale;
    }
    if args.fit_width {
        config.fit_width_on_load = true;
    }
    config
}

#[cfg(feature = "pdf")]
fn spawn_render_service() -> Result<RenderService> {
    Ok(RenderService::spawn(|| leafview::pdf::MupdfEngine))
}

#[cfg(not(feature = "pdf"))]
fn spawn_render_service() -> Result<RenderService> {
    anyhow::bail!("leafview was built without the `pdf` feature; no rendering engine is available")
}
