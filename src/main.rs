use std::{
    fs::File,
    io::{Stdout, stdout},
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, WriteLogger};

use roundview::api::{HttpObjectApi, ObjectApi};
use roundview::cli::{self, Cli, Command, ViewArgs};
use roundview::controller::CommentController;
use roundview::document::DocumentEngine;
use roundview::event_source::TerminalEventSource;
use roundview::panic_handler::initialize_panic_handler;
use roundview::view::ViewState;
use roundview::{App, run_app_with_event_source, settings, theme};

fn main() -> Result<()> {
    let args = Cli::parse();

    WriteLogger::init(
        args.log_level,
        Config::default(),
        File::create("roundview.log")?,
    )?;
    initialize_panic_handler();
    info!("Starting roundview");

    match &args.config_dir {
        Some(dir) => settings::load_settings_from_path(&settings::config_path_in(dir)),
        None => settings::load_settings(),
    }
    theme::change_theme(&settings::get_theme_name(), false);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    let result = runtime.block_on(run(args));
    if let Err(e) = &result {
        error!("{e:#}");
    }
    info!("Shutting down roundview");
    result
}

async fn run(args: Cli) -> Result<()> {
    let server = cli::resolve_server(args.server.as_deref())?;
    let api = HttpObjectApi::new(&server, cli::resolve_api_key(args.api_key.as_deref()))?;
    let mut out = stdout();

    match args.command {
        Command::View(view) => run_viewer(api, view).await,
        Command::Comments { command } => cli::run_comments(&api, command, &mut out).await,
        Command::Status { object, value } => {
            cli::run_status(&api, &object, value.as_deref(), &mut out).await
        }
        Command::Objects { project } => cli::run_objects(&api, &project, &mut out).await,
        Command::Reviews { command } => {
            cli::run_reviews(&api, command).await;
            Ok(())
        }
    }
}

#[cfg(feature = "pdf")]
fn open_engine(bytes: &[u8]) -> Result<Box<dyn DocumentEngine>> {
    let engine = roundview::document::MupdfEngine::from_bytes(bytes)
        .context("Failed to open the document")?;
    Ok(Box::new(engine))
}

#[cfg(not(feature = "pdf"))]
fn open_engine(_bytes: &[u8]) -> Result<Box<dyn DocumentEngine>> {
    anyhow::bail!("roundview was built without PDF support, rebuild with --features pdf")
}

async fn run_viewer(api: HttpObjectApi, args: ViewArgs) -> Result<()> {
    let bytes = api
        .fetch_document(&args.object)
        .await
        .with_context(|| format!("Failed to download {}", args.object))?;
    let engine = open_engine(&bytes)?;
    info!(
        "Opened {} ({} pages, {} bytes)",
        args.object,
        engine.page_count(),
        bytes.len()
    );

    let session = args.session();
    let view = ViewState::new(engine.page_count() as u32, settings::is_night_mode());
    let controller = CommentController::new(api, args.object, session, view);
    let mut app = App::new(engine, controller);

    enable_raw_mode()?;
    let mut terminal = match enter_terminal() {
        Ok(terminal) => terminal,
        Err(e) => {
            error!("Failed to set up the terminal: {e}");
            let _ = execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture);
            let _ = disable_raw_mode();
            return Err(e);
        }
    };

    let mut events = TerminalEventSource;
    let result = run_app_with_event_source(&mut terminal, &mut app, &mut events).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn enter_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}
