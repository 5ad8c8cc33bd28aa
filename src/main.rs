use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};

use script_launcher::app::App;
use script_launcher::config::{self, AppPaths, Settings};
use script_launcher::platform::Platform;
use script_launcher::{logging, ui};

/// Browse and run the platform scripts under <root>/scripts.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Print the script catalog and exit
    #[arg(short, long)]
    list: bool,
    /// Install root holding scripts/ and VERSION.txt
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let paths = AppPaths::new()?;
    let loaded = Settings::load(&paths.settings_file);
    let settings = loaded.as_ref().cloned().unwrap_or_default();
    if let Err(err) = logging::init(&paths.log_file, settings.log_level.as_deref()) {
        eprintln!("logging disabled: {err:#}");
    }
    if let Err(err) = &loaded {
        warn!("using default settings: {err:#}");
    }

    let cwd = env::current_dir().context("reading the working directory")?;
    let explicit = args.root.or_else(|| settings.root.clone());
    let root = config::resolve_root(explicit.as_deref(), &cwd)?;
    let platform = Platform::detect();

    if args.list {
        let report = ui::catalog_report(&platform.scripts_path(&root), platform)?;
        io::stdout().write_all(report.as_bytes())?;
        return Ok(());
    }

    info!(root = %root.display(), "starting launcher");
    let mut app = App::new(root, settings, platform, cwd);
    run_app(&mut app)
}

fn run_app(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let result = event_loop(&mut terminal, app);

    restore_terminal(&mut terminal)?;
    result
}

fn event_loop<B>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B: ratatui::backend::Backend + Write,
{
    app.start();
    let tick_rate = app.tick_rate();
    loop {
        app.drain_messages();
        terminal.draw(|frame| ui::render(frame, &app.snapshot()))?;

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) => app.handle_key(key),
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                Event::Resize(_, _) => {}
                Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
            }
        }

        if let Some(script) = app.take_pending_script() {
            terminal.draw(|frame| ui::render(frame, &app.snapshot()))?;
            let finished = with_terminal_suspension(terminal, || Ok(app.run_script(script)))?;
            app.apply(finished);
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn restore_terminal<B>(terminal: &mut Terminal<B>) -> Result<()>
where
    B: ratatui::backend::Backend + Write,
{
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Hands the real terminal to `f`, then takes it back and forces a full redraw.
fn with_terminal_suspension<B, F, T>(terminal: &mut Terminal<B>, f: F) -> Result<T>
where
    B: ratatui::backend::Backend + Write,
    F: FnOnce() -> Result<T>,
{
    terminal.show_cursor()?;
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    let result = f();
    enable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        EnterAlternateScreen,
        EnableMouseCapture
    )?;
    terminal.hide_cursor()?;
    terminal.clear()?;
    result
}
