use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tokio::runtime::{Handle, Runtime};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sheetwatch::app::{App, RefreshRequest, View};
use sheetwatch::config::{Overrides, Settings};
use sheetwatch::{
    events, export, ui, ApiClient, CycleOutcome, DashboardView, PollConfig, PollTask, Poller,
    QueryHandle, Source, StatsSource, TableSource, TableView,
};

#[derive(Parser, Debug)]
#[command(name = "sheetwatch")]
#[command(about = "Terminal dashboard that keeps a sheet viewer's table and statistics in sync")]
struct Args {
    /// Config file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the sheet viewer API
    #[arg(short, long)]
    url: Option<String>,

    /// Table polling interval in seconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Statistics polling interval in seconds
    #[arg(long)]
    stats_interval: Option<u64>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Do not poll statistics
    #[arg(long)]
    no_stats: bool,

    /// Log every poll cycle instead of drawing the TUI
    #[arg(long, conflicts_with = "export")]
    headless: bool,

    /// Refresh once, export the rendered views to JSON and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

type TablePoller = Arc<Poller<TableSource, TableView>>;
type StatsPoller = Arc<Poller<StatsSource, DashboardView>>;

/// The pollers behind the table and dashboard views.
struct Pollers {
    table: TablePoller,
    stats: Option<StatsPoller>,
    query: QueryHandle,
}

impl Pollers {
    fn build(settings: &Settings, with_stats: bool) -> Result<Self> {
        let client = ApiClient::builder()
            .endpoint(settings.base_url.as_str())
            .timeout(settings.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        let query = QueryHandle::new();
        let table_source =
            TableSource::with_query(client.clone(), settings.data_path.as_str(), query.clone());
        let table = Arc::new(Poller::new(
            table_source,
            PollConfig::new(settings.poll_interval())?,
        ));

        let stats = if with_stats {
            let stats_source = StatsSource::new(client, settings.stats_path.as_str());
            Some(Arc::new(Poller::new(
                stats_source,
                PollConfig::new(settings.stats_poll_interval())?,
            )))
        } else {
            None
        };

        Ok(Self {
            table,
            stats,
            query,
        })
    }

    /// Start the repeating tasks. Must be called within a tokio runtime.
    fn start(&self) -> Vec<PollTask> {
        let mut tasks = vec![Arc::clone(&self.table).start()];
        if let Some(stats) = &self.stats {
            tasks.push(Arc::clone(stats).start());
        }
        tasks
    }

    /// Run a refresh the app asked for without blocking the UI thread.
    fn dispatch(&self, runtime: &Handle, request: RefreshRequest) {
        match request {
            RefreshRequest::Table { force } => {
                let table = Arc::clone(&self.table);
                runtime.spawn(async move { table.refresh_now(force).await });
            }
            RefreshRequest::Stats => {
                if let Some(stats) = &self.stats {
                    let stats = Arc::clone(stats);
                    runtime.spawn(async move { stats.refresh_now(true).await });
                }
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = Overrides {
        base_url: args.url.clone(),
        poll_seconds: args.interval,
        stats_poll_seconds: args.stats_interval,
        request_timeout_secs: args.timeout,
    };
    let settings = Settings::load(args.config.as_deref(), &overrides)?;

    let tui = !args.headless && args.export.is_none();
    init_logging(&settings, tui, args.headless)?;
    info!(
        base_url = %settings.base_url,
        poll_seconds = settings.poll_seconds,
        stats_poll_seconds = settings.stats_poll_seconds,
        "Starting sheetwatch"
    );

    let pollers = Pollers::build(&settings, !args.no_stats)?;
    let rt = Runtime::new()?;

    // Handle export mode (non-interactive)
    if let Some(export_path) = args.export {
        return export_to_file(&rt, &pollers, &export_path);
    }

    if args.headless {
        return run_headless(&rt, &pollers);
    }

    run_tui(&rt, &pollers)
}

/// Install the tracing subscriber.
///
/// The TUI owns the terminal, so in that mode logs go to the log file.
fn init_logging(settings: &Settings, tui: bool, headless: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(settings.log_filter_for(headless)))
        .context("Invalid log filter")?;

    if tui {
        let file = File::create(&settings.log_file).with_context(|| {
            format!("Failed to create log file {}", settings.log_file.display())
        })?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

/// Poll without a UI until Ctrl-C.
fn run_headless(rt: &Runtime, pollers: &Pollers) -> Result<()> {
    let _enter = rt.enter();
    let tasks = pollers.start();

    let result = rt.block_on(async {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")
    });

    info!("Shutting down");
    for task in tasks {
        task.stop();
    }
    result
}

/// Refresh every poller once and export the rendered views.
fn export_to_file(rt: &Runtime, pollers: &Pollers, export_path: &Path) -> Result<()> {
    let table_outcome = rt.block_on(pollers.table.refresh_now(true));
    let table = pollers.table.handle();

    let view = match (table_outcome, table.view()) {
        (CycleOutcome::Updated, Some(view)) => view,
        _ => bail!(
            "Failed to fetch {}: {}",
            pollers.table.source().description(),
            table.last_error().unwrap_or_else(|| "no data".to_string())
        ),
    };

    let dashboard = match &pollers.stats {
        Some(stats) => {
            if rt.block_on(stats.refresh_now(true)) == CycleOutcome::Failed {
                warn!(
                    error = %stats.handle().last_error().unwrap_or_default(),
                    "Exporting without statistics"
                );
            }
            stats.handle().view()
        }
        None => None,
    };

    export::write_export(
        export_path,
        &view,
        dashboard.as_deref(),
        table.status(),
        &pollers.query.get(),
    )?;

    println!("Exported to: {}", export_path.display());
    Ok(())
}

/// Run the TUI with the pollers running on the runtime
fn run_tui(rt: &Runtime, pollers: &Pollers) -> Result<()> {
    let _enter = rt.enter();
    let tasks = pollers.start();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let mut app = App::new(
        pollers.table.handle(),
        pollers.stats.as_ref().map(|stats| stats.handle()),
        pollers.query.clone(),
        pollers.table.source().description(),
    );

    let result = run_app(&mut terminal, &mut app, pollers, rt.handle());

    for task in tasks {
        task.stop();
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    pollers: &Pollers,
    runtime: &Handle,
) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        app.sync_views();

        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal pequeno demais: {}x{}\nMínimo: {}x{}\n\nRedimensione para continuar",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let top = (area.height / 2).saturating_sub(2);
                let centered = ratatui::layout::Rect::new(0, top, area.width, 5u16.min(area.height));
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            match app.current_view {
                View::Table => ui::table::render(frame, app, chunks[2]),
                View::Dashboard => ui::dashboard::render(frame, app, chunks[2]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // The short timeout doubles as the redraw rate for poller updates.
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                _ => {}
            }
        }

        for request in app.take_refresh_requests() {
            pollers.dispatch(runtime, request);
        }
    }

    Ok(())
}
