use clap::{Parser, ValueEnum};
use color_eyre::Result;
use crossterm::event::{Event as CEvent, EventStream};
use futures::StreamExt;
use picgrid::config::Config;
use picgrid::services::{ImportSource, SessionStore};
use picgrid::tui::{App, AppEvent, terminal};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{error, info};

/// Browse CSV or JSON rows, filter them and preview image links
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable file logging at the given level (overrides RUST_LOG)
    #[arg(long = "logging", value_enum)]
    logging: Option<LogLevel>,
    /// Path to a config file (overrides default config discovery)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
    /// Import a local file or an http(s) link on startup
    #[arg(long = "load", value_name = "FILE_OR_URL")]
    load: Option<String>,
    /// Start empty and do not save the session
    #[arg(long = "no-session")]
    no_session: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogLevel { Error, Warn, Info, Debug, Trace }

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    picgrid::errors::init()?;
    picgrid::logging::init_with(None, args.logging.map(Into::into))?;

    let config = Config::from_path(args.config.as_deref())?;
    let store = (config.persist_session && !args.no_session)
        .then(|| SessionStore::new(&config.config.data_dir));

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let mut app = App::new(&config, events_tx, store)?;
    if let Some(load) = args.load {
        let source = ImportSource::from_arg(&load);
        info!("Loading {} on startup", source.describe());
        app.load_on_start(source);
    }

    let mut tui = terminal::init()?;
    let res = run_app(&mut tui, &mut app, events_rx).await;
    terminal::restore()?;

    if let Err(e) = res {
        error!("Error: {e}");
        eprintln!("Error: {e}");
    }
    Ok(())
}

async fn run_app(
    tui: &mut terminal::Tui,
    app: &mut App,
    mut events_rx: UnboundedReceiver<AppEvent>,
) -> anyhow::Result<()> {
    let mut input = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(100));

    loop {
        tui.draw(|f| app.render(f))?;

        tokio::select! {
            maybe_event = input.next() => match maybe_event {
                Some(Ok(CEvent::Key(key))) => {
                    app.handle_key_event(key).map_err(|e| anyhow::anyhow!("{e}"))?;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            Some(event) = events_rx.recv() => {
                app.handle_app_event(event).map_err(|e| anyhow::anyhow!("{e}"))?;
            }
            _ = tick.tick() => {
                app.update().map_err(|e| anyhow::anyhow!("{e}"))?;
            }
        }

        if app.should_quit() {
            break;
        }
    }
    Ok(())
}
