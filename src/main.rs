use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;
use clap::Parser;

mod app;
mod config;
mod console;
mod delegate;
mod error;
mod find;
mod handler;
mod layers;
mod list_view;
mod logging;
mod model;
mod ollama;
mod paths;
mod tui;
mod ui;

use app::{App, Backends};
use config::Config;
use console::CodeConsole;
use delegate::{ChatDelegate, FileResultDelegate, Palette};
use find::FileIndex;
use handler::ClickTracker;
use layers::{LayerDispatch, Project, ProjectLoader};
use model::Message;
use ollama::{OllamaClient, OllamaTransport};

#[derive(Parser)]
#[command(name = "kue")]
#[command(about = "Kue sidebar: chat with a local model and find GIS data to load")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory to index for /find (repeatable, overrides the config)
    #[arg(long = "root")]
    roots: Vec<PathBuf>,
    /// Ollama model to use
    #[arg(short, long)]
    model: Option<String>,
    /// Ollama base URL
    #[arg(long)]
    ollama_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_guard = logging::init()?;

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => {
            let config = Config::load()?;
            // First run: leave a file with the defaults for the user to edit
            if !Config::get_config_path()?.exists() {
                if let Err(e) = config.save() {
                    tracing::warn!(error = %e, "could not write default config");
                }
            }
            config
        }
    };
    if !cli.roots.is_empty() {
        config.search_roots = cli.roots;
    }
    if let Some(model) = cli.model {
        config.model = Some(model);
    }
    if let Some(url) = cli.ollama_url {
        config.ollama_url = Some(url);
    }

    let home = paths::home_dir();
    let roots = config.search_roots(home.as_deref());
    tracing::info!(roots = ?roots, "indexing search roots");
    let index = FileIndex::build(&roots, config.max_depth(), config.max_results(), home.as_deref());
    tracing::info!(files = index.len(), "file index ready");
    let greeting = if index.is_empty() {
        "No shapefiles or GeoTIFFs found under the search roots. Add roots with --root or in the config file.".to_string()
    } else {
        format!("Indexed {} GIS files. Type /find <name> to search them.", index.len())
    };

    let (transport, replies) = OllamaTransport::new(OllamaClient::new(config.ollama_url()), config.model());
    let console = CodeConsole::new(config.scratch_file(), config.clipboard());
    tracing::info!(scratch = %console.scratch_file().display(), "run code target");
    let project = Rc::new(RefCell::new(Project::default()));
    let dispatch = LayerDispatch::new(Box::new(ProjectLoader::new(Rc::clone(&project))));

    let palette = Palette::default();
    let backends = Backends {
        search: Box::new(index),
        transport: Box::new(transport),
        replies: Some(replies),
        chat_delegate: ChatDelegate::new(palette).with_action(Box::new(console)),
        find_delegate: FileResultDelegate::new(palette, home.clone()).with_open(Box::new(dispatch)),
        project,
        home,
    };
    let mut app = App::new(backends, config.model());
    app.append_message(Message::system(greeting));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "kue exited with an error");
        eprintln!("kue: {:#}\nlog: {}", e, log_guard.log_path.display());
    }
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = tui::EventHandler::new();
    let mut clicks = ClickTracker::default();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, &mut clicks, event)?,
            None => break,
        }
    }
    Ok(())
}
