mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use dungeon_master::config::{BackendProtocol, EngineConfig};
use dungeon_master::engine::engine::Engine;
use dungeon_master::engine::frontend::ConsoleFrontend;
use dungeon_master::engine::llm_client::HttpModelGateway;
use dungeon_master::engine::modality::LocalModalityAdapter;

#[derive(Parser, Debug)]
#[command(name = "dungeon_master", version, about = "Text adventure narrated by local models")]
struct Cli {
    /// Engine config file (defaults to the per-user config).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Play in the terminal instead of opening a window.
    #[arg(long)]
    console: bool,

    /// Override the model backend endpoint.
    #[arg(long)]
    endpoint: Option<String>,

    /// Override the backend wire protocol.
    #[arg(long, value_enum)]
    protocol: Option<BackendProtocol>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dungeon_master=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = EngineConfig::load(cli.config.as_deref())
        .context("failed to load engine config")?;
    if let Some(endpoint) = cli.endpoint {
        config.gateway.endpoint = endpoint;
    }
    if let Some(protocol) = cli.protocol {
        config.gateway.protocol = protocol;
    }
    config.validate()?;
    let config = Arc::new(config);

    let gateway = HttpModelGateway::new(config.clone())?;
    let modality = LocalModalityAdapter::new(&config, Box::new(gateway.clone()))?;
    let engine = Engine::new(config.clone(), Box::new(gateway.clone()), Box::new(modality));

    if cli.console {
        let stdin = io::stdin();
        let mut frontend = ConsoleFrontend::new(stdin.lock(), io::stdout());
        frontend.greet();

        let mut engine = engine;
        engine.run(&mut frontend);
        return Ok(());
    }

    eframe::run_native(
        "Dungeon Master",
        eframe::NativeOptions::default(),
        Box::new(move |_cc| Ok(Box::new(ui::app::DungeonApp::new(config, gateway, engine)))),
    )
    .map_err(|e| anyhow::anyhow!("ui failed: {e}"))
}
