use std::env;
use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use ledger_conduit::pipeline::{FileStateStore, Pipeline};
use ledger_conduit::plugins::{build_registry, PluginKind, PluginRegistry};
use ledger_conduit::shutdown;
use ledger_conduit::types::config::{PipelineConfig, CONFIG_FILE_NAME};

const DATA_DIR_ENV_VAR: &str = "LEDGER_CONDUIT_DATA_DIR";

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

/// `--data-dir DIR`, else the env var, else the working directory.
fn data_dir(args: &[String]) -> anyhow::Result<PathBuf> {
    if let Some(pos) = args.iter().position(|a| a == "--data-dir") {
        let dir = args
            .get(pos + 1)
            .context("--data-dir requires a directory argument")?;
        return Ok(PathBuf::from(dir));
    }
    Ok(env::var(DATA_DIR_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".")))
}

fn list_plugins(registry: &PluginRegistry) {
    for kind in [PluginKind::Importer, PluginKind::Processor, PluginKind::Exporter] {
        println!("{}s:", kind);
        for metadata in registry.metadata(kind) {
            let deprecated = if metadata.deprecated { " (deprecated)" } else { "" };
            println!("  {:<20} {}{}", metadata.name, metadata.description, deprecated);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional; a missing .env is not an error.
    let _ = dotenvy::dotenv();

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--list-plugins") {
        init_tracing("warn");
        list_plugins(&build_registry()?);
        return Ok(());
    }

    let data_dir = data_dir(&args)?;
    let config = PipelineConfig::load(&data_dir.join(CONFIG_FILE_NAME))?;
    init_tracing(&config.log_level);

    tracing::info!("Starting pipeline in {}", data_dir.display());

    let registry = build_registry()?;
    let (trigger, shutdown) = shutdown::channel();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received interrupt, shutting down");
                trigger.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for interrupt: {}", e),
        }
    });

    let store = FileStateStore::new(&data_dir);
    let mut pipeline = Pipeline::new(config, &registry, Box::new(store), shutdown)?;

    match pipeline.init().await {
        Err(e) if e.is_cancellation() => return Ok(()),
        result => result?,
    }
    pipeline.run().await?;

    tracing::info!("Pipeline stopped at round {}", pipeline.next_round());
    Ok(())
}
