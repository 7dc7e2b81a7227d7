use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cropcast_ai::{Dispatcher, OptionCatalogue, Registry};
use cropcast_core::PredictionRequest;
use cropcast_core::config::DEFAULT_MODELS_DIR;
use cropcast_store::ArtifactStore;

/// Crop disease predictions from trained model artifacts.
#[derive(Parser, Debug)]
#[command(name = "cropcast", version)]
struct Cli {
    /// Directory holding model_A.json, model_B.json, and model_C.json.
    #[arg(long, global = true, env = "CROPCAST_MODELS_DIR", default_value = DEFAULT_MODELS_DIR)]
    models_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Predict the disease for a crop sample.
    ///
    /// Supplying --cause routes to model C; otherwise --want-b routes to
    /// model B (disease and cause); otherwise model A.
    Predict {
        #[arg(long)]
        stage: String,
        #[arg(long)]
        region: String,
        #[arg(long)]
        cause: Option<String>,
        #[arg(long)]
        want_b: bool,
    },
    /// List known stages, regions, and causes across loaded models.
    Options,
    /// Show which models loaded and why any did not.
    Status,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    tracing::info!("cropcast v{}", env!("CARGO_PKG_VERSION"));

    let store = ArtifactStore::open(&cli.models_dir);
    let registry = Arc::new(Registry::load(&store));

    let output = run(cli.command, registry)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("rendering output")?
    );
    Ok(())
}

/// Execute one subcommand against a loaded registry, returning the JSON to
/// print. Failed predictions are output, not errors.
fn run(command: Command, registry: Arc<Registry>) -> anyhow::Result<serde_json::Value> {
    let value = match command {
        Command::Predict {
            stage,
            region,
            cause,
            want_b,
        } => {
            let request = PredictionRequest {
                stage,
                region,
                cause,
                force_variant_b: want_b,
            };
            let result = Dispatcher::new(registry).predict(&request);
            serde_json::to_value(result)?
        }
        Command::Options => serde_json::to_value(OptionCatalogue::collect(&registry))?,
        Command::Status => serde_json::to_value(registry.status())?,
    };
    Ok(value)
}
