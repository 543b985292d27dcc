mod viewer;

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::Parser;
use graph_lens::EngineConfig;
use graph_lens::layout::ViewDimension;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph payload to open (JSON).
    payload: PathBuf,

    /// Engine configuration file (JSON). Missing sections use defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start in the flat 2D view.
    #[arg(long)]
    flat: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "graph_lens=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let dimension = if args.flat {
        ViewDimension::Two
    } else {
        ViewDimension::Three
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "graph-lens",
        options,
        Box::new(move |cc| {
            Ok(Box::new(viewer::GraphLensApp::new(
                cc,
                args.payload,
                config,
                dimension,
            )))
        }),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
