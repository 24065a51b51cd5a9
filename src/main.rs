use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use snake_duel::audio::{AudioDispatcher, BellPlayer};
use snake_duel::game::{GameConfig, Variant};
use snake_duel::modes::{HeadlessMode, WatchMode};

#[derive(Parser)]
#[command(name = "snake_duel")]
#[command(version, about = "Two self-driving snakes competing on a wrapping grid")]
struct Cli {
    /// How to run the match
    #[arg(long, default_value = "watch")]
    mode: Mode,

    /// Rule preset
    #[arg(long, default_value = "basic")]
    variant: VariantArg,

    /// JSON file whose fields override the preset
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid width (overrides preset and config file)
    #[arg(long)]
    width: Option<usize>,

    /// Grid height (overrides preset and config file)
    #[arg(long)]
    height: Option<usize>,

    /// Seed for a reproducible match
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate in headless mode
    #[arg(long, default_value = "1000")]
    ticks: u64,

    /// Print every snapshot as a JSON line (headless mode)
    #[arg(long)]
    json: bool,

    /// Disable sound cues
    #[arg(long)]
    mute: bool,

    /// Write logs to this file (the watch view owns the terminal)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Clone, ValueEnum)]
enum Mode {
    /// Watch the duel in the terminal
    Watch,
    /// Simulate without a terminal and print the result
    Headless,
}

#[derive(Clone, ValueEnum)]
enum VariantArg {
    /// One food item, no power-ups
    Basic,
    /// Power-ups, several food items and personalities
    Enhanced,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Basic => Variant::Basic,
            VariantArg::Enhanced => Variant::Enhanced,
        }
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match (&cli.mode, &cli.log_file) {
        (_, Some(path)) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {:?}", path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        (Mode::Headless, None) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(std::io::stderr)
                .init();
        }
        // The terminal belongs to the UI; without a log file, stay quiet
        (Mode::Watch, None) => {}
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<GameConfig> {
    let preset = GameConfig::for_variant(cli.variant.clone().into());

    let mut config = match &cli.config {
        Some(path) => GameConfig::from_file(path, &preset)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => preset,
    };

    if let Some(width) = cli.width {
        config.grid_width = width;
    }
    if let Some(height) = cli.height {
        config.grid_height = height;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    config.validate().context("Invalid game configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;
    let config = load_config(&cli)?;

    info!(
        width = config.grid_width,
        height = config.grid_height,
        actors = config.actors.len(),
        "snake_duel starting"
    );

    // Dispatch to appropriate mode
    match cli.mode {
        Mode::Watch => {
            // The bell is rung through the terminal between frames
            WatchMode::new(config, cli.mute).run().await?;
        }
        Mode::Headless => {
            let audio = if cli.mute {
                AudioDispatcher::muted()
            } else {
                AudioDispatcher::spawn(BellPlayer::stderr())
            };
            let mut headless = HeadlessMode::new(config, cli.ticks, audio);
            let summary = if cli.json {
                headless.run(Some(stdout().lock()))?
            } else {
                headless.run(None::<std::io::Sink>)?
            };

            if !cli.json {
                println!("{}", headless.format_summary(&summary));
            }
            headless.finish().await;
        }
    }

    Ok(())
}
