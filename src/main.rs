use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use scopeglow::capture::open_source;
use scopeglow::driver::{Driver, PREVIEW_TITLE};
use scopeglow::preview::open_preview;
use scopeglow::{logger, Adalight, Ambient, GlowConfig};

/// Drive an Adalight LED strip from the edges of a captured display
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// JSON configuration file; built-in defaults otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Show the preview regardless of the configuration
    #[arg(long)]
    preview: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn load_config(cli: &Cli) -> anyhow::Result<GlowConfig> {
    let mut config = match &cli.config {
        Some(path) => GlowConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GlowConfig::default(),
    };
    if cli.preview {
        config.preview.enabled = true;
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    if cli.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let quit = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&quit);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl+C handler")?;

    let ambient = Ambient::from_config(&config);
    info!(
        "{} LEDs (top {}, right {}, bottom {}, left {}), gamma {}",
        ambient.led_count(),
        config.edges.top.samples,
        config.edges.right.samples,
        config.edges.bottom.samples,
        config.edges.left.samples,
        config.gamma
    );
    info!("Crop {} scaled to {}", config.crop, config.working);

    let led_count = ambient.led_count();
    let mut driver = Driver::assemble(
        ambient,
        || open_source(&config.capture),
        || Adalight::open(&config.strip, led_count),
        || open_preview(&config, PREVIEW_TITLE),
    )?
    .with_quit_flag(quit);

    driver.run()?;
    Ok(())
}

fn main() -> ExitCode {
    logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
