//! Vantage CLI
//!
//! Simulate, check and scaffold scroll-driven scenes.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod simulate;

use vantage_app::SceneConfig;

#[derive(Parser)]
#[command(name = "vantage")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scroll-driven camera scene tool", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep the scroll offset down the page and back, printing each step
    Simulate {
        /// Scene config (TOML or JSON); defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Scroll positions per sweep direction
        #[arg(short, long, default_value = "20")]
        steps: u32,

        /// Frames rendered after each scroll step
        #[arg(short, long, default_value = "10")]
        frames: u32,

        /// Frame duration in milliseconds
        #[arg(long, default_value = "16.0")]
        frame_ms: f32,

        /// Override the page height in pixels
        #[arg(long)]
        content: Option<f32>,

        /// Override the viewport height in pixels
        #[arg(long)]
        viewport: Option<f32>,
    },

    /// Validate a scene config
    Check {
        /// Config file
        file: PathBuf,
    },

    /// Write the default scene config
    Init {
        /// Output file
        #[arg(default_value = "vantage.toml")]
        file: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Simulate {
            config,
            steps,
            frames,
            frame_ms,
            content,
            viewport,
        } => {
            let mut scene = load_config(config.as_deref())?;
            if let Some(content) = content {
                scene.viewport.content_height = content;
            }
            if let Some(viewport) = viewport {
                scene.viewport.height = viewport;
            }
            let options = simulate::SimulateOptions {
                steps,
                frames,
                frame_ms,
            };
            simulate::run(scene, &options)
        }

        Commands::Check { file } => cmd_check(&file),

        Commands::Init { file, force } => cmd_init(&file, force),
    }
}

fn load_config(path: Option<&Path>) -> Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("Failed to load scene config {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

fn cmd_check(file: &Path) -> Result<()> {
    let config = load_config(Some(file))?;
    config
        .validate()
        .with_context(|| format!("Invalid scene config {}", file.display()))?;

    info!(
        "{} is valid: {} model node styles, camera track {}, progress bar {}",
        file.display(),
        config.model.nodes.len(),
        if config.camera.track.enabled { "on" } else { "off" },
        if config.progress_bar.enabled { "on" } else { "off" },
    );
    Ok(())
}

fn cmd_init(file: &Path, force: bool) -> Result<()> {
    if file.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            file.display()
        );
    }

    let text = SceneConfig::default()
        .to_toml_string()
        .context("Failed to serialize default config")?;
    fs::write(file, text).with_context(|| format!("Failed to write {}", file.display()))?;

    info!("Wrote default scene config to {}", file.display());
    Ok(())
}
