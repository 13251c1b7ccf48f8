//! ledcast-sender entry point.
//!
//! ```text
//! ledcast-sender                          Stream with ledcast-sender.toml or defaults
//! ledcast-sender --config <path>          Load a custom config TOML
//! ledcast-sender --preset wide            Start from the 64x128 single-port deployment
//! ledcast-sender --source test-pattern    Stream a synthetic pattern, no display needed
//! ledcast-sender --gen-config             Write default config to stdout
//! ```

use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ledcast_sender::config::{LoggingConfig, Preset, SenderConfig, SourceKind};
use ledcast_sender::service::SenderService;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "ledcast-sender", about = "Stream a screen region to an LED matrix panel")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "ledcast-sender.toml")]
    config: PathBuf,

    /// Start from a known deployment instead of the config file.
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// Receiver IP address (overrides config).
    #[arg(short, long)]
    destination: Option<String>,

    /// Base UDP port (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Frame source (overrides config).
    #[arg(long, value_enum)]
    source: Option<SourceKind>,

    /// Pace to this many frames per second; 0 = unbounded.
    #[arg(long)]
    fps: Option<u32>,

    /// Stop after this many frames.
    #[arg(long)]
    frames: Option<u64>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

impl Cli {
    fn apply(&self, config: &mut SenderConfig) {
        if let Some(dest) = &self.destination {
            config.network.destination = dest.clone();
        }
        if let Some(port) = self.port {
            config.network.base_port = port;
        }
        if let Some(source) = self.source {
            config.capture.source = source;
        }
        if let Some(fps) = self.fps {
            config.performance.target_fps = fps;
        }
        if let Some(frames) = self.frames {
            config.performance.frame_limit = frames;
        }
    }
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&SenderConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    // Load config.
    let (mut config, using_defaults) = match cli.preset {
        Some(preset) => (SenderConfig::preset(preset), false),
        None => match SenderConfig::load(&cli.config)? {
            Some(config) => (config, false),
            None => (SenderConfig::default(), true),
        },
    };
    cli.apply(&mut config);

    init_tracing(&config.logging)?;
    if using_defaults {
        info!("no config at {}; using defaults", cli.config.display());
    }

    info!("ledcast-sender v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "region {}x{}+{}+{} -> panel {}x{}",
        config.capture.width,
        config.capture.height,
        config.capture.left,
        config.capture.top,
        config.panel.rows,
        config.panel.cols
    );
    info!(
        "destination {}:{} ({:?}, {} rows/shard)",
        config.network.destination,
        config.network.base_port,
        config.network.shard_mode,
        config.network.rows_per_shard
    );

    let service = SenderService::new(config);
    let stop = service.stop_handle();

    // Ctrl-C handler.
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, stopping after the current frame");
        stop.cancel();
    });

    if let Err(e) = service.run().await {
        error!("{e}");
        return Err(e.into());
    }

    Ok(())
}

/// `RUST_LOG` wins over the configured level; a configured file replaces stderr.
fn init_tracing(logging: &LoggingConfig) -> std::io::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.file.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&logging.file)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}
