//! countwatch - OCR counter watcher
//!
//! Watches a numeric display through OCR readings, confirms stable values,
//! and drives an "up" and a "down" indicator on every confirmed change.
//!
//! # Usage
//!
//! ```bash
//! # Replay a recorded session at 10x speed, indicators logged only
//! ./countwatch --replay session.csv --speed 10
//!
//! # Live OCR pipeline on stdin, driving GPIO indicators
//! ./ocr_loop.sh | ./countwatch --stdin --emitter gpio
//!
//! # Run an OCR command once per tick
//! ./countwatch --command "grab_frame | tesseract stdin stdout --psm 7"
//! ```
//!
//! # Environment Variables
//!
//! - `COUNTWATCH_CONFIG`: Path to the TOML config (default: ./countwatch.toml)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use countwatch::config::WatchConfig;
use countwatch::emitter::{LogEmitter, SignalEmitter, SysfsGpioEmitter};
use countwatch::pipeline::{
    load_replay_file, CommandSource, PipelineCoordinator, ProcessingLoop, ReadingSource,
    ReplaySource, RunSummary, StdinSource,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "countwatch")]
#[command(about = "Debounce OCR counter readings and signal up/down changes")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (errors in this file are fatal)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read one OCR reading per line from stdin (plain text or JSON)
    /// Example: ./ocr_loop.sh | ./countwatch --stdin
    #[arg(long, conflicts_with_all = ["replay", "command"])]
    stdin: bool,

    /// Replay a recorded session (`offset_secs,text` per line)
    #[arg(long, value_name = "FILE", conflicts_with = "command")]
    replay: Option<PathBuf>,

    /// Shell command run once per tick; its stdout is the OCR text.
    /// Overrides `source.command` from the config file.
    #[arg(long, value_name = "CMD")]
    command: Option<String>,

    /// Replay speed multiplier (1 = realtime, 10 = 10x faster, 0 = no delay)
    #[arg(long, default_value = "1")]
    speed: f64,

    /// Where indicator commands go
    #[arg(long, value_enum, default_value_t = EmitterKind::Log)]
    emitter: EmitterKind,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum EmitterKind {
    /// Log indicator changes only
    Log,
    /// Drive Linux sysfs GPIO lines from `[indicators]`
    Gpio,
}

// ============================================================================
// Setup
// ============================================================================

fn load_config(args: &CliArgs) -> Result<WatchConfig> {
    match &args.config {
        Some(path) => {
            let config = WatchConfig::load_from_file(path)
                .with_context(|| format!("Invalid config file {}", path.display()))?;
            info!(path = %path.display(), "Loaded watch config");
            Ok(config)
        }
        None => Ok(WatchConfig::load()),
    }
}

fn build_emitter(kind: EmitterKind, config: &WatchConfig) -> Result<Box<dyn SignalEmitter>> {
    match kind {
        EmitterKind::Log => Ok(Box::new(LogEmitter)),
        EmitterKind::Gpio => {
            let emitter = SysfsGpioEmitter::open(&config.indicators)
                .context("Failed to open GPIO indicator lines")?;
            info!(
                "💡 Indicators: GPIO up={} down={}{}",
                config.indicators.up_gpio,
                config.indicators.down_gpio,
                if config.indicators.active_low { " (active low)" } else { "" }
            );
            Ok(Box::new(emitter))
        }
    }
}

async fn run_with_source<S: ReadingSource>(
    mut source: S,
    config: &WatchConfig,
    emitter: Box<dyn SignalEmitter>,
    cancel_token: CancellationToken,
) -> Result<RunSummary> {
    let coordinator = PipelineCoordinator::new(&config.pipeline, emitter)
        .context("Pipeline configuration rejected")?;
    Ok(ProcessingLoop::new(coordinator, cancel_token)
        .run(&mut source)
        .await)
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  countwatch - OCR counter watcher");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        "⏱️  Debounce: {:.2}s | No reading: {:?} | No change: {:?} | Decimals kept: {}",
        config.pipeline.debounce_window_seconds,
        config.pipeline.no_reading_policy,
        config.pipeline.no_change_output,
        config.pipeline.decimal_digits_kept
    );

    let emitter = build_emitter(args.emitter, &config)?;

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let command_argv = match &args.command {
        Some(cmd) => vec!["sh".to_string(), "-c".to_string(), cmd.clone()],
        None => config.source.command.clone(),
    };

    let summary = if let Some(path) = &args.replay {
        // --- Replay mode ---
        let readings = load_replay_file(path)?;
        if args.speed < 0.0 || !args.speed.is_finite() {
            anyhow::bail!("--speed must be a non-negative number, got {}", args.speed);
        }
        info!(
            "📥 Input: replay {} ({} readings, speed {})",
            path.display(),
            readings.len(),
            if args.speed == 0.0 { "max".to_string() } else { format!("{}x", args.speed) }
        );
        run_with_source(ReplaySource::new(readings, args.speed), &config, emitter, cancel_token).await?
    } else if args.stdin || command_argv.is_empty() {
        // --- Stdin mode ---
        info!("📥 Input: stdin (one OCR reading per line)");
        run_with_source(StdinSource::stdin()?, &config, emitter, cancel_token).await?
    } else {
        // --- External OCR command mode ---
        info!("📥 Input: OCR command {:?}", command_argv);
        let source = CommandSource::new(
            &command_argv,
            Duration::from_millis(config.source.poll_interval_ms),
        )?;
        run_with_source(source, &config, emitter, cancel_token).await?
    };

    if !summary.safe_state_confirmed {
        warn!("⚠️  Indicators may still be lit: final safe-state command failed");
    }
    if !summary.exit.is_clean() {
        anyhow::bail!("countwatch stopped: {:?}", summary.exit);
    }

    info!("");
    info!("✓ countwatch shutdown complete");
    Ok(())
}
