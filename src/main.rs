use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use playbot::executor::{ExecutorConfig, Progress, RunOutcome, SequenceRunner};
use playbot::sequence::{self, LOOP_FOREVER};

/// Playbot CLI
#[derive(Debug, Parser)]
#[command(
    name = playbot::PKG_NAME,
    version = playbot::PKG_VERSION,
    about = "An Enigo-based auto typer & clicker for scripted input playback"
)]
struct Args {
    /// Path to the sequence JSON file
    #[arg(short = 's', long = "sequence", required_unless_present = "print_schema")]
    sequence: Option<PathBuf>,

    /// Enable dry-run mode (log actions instead of simulating input)
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Validate the sequence and exit without running it
    #[arg(long = "validate-only")]
    validate_only: bool,

    /// Print the JSON Schema for sequence files and exit
    #[arg(long = "print-schema")]
    print_schema: bool,

    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Override the number of passes (0 = repeat until Ctrl+C)
    #[arg(long = "loops")]
    loops: Option<u32>,

    /// Override the seconds to wait between passes
    #[arg(long = "interval")]
    interval: Option<f64>,

    /// Keep running the remaining actions when one fails
    #[arg(long = "continue-on-error")]
    continue_on_error: bool,

    /// Seconds counted down before playback starts
    #[arg(long = "countdown", default_value_t = 0)]
    countdown: u64,

    /// Milliseconds to settle after each simulated input
    #[arg(long = "pause-ms")]
    pause_ms: Option<u64>,

    /// Disable the pointer-corner fail-safe
    #[arg(long = "no-failsafe")]
    no_failsafe: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Honor --log-level by initializing tracing directly at that level.
    if let Some(level) = &args.log_level {
        let level = match level.to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" | "warning" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => tracing::Level::INFO,
        };
        let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
    }

    if args.log_level.is_none() {
        playbot::init_tracing();
    }

    if args.print_schema {
        let schema = sequence::generate_schema();
        let json = serde_json::to_string_pretty(&schema)?;
        println!("{json}");
        return Ok(());
    }

    // clap enforces this unless --print-schema was given.
    let Some(path) = args.sequence.as_ref() else {
        anyhow::bail!("--sequence is required");
    };

    info!(
        version = playbot::PKG_VERSION,
        sequence = %path.display(),
        dry_run = args.dry_run,
        "Starting Playbot"
    );

    // Load the sequence and apply CLI overrides.
    let mut seq = sequence::load_from_path_async(path).await?;
    if let Some(loops) = args.loops {
        seq.loop_enabled = true;
        seq.loop_count = loops;
    }
    if let Some(interval) = args.interval {
        seq.repeat_interval = interval;
    }
    if args.continue_on_error {
        seq.stop_on_error = false;
    }

    // Pre-run check: every problem is reported, none is fatal individually.
    let problems = seq.validate();
    if !problems.is_empty() {
        for problem in &problems {
            error!(target: "playbot", "Validation: {problem}");
        }
        anyhow::bail!("sequence '{}' failed validation ({} problems)", seq.name, problems.len());
    }
    if args.validate_only {
        info!(target: "playbot", sequence = %seq.name, actions = seq.len(), "Sequence is valid");
        return Ok(());
    }

    // Ctrl+C requests cooperative cancellation; the runner polls the token
    // between actions and during waits.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(target: "playbot", "Received Ctrl+C, requesting stop");
            signal_cancel.cancel();
        }
    });

    for remaining in (1..=args.countdown).rev() {
        info!(target: "playbot", remaining, "Starting soon");
        tokio::select! {
            () = tokio::time::sleep(Duration::from_secs(1)) => {}
            () = cancel.cancelled() => {
                info!(target: "playbot", "Cancelled during countdown");
                return Ok(());
            }
        }
    }

    if seq.loop_enabled && seq.loop_count == LOOP_FOREVER {
        info!(target: "playbot", "Looping until Ctrl+C");
    }

    let defaults = ExecutorConfig::default();
    let config = ExecutorConfig {
        dry_run: args.dry_run,
        pause_ms: args.pause_ms.unwrap_or(defaults.pause_ms),
        failsafe: !args.no_failsafe,
    };

    // The runner blocks (input simulation and sleeps), so it runs on a
    // blocking thread while the async main waits for it.
    let stop_token = cancel.clone();
    let report = tokio::task::spawn_blocking(move || {
        let mut runner = SequenceRunner::new(config);
        let mut progress = |p: &Progress<'_>| {
            let pass = match p.loop_total {
                Some(total) => format!("{}/{}", p.loop_index + 1, total),
                None => format!("{}/forever", p.loop_index + 1),
            };
            match (p.action_index, p.action) {
                (Some(index), Some(action)) => {
                    info!(
                        target: "playbot",
                        %pass,
                        step = index + 1,
                        steps = p.action_total,
                        action = %action,
                        "Running action"
                    );
                }
                _ => {
                    debug!(target: "playbot", %pass, "Pass complete; waiting before next pass");
                }
            }
        };
        let stop = || stop_token.is_cancelled();
        runner.run(&seq, Some(&mut progress), Some(&stop))
    })
    .await?;

    for failure in &report.failures {
        warn!(
            target: "playbot",
            pass = failure.loop_index + 1,
            step = failure.action_index + 1,
            error = %failure.error,
            "Recorded failure"
        );
    }

    match report.outcome {
        RunOutcome::Completed => {
            info!(
                target: "playbot",
                loops = report.loops_completed,
                executed = report.executed,
                skipped = report.skipped,
                failures = report.failures.len(),
                "Playback finished"
            );
            Ok(())
        }
        RunOutcome::Cancelled => {
            info!(
                target: "playbot",
                loops = report.loops_completed,
                executed = report.executed,
                "Playback cancelled"
            );
            Ok(())
        }
        RunOutcome::Aborted => {
            anyhow::bail!("playback aborted after an action failure")
        }
    }
}
