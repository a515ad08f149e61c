//! Calibration batch - Entry Point
//!
//! Regenerates the percentile calibration table from a population of
//! synthetic charts. Run it whenever the meter configs or any scoring
//! factor changes; the server refuses a table whose version no longer
//! matches the meter set.
//!
//! Usage:
//!   calibrate [--charts N] [--start YYYY-MM-DD] [--end YYYY-MM-DD]
//!             [--seed N] [--out PATH]

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use astrometers::calibration::{run_calibration, CalibrationSpec, CancelToken};
use astrometers::config::default_meter_set;
use astrometers::ephemeris::init_ephemeris;

struct Args {
    charts: usize,
    start: NaiveDate,
    end: NaiveDate,
    seed: u64,
    out: PathBuf,
}

fn parse_args() -> Result<Args> {
    let today = Utc::now().date_naive();
    let mut args = Args {
        charts: 1000,
        start: today - Duration::days(5 * 365),
        end: today,
        seed: 0x5eed,
        out: PathBuf::from("calibration.json"),
    };

    let mut argv = std::env::args().skip(1);
    while let Some(flag) = argv.next() {
        let mut value = || {
            argv.next()
                .with_context(|| format!("missing value for {}", flag))
        };
        match flag.as_str() {
            "--charts" => args.charts = value()?.parse().context("--charts expects a number")?,
            "--start" => {
                args.start = NaiveDate::parse_from_str(&value()?, "%Y-%m-%d")
                    .context("--start expects YYYY-MM-DD")?
            }
            "--end" => {
                args.end = NaiveDate::parse_from_str(&value()?, "%Y-%m-%d")
                    .context("--end expects YYYY-MM-DD")?
            }
            "--seed" => args.seed = value()?.parse().context("--seed expects a number")?,
            "--out" => args.out = PathBuf::from(value()?),
            other => bail!("unknown flag '{}'", other),
        }
    }

    Ok(args)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = parse_args()?;
    init_ephemeris();

    let meters = default_meter_set()?;
    let spec = CalibrationSpec {
        chart_count: args.charts,
        start: args.start,
        end: args.end,
        seed: args.seed,
    };

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrl_c_handler(move || cancel.cancel());
    }

    let mut table = run_calibration(&spec, &meters, &cancel)?;
    table.generated_at = Some(Utc::now().to_rfc3339());

    let json = serde_json::to_string_pretty(&table)?;
    fs::write(&args.out, json)
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    tracing::info!(
        out = %args.out.display(),
        version = %table.version,
        "calibration table written"
    );

    Ok(())
}

/// Flip the cancel flag on Ctrl-C; the batch loop notices at its next
/// task boundary.
fn ctrl_c_handler(on_cancel: impl Fn() + Send + 'static) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build();
    if let Ok(runtime) = runtime {
        std::thread::spawn(move || {
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("cancellation requested, stopping after current tasks");
                    on_cancel();
                }
            });
        });
    }
}
