//! MCP server entry point
//!
//! Wires the pieces together: ephemeris init, the validated meter
//! registry, stored chart profiles, and the stdio tool surface. All
//! logging goes to stderr; stdout belongs to the MCP transport.

use anyhow::Result;
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use astrometers::config::{default_calibration, default_meter_set, MeterRegistry};
use astrometers::ephemeris::init_ephemeris;
use astrometers::storage::Storage;
use astrometers::AstrometersServer;

/// Resolve the registry: embedded meter configs, with a calibration
/// table installed in the data directory taking precedence over the
/// embedded one. A stale or incomplete table is refused here, before
/// the server accepts any request.
fn load_registry(storage: &Storage) -> Result<MeterRegistry> {
    let meters = default_meter_set()?;
    let calibration = match storage.read_calibration_override()? {
        Some(table) => {
            tracing::info!(version = %table.version, "using locally installed calibration table");
            table
        }
        None => default_calibration()?,
    };
    Ok(MeterRegistry::new(meters, calibration)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    init_ephemeris();

    let storage = Storage::new()?;
    let registry = load_registry(&storage)?;
    tracing::info!(
        meters = registry.meters.len(),
        groups = registry.meters.groups().count(),
        calibration = %registry.calibration.version,
        "meter registry loaded"
    );

    let service = AstrometersServer::new(storage, registry)
        .serve(stdio())
        .await?;
    tracing::info!("astrometers serving on stdio");

    service.waiting().await?;

    Ok(())
}
