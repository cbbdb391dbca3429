//! starsync: ERP analytics batch sync
//!
//! Runs one sync against the configured stores and prints the run report as
//! JSON.
//!
//! ## Usage
//! ```text
//! starsync [full|incremental|status] [config-path]
//! ```
//!
//! - `incremental` (default): move rows changed since each table's watermark
//! - `full`: truncate and reload every table
//! - `status`: print the stored watermarks
//!
//! ## Configuration
//! - STARSYNC_CONFIG: Path to the YAML configuration file (optional)
//! - STARSYNC__<SECTION>__<KEY>: Override any configuration value
//! - STARSYNC_LOG: Log filter (default: info)
//!
//! Exits non-zero when any table failed, was cancelled or was skipped.

use tracing::{error, info};

use starsync::config::Config;
use starsync::model::SyncType;
use starsync::storage::{init_analytical, init_operational};
use starsync::sync::{BatchSyncOrchestrator, SyncError};
use starsync::utils::bootstrap::init_tracing;

enum Command {
    Sync(SyncType),
    Status,
}

fn parse_command(arg: Option<&str>) -> Result<Command, String> {
    match arg {
        None | Some("incremental") => Ok(Command::Sync(SyncType::Incremental)),
        Some("full") => Ok(Command::Sync(SyncType::Full)),
        Some("status") => Ok(Command::Status),
        Some(other) => Err(format!(
            "unknown command '{other}'; usage: starsync [full|incremental|status] [config-path]"
        )),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(args.first().map(String::as_str))?;
    let config = Config::load(args.get(1).map(String::as_str))?;

    let analytical = init_analytical(&config.analytical).await?;

    let mode = match command {
        Command::Status => {
            let watermarks = analytical.watermarks.list_all().await?;
            println!("{}", serde_json::to_string_pretty(&watermarks)?);
            return Ok(());
        }
        Command::Sync(mode) => mode,
    };

    let operational = init_operational(&config.operational).await?;
    let orchestrator = BatchSyncOrchestrator::new(
        operational.source,
        analytical.warehouse,
        analytical.watermarks,
        config.sync,
    );

    info!(mode = %mode, "starsync started");

    match orchestrator.run(mode, orchestrator.default_context()).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(SyncError::Incomplete(report)) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            error!(failures = %report.failure_summary(), "Sync run incomplete");
            Err(SyncError::Incomplete(report).into())
        }
        Err(e) => Err(e.into()),
    }
}
