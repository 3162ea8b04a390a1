//! positional-audit: Contiguity checker
//!
//! Scans every scope of the configured table and reports positions that
//! break the `start..start+count` run: duplicates, holes and strays.
//!
//! ## Configuration
//! - POSITIONAL_CONFIG: Path to a YAML config file (optional)
//! - POSITIONAL__*: Overrides for individual config keys
//! - POSITIONAL_LOG: Tracing filter (default: info)
//!
//! The first argument, if given, is used as the config file path.
//! Exits with status 1 when any scope is not contiguous.

use std::process::ExitCode;

use tracing::{info, warn};

use positional::config::Config;
use positional::storage::init_storage;
use positional::utils::bootstrap::init_tracing;
use positional::PositionManager;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    init_tracing();

    let path = std::env::args().nth(1);
    let config = Config::load(path.as_deref())?;

    let store = init_storage(&config).await?;
    let manager = PositionManager::new(store, config.positioning.clone());

    let audits = manager.audit_all().await?;
    let mut broken = 0;
    for audit in &audits {
        if audit.is_contiguous() {
            continue;
        }
        broken += 1;
        warn!(
            scope = %audit.scope,
            count = audit.count,
            duplicates = ?audit.duplicates,
            missing = ?audit.missing,
            stray = ?audit.stray,
            "Scope positions are not contiguous"
        );
    }

    info!(
        table = %config.storage.table.name,
        scopes = audits.len(),
        broken,
        "positional-audit finished"
    );

    Ok(if broken == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
