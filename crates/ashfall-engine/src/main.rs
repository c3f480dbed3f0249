//! # Ashfall
//!
//! Headless runner for the Ashfall simulation.
//!
//! Loads `ashfall.toml` (or the path given as the first argument; `--init`
//! writes a default one instead), loads the
//! level on a background thread, and drives the fixed-step simulation from an
//! input script until the time limit or the player's death.
//!
//! Set `ASHFALL_LOG_FORMAT=json` for JSON log lines; `RUST_LOG` adjusts levels.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;
mod loader;
mod script;
mod timing;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::EngineConfig;

/// Main entry point.
fn main() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("ashfall=info".parse()?);
    if std::env::var("ASHFALL_LOG_FORMAT").is_ok_and(|format| format == "json") {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
    }

    info!("Ashfall starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1).as_deref() {
        Some("--init") => {
            EngineConfig::default().save_to(config::CONFIG_FILE)?;
            return Ok(());
        },
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };

    let summary = app::run(&config)?;
    info!(
        "Finished after {} ticks ({:.2}s): score {}, health {:.0}, {} enemies left",
        summary.ticks, summary.elapsed, summary.score, summary.health, summary.enemies_left
    );
    Ok(())
}
