//! Tracing subscriber setup for applications embedding the engine.
//!
//! # Telemetry invariants
//!
//! - **No key material, plaintext or ciphertext** appears in any span
//!   attribute or log field. Events carry aliases, paths, algorithm names
//!   and counts only.
//! - `RUST_LOG` overrides the configured level when set.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(log_level: &str, json: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    }
    .context("failed to initialise tracing subscriber")?;

    Ok(())
}

