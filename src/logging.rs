use crate::errors::Error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a compact console subscriber filtered by `RUST_LOG` (defaults to `info`).
pub fn setup_tracing() -> Result<(), Error> {
    let console_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_filter(env_filter());

    let subscriber = Registry::default().with(console_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
