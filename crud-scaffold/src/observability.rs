//! Structured logging setup

use tracing_subscriber::EnvFilter;

use crate::{config::Config, error::Result};

/// Initialize JSON tracing output filtered by `service.log_level`
///
/// An invalid filter directive falls back to `info`. Calling this twice in one
/// process returns an error instead of panicking.
pub fn init_tracing(config: &Config) -> Result<()> {
    let log_level = config.service.log_level.clone();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .map_err(|e| crate::error::Error::Internal(format!("Failed to install tracing subscriber: {}", e)))?;

    tracing::info!(
        service = %config.service.name,
        environment = %config.deployment_environment(),
        sensitive = config.is_sensitive_environment(),
        "Tracing initialized"
    );

    Ok(())
}

/// Flush and shut down tracing
pub fn shutdown_tracing() {
    tracing::info!("Tracing shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_does_not_panic() {
        let config = Config::default();
        let first = init_tracing(&config);
        let second = init_tracing(&config);
        // Another test may have installed a global subscriber first
        assert!(first.is_err() || second.is_err());
    }
}
