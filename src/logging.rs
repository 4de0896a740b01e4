//! Logging setup

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global fmt subscriber. `RUST_LOG` overrides `default_filter`.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(default_filter: &str) -> crate::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_reported() {
        // Only this test installs a subscriber in the unit-test process
        init_logging("telco_churn=info").unwrap();
        assert!(init_logging("telco_churn=debug").is_err());
    }
}
