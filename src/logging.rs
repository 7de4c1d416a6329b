use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{GraphError, Result};

/// Installs the global tracing subscriber. Call once from the host process;
/// library code only emits events.
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| GraphError::InvalidArgument(format!("invalid log level: {e}")))?,
        )
        .with_target(true)
        .try_init()
        .map_err(|_| GraphError::InvalidArgument("logging already initialized".into()))
}
