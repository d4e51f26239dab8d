use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Installs the stderr subscriber. An explicit filter wins over `RUST_LOG`,
/// which wins over `DEFAULT_LOG_FILTER`.
pub fn init(explicit_filter: Option<&str>) -> Result<()> {
    let filter = match explicit_filter {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter '{directives}'"))?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
            .context("invalid default log filter")?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install logger: {err}"))
}
