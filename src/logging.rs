//! File logging. The terminal belongs to the dashboard, so events go to
//! `<data-dir>/energy-dash.log`.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "energy-dash.log";

/// Build the filter: explicit level first, then `RUST_LOG`, then `info`.
pub fn filter(level: Option<&str>) -> Result<EnvFilter> {
    match level {
        Some(level) => {
            EnvFilter::try_new(level).with_context(|| format!("invalid log level '{level}'"))
        }
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
    }
}

/// Install the global subscriber. Keep the guard alive until exit or
/// buffered events are lost.
pub fn init(data_dir: &Path, level: Option<&str>) -> Result<WorkerGuard> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("cannot create log directory {data_dir:?}"))?;
    let appender = tracing_appender::rolling::never(data_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter(level)?)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!(e))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_level_is_parsed() {
        assert!(filter(Some("debug")).is_ok());
        assert!(filter(Some("energy_dash=trace,reqwest=warn")).is_ok());
    }

    #[test]
    fn test_bad_level_is_an_error() {
        let err = filter(Some("energy_dash=loud")).unwrap_err();
        assert!(err.to_string().contains("invalid log level"));
    }
}
