// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::MiteResult;
use function_name::named;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

fn env_filter(level: LogLevel) -> EnvFilter {
    let directive = LevelFilter::from(level).to_string().to_lowercase();
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive))
}

#[no_mangle]
#[must_use]
#[named]
/// Sends the crashtracker's own diagnostics (installation, removal, errors
/// returned from this API) to stderr, at `level` or above. `RUST_LOG`, when
/// set, takes precedence over `level`.
///
/// Nothing is logged from inside the signal handler, whatever the level.
///
/// # Preconditions
///   None
/// # Safety
///   None
/// # Atomicity
///   Installs the process-wide `tracing` subscriber. Fails if one is already set.
pub extern "C" fn mite_crasht_init_logging(level: LogLevel) -> MiteResult {
    crate::wrap_with_mite_result!({
        tracing_subscriber::fmt()
            .with_env_filter(env_filter(level))
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow::anyhow!("{e}"))?;
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filters() {
        assert_eq!(LevelFilter::from(LogLevel::Error), LevelFilter::ERROR);
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::TRACE);
        let warn = LevelFilter::from(LogLevel::Warn);
        assert!(warn < LevelFilter::from(LogLevel::Debug));
    }

    #[test]
    fn test_init_logging_once() {
        assert_eq!(mite_crasht_init_logging(LogLevel::Debug), MiteResult::Ok);
        assert_eq!(mite_crasht_init_logging(LogLevel::Info), MiteResult::Err);
    }
}
