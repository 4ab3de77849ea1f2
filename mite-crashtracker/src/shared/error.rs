// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::crash_info::TrackedSignal;
use std::path::PathBuf;

/// Errors surfaced while configuring, installing or removing the crash handlers.
///
/// None of these are produced from inside the signal handler: once a signal has
/// been delivered, failures are swallowed so the process still dies the way it
/// natively would.
#[derive(Debug, thiserror::Error)]
pub enum CrashtrackerError {
    #[error("Unable to register signal handler for {signal:?}: {source}")]
    Register {
        signal: TrackedSignal,
        #[source]
        source: nix::Error,
    },
    #[error("Unable to restore signal handler for {signal:?}: {source}")]
    Restore {
        signal: TrackedSignal,
        #[source]
        source: nix::Error,
    },
    #[error("Invalid crashtracker configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to set up the alternate signal stack: {0}")]
    AltStack(String),
    #[error("Failed to open crash report sink {path:?}: {source}")]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
