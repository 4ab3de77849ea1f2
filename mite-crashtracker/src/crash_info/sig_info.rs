// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

/// The fatal signals the crashtracker knows how to intercept.
/// See <https://man7.org/linux/man-pages/man7/signal.7.html>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
#[repr(C)]
pub enum TrackedSignal {
    /// Abort signal, e.g. from `abort()`.
    SIGABRT,
    /// Bus error (bad memory access).
    SIGBUS,
    /// Floating-point exception.
    SIGFPE,
    /// Illegal instruction.
    SIGILL,
    /// Segmentation fault (invalid memory reference).
    SIGSEGV,
    /// Bad system call.
    SIGSYS,
    /// Trace/breakpoint trap.
    SIGTRAP,
}

/// Display name used when a signal number is not one of the tracked signals.
pub const UNKNOWN_SIGNAL_NAME: &str = "UNKNOWN";

impl TrackedSignal {
    /// All tracked signals, in registry order.
    pub const ALL: [TrackedSignal; 7] = [
        TrackedSignal::SIGABRT,
        TrackedSignal::SIGBUS,
        TrackedSignal::SIGFPE,
        TrackedSignal::SIGILL,
        TrackedSignal::SIGSEGV,
        TrackedSignal::SIGSYS,
        TrackedSignal::SIGTRAP,
    ];

    /// The platform signal number.
    pub fn signum(self) -> libc::c_int {
        match self {
            TrackedSignal::SIGABRT => libc::SIGABRT,
            TrackedSignal::SIGBUS => libc::SIGBUS,
            TrackedSignal::SIGFPE => libc::SIGFPE,
            TrackedSignal::SIGILL => libc::SIGILL,
            TrackedSignal::SIGSEGV => libc::SIGSEGV,
            TrackedSignal::SIGSYS => libc::SIGSYS,
            TrackedSignal::SIGTRAP => libc::SIGTRAP,
        }
    }

    pub fn from_signum(value: libc::c_int) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.signum() == value)
    }

    pub fn name(self) -> &'static str {
        match self {
            TrackedSignal::SIGABRT => "SIGABRT",
            TrackedSignal::SIGBUS => "SIGBUS",
            TrackedSignal::SIGFPE => "SIGFPE",
            TrackedSignal::SIGILL => "SIGILL",
            TrackedSignal::SIGSEGV => "SIGSEGV",
            TrackedSignal::SIGSYS => "SIGSYS",
            TrackedSignal::SIGTRAP => "SIGTRAP",
        }
    }
}

impl From<TrackedSignal> for nix::sys::signal::Signal {
    fn from(value: TrackedSignal) -> Self {
        match value {
            TrackedSignal::SIGABRT => nix::sys::signal::Signal::SIGABRT,
            TrackedSignal::SIGBUS => nix::sys::signal::Signal::SIGBUS,
            TrackedSignal::SIGFPE => nix::sys::signal::Signal::SIGFPE,
            TrackedSignal::SIGILL => nix::sys::signal::Signal::SIGILL,
            TrackedSignal::SIGSEGV => nix::sys::signal::Signal::SIGSEGV,
            TrackedSignal::SIGSYS => nix::sys::signal::Signal::SIGSYS,
            TrackedSignal::SIGTRAP => nix::sys::signal::Signal::SIGTRAP,
        }
    }
}

impl TryFrom<libc::c_int> for TrackedSignal {
    type Error = anyhow::Error;

    fn try_from(value: libc::c_int) -> Result<Self, Self::Error> {
        Self::from_signum(value)
            .ok_or_else(|| anyhow::anyhow!("Untracked signal number {value}"))
    }
}

/// The signals handled when the configuration does not name any.
pub fn default_signals() -> Vec<TrackedSignal> {
    TrackedSignal::ALL.to_vec()
}

/// Human-readable name of a raw signal number.
///
/// Callable from a signal handler: it neither allocates nor locks. Values outside the
/// tracked set map to [`UNKNOWN_SIGNAL_NAME`], which can happen if a signal is
/// re-raised or forwarded to the handler by other code.
pub fn signal_name(signum: libc::c_int) -> &'static str {
    match TrackedSignal::from_signum(signum) {
        Some(signal) => signal.name(),
        None => UNKNOWN_SIGNAL_NAME,
    }
}
