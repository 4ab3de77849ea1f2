// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! This crate implements an in-process crashtracker based on catching UNIX
//! signals and logging them.
//!
//! When installed, it swaps its own handler in for the fatal signals the
//! process is configured to track (by default SIGABRT, SIGBUS, SIGFPE, SIGILL,
//! SIGSEGV, SIGSYS and SIGTRAP), remembering the handlers it replaced so that
//! removing it puts them back exactly.
//!
//! When one of these signals is delivered, the handler:
//! 1. Writes a short report to the configured sink (stderr by default): the
//!    signal number and name, followed by a stack trace of the crashing thread,
//!    one line per frame.
//!    The handler runs under a constrained environment where many standard
//!    operations are illegal.
//!    https://man7.org/linux/man-pages/man7/signal-safety.7.html
//!    In particular, memory allocation, and synchronization such as mutexes are
//!    potentially UB. The report is therefore written with `write(2)` straight
//!    to a descriptor opened at install time, from fixed-size buffers.
//!    Resolving frames to symbols is the one exception, and can be turned off.
//! 2. Restores the *default* disposition for the signal, and raises it again,
//!    so that the process terminates exactly as it would have without the
//!    crashtracker (exit status, core dump).
//!
//! Every line of the report starts with `[Mite]`:
//! ```text
//! [Mite] App crashed with signal 11 (SIGSEGV)
//! [Mite] Stack trace:
//! [Mite] #0   0x000055f3d1c2a0b4 in crashing_fn at src/main.rs:12
//! ```
#![cfg(unix)]
#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

#[cfg(feature = "collector")]
mod collector;
mod crash_info;
mod shared;

#[cfg(feature = "collector")]
pub use collector::*;
pub use crash_info::*;
pub use shared::configuration::{CrashSink, CrashtrackerConfiguration, StacktraceCollection};
pub use shared::constants::*;
pub use shared::error::CrashtrackerError;
