// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Constants shared between the signal handler and the code that configures it.
//!
//! The line prefixes form the diagnostic sink format. Every line written by the
//! crash logger starts with [`MITE_CRASHTRACK_LINE_PREFIX`] so that the report can
//! be picked out of an interleaved stderr stream.

/// Prefix of every line the crash logger writes.
pub const MITE_CRASHTRACK_LINE_PREFIX: &str = "[Mite]";

/// Marks the start of the frame list.
pub const MITE_CRASHTRACK_STACK_TRACE_HEADER: &str = "Stack trace:";

/// Maximum number of frames to collect in a backtrace.
///
/// This limit prevents runaway frame walking in case of stack corruption, and
/// sizes the on-stack buffer the handler captures into.
pub const MITE_CRASHTRACK_MAX_FRAMES: usize = 128;

/// Overrides the frame cap, `1..=128`.
pub const MITE_CRASHTRACK_MAX_FRAMES_ENV: &str = "MITE_CRASHTRACK_MAX_FRAMES";
/// Overrides the stacktrace collection mode: `disabled`, `without_symbols` or `in_process`.
pub const MITE_CRASHTRACK_RESOLVE_FRAMES_ENV: &str = "MITE_CRASHTRACK_RESOLVE_FRAMES";
/// Sends the report to the given file instead of stderr.
pub const MITE_CRASHTRACK_OUTPUT_ENV: &str = "MITE_CRASHTRACK_OUTPUT";
