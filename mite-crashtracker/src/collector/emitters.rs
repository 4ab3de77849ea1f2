// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::crash_info::{CapturedStack, CrashReport};
use crate::shared::configuration::StacktraceCollection;
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmitterError {
    #[error("Failed to write to output: {0}")]
    WriteError(#[from] std::io::Error),
}

/// Emits the crash report for `signum`, with a stack trace of the calling thread,
/// onto the given handle.
///
/// The frames are captured on the stack of the caller, innermost first. This
/// includes the frames of the crash handler itself, which sit above the frame
/// that faulted.
///
/// SAFETY:
///     Crash-tracking functions are not reentrant.
///     No other crash-handler functions should be called concurrently.
/// ATOMICITY:
///     This function is not atomic. A crash during its execution may leave a
///     partial report on the handle; every completed line is already written.
/// SIGNAL SAFETY:
///     Nothing here allocates. Frame capture is believed to be signal safe,
///     symbol resolution is not, see [`StacktraceCollection`].
#[inline(never)]
pub fn emit_crash_report(
    w: &mut impl Write,
    signum: libc::c_int,
    resolve_frames: StacktraceCollection,
    max_frames: usize,
) -> Result<(), EmitterError> {
    let mut stack = CapturedStack::new();
    if resolve_frames != StacktraceCollection::Disabled {
        stack.capture(max_frames);
    }
    let report = CrashReport::new(signum, stack.frames(), resolve_frames);
    report.write_to(w)?;
    w.flush()?;
    Ok(())
}
