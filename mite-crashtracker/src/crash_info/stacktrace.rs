// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::shared::configuration::StacktraceCollection;
use crate::shared::constants::MITE_CRASHTRACK_MAX_FRAMES;
use std::io::{self, Write};

/// Instruction pointers of the current thread, innermost first.
///
/// The storage is a fixed array so that capturing from a signal handler never
/// allocates, and never walks more than [`MITE_CRASHTRACK_MAX_FRAMES`] frames.
pub struct CapturedStack {
    ips: [usize; MITE_CRASHTRACK_MAX_FRAMES],
    len: usize,
}

impl Default for CapturedStack {
    fn default() -> Self {
        Self::new()
    }
}

impl CapturedStack {
    pub const fn new() -> Self {
        Self {
            ips: [0; MITE_CRASHTRACK_MAX_FRAMES],
            len: 0,
        }
    }

    /// Walks the current stack, keeping at most `max_frames` frames (clamped to the
    /// buffer size). Returns the number of frames kept.
    ///
    /// SIGNAL SAFETY:
    ///     Getting a backtrace on rust is not guaranteed to be signal safe.
    ///     https://github.com/rust-lang/backtrace-rs/issues/414
    ///     Calculating the `ip` of the frames seems safe, which is all this does.
    #[inline(never)]
    pub fn capture(&mut self, max_frames: usize) -> usize {
        let cap = max_frames.min(MITE_CRASHTRACK_MAX_FRAMES);
        let ips = &mut self.ips[..cap];
        let mut len = 0;
        if cap > 0 {
            // SAFETY: no other thread is unwinding through this buffer, and the
            // callback neither allocates nor panics.
            unsafe {
                backtrace::trace_unsynchronized(|frame| {
                    ips[len] = frame.ip() as usize;
                    len += 1;
                    len < ips.len()
                })
            };
        }
        self.len = len;
        len
    }

    pub fn frames(&self) -> &[usize] {
        &self.ips[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Writes the best description available for one frame, without a trailing newline.
///
/// With [`StacktraceCollection::EnabledWithInprocessSymbols`] the nearest symbol
/// and its source location are appended when they can be resolved. Anything that
/// cannot be resolved degrades to the raw address, so one bad frame never costs
/// the rest of the report.
pub fn write_frame_description(
    w: &mut impl Write,
    index: usize,
    ip: usize,
    resolve_frames: StacktraceCollection,
) -> io::Result<()> {
    write!(w, "#{index:<3} {ip:#018x}")?;
    if resolve_frames != StacktraceCollection::EnabledWithInprocessSymbols {
        return Ok(());
    }

    let mut result = Ok(());
    let mut resolved = false;
    // SAFETY: see the signal safety note on `CapturedStack::capture`; resolution is
    // best effort and may itself fault on a badly corrupted process.
    unsafe {
        backtrace::resolve_unsynchronized(ip as *mut libc::c_void, |symbol| {
            // Inlined frames report several symbols for one address; the first is
            // the innermost, which is the one that matters.
            if resolved || result.is_err() {
                return;
            }
            resolved = true;
            result = (|| {
                if let Some(name) = symbol.name() {
                    write!(w, " in {name}")?;
                }
                if let Some(file) = symbol.filename() {
                    write!(w, " at {}", file.display())?;
                    if let Some(line) = symbol.lineno() {
                        write!(w, ":{line}")?;
                    }
                }
                Ok(())
            })();
        })
    };
    result
}
