// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod sig_info;
mod stacktrace;

pub use sig_info::*;
pub use stacktrace::*;

use crate::shared::configuration::StacktraceCollection;
use crate::shared::constants::{MITE_CRASHTRACK_LINE_PREFIX, MITE_CRASHTRACK_STACK_TRACE_HEADER};
use std::io::{self, Write};

/// What is known about a crash at the moment the signal is delivered.
///
/// A report borrows everything it describes and is written out exactly once; it
/// is never stored.
pub struct CrashReport<'a> {
    signum: libc::c_int,
    frames: &'a [usize],
    resolve_frames: StacktraceCollection,
}

impl<'a> CrashReport<'a> {
    pub fn new(
        signum: libc::c_int,
        frames: &'a [usize],
        resolve_frames: StacktraceCollection,
    ) -> Self {
        Self {
            signum,
            frames,
            resolve_frames,
        }
    }

    pub fn signum(&self) -> libc::c_int {
        self.signum
    }

    pub fn signal_name(&self) -> &'static str {
        signal_name(self.signum)
    }

    pub fn frames(&self) -> &[usize] {
        self.frames
    }

    /// Writes the report in the sink format:
    ///
    /// ```text
    /// [Mite] App crashed with signal 11 (SIGSEGV)
    /// [Mite] Stack trace:
    /// [Mite] #0   0x000055f3d1c2a0b4 in crashing_fn at src/main.rs:12
    /// ```
    ///
    /// Each frame line is flushed as soon as it is written, so a crash while
    /// resolving one frame still leaves the previous ones on the sink.
    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(
            w,
            "{MITE_CRASHTRACK_LINE_PREFIX} App crashed with signal {} ({})",
            self.signum,
            self.signal_name()
        )?;
        writeln!(
            w,
            "{MITE_CRASHTRACK_LINE_PREFIX} {MITE_CRASHTRACK_STACK_TRACE_HEADER}"
        )?;
        w.flush()?;
        for (index, ip) in self.frames.iter().enumerate() {
            write!(w, "{MITE_CRASHTRACK_LINE_PREFIX} ")?;
            write_frame_description(w, index, *ip, self.resolve_frames)?;
            writeln!(w)?;
            w.flush()?;
        }
        Ok(())
    }
}
