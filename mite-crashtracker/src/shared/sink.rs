// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::shared::configuration::CrashSink;
use crate::shared::error::CrashtrackerError;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{AsRawFd, RawFd};

/// A crash sink with its descriptor already open.
///
/// Opening happens in ordinary code. The signal handler only borrows the raw
/// descriptor, so it never has to allocate or take a lock to emit a report.
#[derive(Debug)]
pub(crate) enum OpenSink {
    Stderr,
    File(File),
}

impl OpenSink {
    pub(crate) fn open(sink: &CrashSink) -> Result<Self, CrashtrackerError> {
        match sink {
            CrashSink::Stderr => Ok(Self::Stderr),
            CrashSink::File(path) => OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map(Self::File)
                .map_err(|source| CrashtrackerError::Sink {
                    path: path.clone(),
                    source,
                }),
        }
    }

    pub(crate) fn raw_fd(&self) -> RawFd {
        match self {
            Self::Stderr => libc::STDERR_FILENO,
            Self::File(file) => file.as_raw_fd(),
        }
    }
}

/// Unbuffered writer over a borrowed descriptor.
///
/// `write(2)` is async-signal-safe; `std::io::Stderr` is not, since it takes a
/// reentrant lock. Combined with `write!`, which formats into the writer piece by
/// piece, this lets the crash logger produce its lines without touching the heap.
pub(crate) struct FdWriter {
    fd: RawFd,
}

impl FdWriter {
    pub(crate) fn new(fd: RawFd) -> Self {
        Self { fd }
    }
}

impl Write for FdWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            // SAFETY: `buf` is valid for `buf.len()` bytes for the duration of the call.
            let rval =
                unsafe { libc::write(self.fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
            if rval >= 0 {
                return Ok(rval as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crash.txt");
        std::fs::write(&path, "existing\n").unwrap();

        let sink = OpenSink::open(&CrashSink::File(path.clone())).unwrap();
        let mut writer = FdWriter::new(sink.raw_fd());
        writeln!(writer, "[Mite] line {}", 1).unwrap();
        drop(sink);

        let mut contents = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "existing\n[Mite] line 1\n");
    }

    #[test]
    fn test_stderr_sink() {
        let sink = OpenSink::open(&CrashSink::Stderr).unwrap();
        assert_eq!(sink.raw_fd(), libc::STDERR_FILENO);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_unopenable_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("crash.txt");
        let err = OpenSink::open(&CrashSink::File(path)).unwrap_err();
        assert!(matches!(err, CrashtrackerError::Sink { .. }), "got {err:?}");
    }

    #[test]
    fn test_write_to_closed_fd_fails() {
        let mut writer = FdWriter::new(-1);
        writer.write_all(b"lost").unwrap_err();
    }
}
