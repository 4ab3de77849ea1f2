// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg(unix)]

use super::emitters::emit_crash_report;
use super::signal_table::{PosixSignalTable, SignalTable};
use crate::shared::configuration::{CrashtrackerConfiguration, StacktraceCollection};
use crate::shared::constants::MITE_CRASHTRACK_MAX_FRAMES;
use crate::shared::error::CrashtrackerError;
use crate::shared::sink::{FdWriter, OpenSink};
use std::ptr;
use std::sync::atomic::Ordering::SeqCst;
use std::sync::atomic::{AtomicBool, AtomicPtr};

// Note that this file makes use the following async-signal safe functions in a signal handler.
// <https://man7.org/linux/man-pages/man7/signal-safety.7.html>
// - raise
// - sigaction
// - write
// Symbol resolution, when enabled, is the exception; see `StacktraceCollection`.

/// What the signal handler needs to emit a report, prepared ahead of time.
#[derive(Debug)]
struct HandlerState {
    resolve_frames: StacktraceCollection,
    max_frames: usize,
    sink: OpenSink,
}

// Using mutexes inside a signal handler is not allowed, so use `AtomicPtr`
// instead to get atomicity.
// This is always either null_mut, or `Box::into_raw()`.
static HANDLER_STATE: AtomicPtr<HandlerState> = AtomicPtr::new(ptr::null_mut());
static ENABLED: AtomicBool = AtomicBool::new(true);
// Set while a report is being written. A signal raised by the report itself
// skips straight to the default disposition.
static REPORTING: AtomicBool = AtomicBool::new(false);

/// Prepares the state the signal handler reads: the stacktrace settings and an
/// open sink.
///
/// PRECONDITIONS:
///     None
/// SAFETY:
///     Crash-tracking functions are not guaranteed to be reentrant.
///     No other crash-handler functions should be called concurrently.
/// ATOMICITY:
///     This function uses a swap on an atomic pointer. The state it replaces is
///     never freed, so a handler running on another thread can keep using it.
///     Each call therefore leaves one more sink descriptor open.
pub(crate) fn update_handler_state(
    config: &CrashtrackerConfiguration,
) -> Result<(), CrashtrackerError> {
    let sink = OpenSink::open(config.sink())?;
    let box_ptr = Box::into_raw(Box::new(HandlerState {
        resolve_frames: config.resolve_frames(),
        max_frames: config.max_frames(),
        sink,
    }));
    // The previous state is leaked, see ATOMICITY.
    HANDLER_STATE.store(box_ptr, SeqCst);
    tracing::debug!(
        resolve_frames = ?config.resolve_frames(),
        max_frames = config.max_frames(),
        sink = ?config.sink(),
        "Crash handler state updated"
    );
    Ok(())
}

/// Disables the crashtracker.
/// Note that this does not restore the old signal handlers, but rather turns the crash report
/// into a no-op. The signal still gets its default disposition and is re-raised, so the
/// process dies the way it would have.
///
/// # Preconditions
///   None
/// # Safety
///   None
/// # Atomicity
///   This function is atomic and idempotent.  Calling it multiple times is allowed.
pub fn disable() {
    ENABLED.store(false, SeqCst);
    tracing::debug!("Crash reports disabled");
}

/// Enables the crashtracker, if had been previously disabled.
/// If the crash handlers are not installed, this function will have no effect.
///
/// # Preconditions
///   None
/// # Safety
///   None
/// # Atomicity
///   This function is atomic and idempotent.  Calling it multiple times is allowed.
pub fn enable() {
    ENABLED.store(true, SeqCst);
    tracing::debug!("Crash reports enabled");
}

pub fn is_enabled() -> bool {
    ENABLED.load(SeqCst)
}

/// The entry point registered with the OS for every tracked signal.
pub(crate) extern "C" fn handle_posix_signal(signum: libc::c_int) {
    deliver_fatal_signal(&PosixSignalTable, signum, report_crash);
}

/// Runs the delivery sequence for a fatal signal: report it (unless reporting
/// is disabled), give the signal its default disposition, then raise it again.
///
/// The last two steps always happen, whatever the report did. The signal being
/// handled stays blocked until the handler returns, so the raised signal is
/// delivered, and the process terminated, right after that.
pub fn deliver_fatal_signal<T: SignalTable + ?Sized>(
    table: &T,
    signum: libc::c_int,
    report: impl FnOnce(libc::c_int),
) {
    if ENABLED.load(SeqCst) {
        report(signum);
    }
    table.reset_to_default(signum);
    table.raise(signum);
}

fn report_crash(signum: libc::c_int) {
    if REPORTING.swap(true, SeqCst) {
        return;
    }
    let state = HANDLER_STATE.load(SeqCst);
    let (fd, resolve_frames, max_frames) = if state.is_null() {
        (
            libc::STDERR_FILENO,
            StacktraceCollection::default(),
            MITE_CRASHTRACK_MAX_FRAMES,
        )
    } else {
        // Safety: non-null values only come from `update_handler_state`.
        let state = unsafe { &*state };
        (state.sink.raw_fd(), state.resolve_frames, state.max_frames)
    };
    // Nobody is left to report a failure to.
    let _ = emit_crash_report(&mut FdWriter::new(fd), signum, resolve_frames, max_frames);
    REPORTING.store(false, SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::test_utils::{FakeSignalTable, TableOp, SIGNAL_TEST_LOCK};
    use crate::crash_info::{default_signals, TrackedSignal};
    use crate::shared::configuration::CrashSink;
    use std::cell::Cell;

    fn file_config(path: std::path::PathBuf, max_frames: usize) -> CrashtrackerConfiguration {
        CrashtrackerConfiguration::new(
            false,
            false,
            max_frames,
            StacktraceCollection::WithoutSymbols,
            default_signals(),
            CrashSink::File(path),
        )
        .unwrap()
    }

    fn reset_handler_state() {
        let default = CrashtrackerConfiguration::default();
        update_handler_state(&default).unwrap();
    }

    #[test]
    fn test_delivery_order() {
        let _guard = SIGNAL_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let table = FakeSignalTable::default();
        let reported = Cell::new(None);
        deliver_fatal_signal(&table, libc::SIGSEGV, |signum| {
            reported.set(Some((signum, table.ops().len())))
        });
        // The report came first, before any change to the signal table.
        assert_eq!(reported.get(), Some((libc::SIGSEGV, 0)));
        assert_eq!(
            table.ops(),
            vec![
                TableOp::ResetToDefault(libc::SIGSEGV),
                TableOp::Raise(libc::SIGSEGV)
            ]
        );
    }

    #[test]
    fn test_disabled_skips_report_only() {
        let _guard = SIGNAL_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let table = FakeSignalTable::default();
        disable();
        assert!(!is_enabled());
        let reported = Cell::new(false);
        deliver_fatal_signal(&table, libc::SIGBUS, |_| reported.set(true));
        enable();
        assert!(is_enabled());

        assert!(!reported.get());
        assert_eq!(
            table.ops(),
            vec![
                TableOp::ResetToDefault(libc::SIGBUS),
                TableOp::Raise(libc::SIGBUS)
            ]
        );
    }

    #[test]
    fn test_unknown_signal_still_reraised() {
        let _guard = SIGNAL_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let table = FakeSignalTable::default();
        deliver_fatal_signal(&table, 0, |_| {});
        let expected = vec![TableOp::ResetToDefault(0), TableOp::Raise(0)];
        assert_eq!(table.ops(), expected);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_report_to_file_sink() {
        let _guard = SIGNAL_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crash.txt");
        update_handler_state(&file_config(path.clone(), 4)).unwrap();

        report_crash(libc::SIGILL);
        reset_handler_state();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(
            lines[0],
            format!("[Mite] App crashed with signal {} (SIGILL)", libc::SIGILL)
        );
        assert_eq!(lines[1], "[Mite] Stack trace:");
        assert_eq!(lines.len(), 2 + 4, "{contents}");
        assert!(lines[2..].iter().all(|l| l.starts_with("[Mite] #")));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_reentrant_report_is_skipped() {
        let _guard = SIGNAL_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crash.txt");
        update_handler_state(&file_config(path.clone(), 1)).unwrap();

        REPORTING.store(true, SeqCst);
        report_crash(libc::SIGFPE);
        REPORTING.store(false, SeqCst);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

        report_crash(libc::SIGFPE);
        reset_handler_state();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 3, "{contents}");
        assert!(contents.contains(TrackedSignal::SIGFPE.name()));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_replaced_state_keeps_its_sink_open() {
        use std::io::Write;

        let _guard = SIGNAL_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crash.txt");
        update_handler_state(&file_config(path.clone(), 2)).unwrap();
        let replaced = HANDLER_STATE.load(SeqCst);
        reset_handler_state();
        assert_ne!(HANDLER_STATE.load(SeqCst), replaced);

        // Safety: handler states are never freed.
        let fd = unsafe { (*replaced).sink.raw_fd() };
        writeln!(FdWriter::new(fd), "late line").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "late line\n");
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_update_rejects_unopenable_sink() {
        let _guard = SIGNAL_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let config = file_config(dir.path().join("nope").join("crash.txt"), 8);
        let err = update_handler_state(&config).unwrap_err();
        assert!(matches!(err, CrashtrackerError::Sink { .. }), "got {err:?}");
    }
}
