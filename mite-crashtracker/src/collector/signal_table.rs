// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::crash_info::TrackedSignal;
use crate::shared::error::CrashtrackerError;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet};

/// The handler the controller swaps in for every tracked signal.
#[derive(Debug, Clone, Copy)]
pub struct HandlerDescriptor {
    pub entry: extern "C" fn(libc::c_int),
    /// Run the handler on the alternate signal stack (`SA_ONSTACK`).
    pub on_alt_stack: bool,
}

/// The process' signal dispositions.
///
/// This is the seam between the crashtracker and the OS. The controller only
/// uses `swap` and `restore`, from ordinary code. The signal handler only uses
/// `reset_to_default` and `raise`, which therefore must be async-signal-safe and
/// must not fail loudly: there is nobody left to report to.
pub trait SignalTable {
    /// Snapshot of a disposition, enough to put it back exactly.
    type Saved;

    /// Installs `handler` for `signal` and returns what it replaced.
    fn swap(
        &mut self,
        signal: TrackedSignal,
        handler: &HandlerDescriptor,
    ) -> Result<Self::Saved, CrashtrackerError>;

    /// Reinstalls a disposition previously returned by `swap`.
    fn restore(&mut self, signal: TrackedSignal, saved: &Self::Saved)
        -> Result<(), CrashtrackerError>;

    /// Sets the default disposition for a raw signal number.
    fn reset_to_default(&self, signum: libc::c_int);

    /// Delivers `signum` to the calling thread.
    fn raise(&self, signum: libc::c_int);
}

impl<T: SignalTable + ?Sized> SignalTable for &mut T {
    type Saved = T::Saved;

    fn swap(
        &mut self,
        signal: TrackedSignal,
        handler: &HandlerDescriptor,
    ) -> Result<Self::Saved, CrashtrackerError> {
        (**self).swap(signal, handler)
    }

    fn restore(
        &mut self,
        signal: TrackedSignal,
        saved: &Self::Saved,
    ) -> Result<(), CrashtrackerError> {
        (**self).restore(signal, saved)
    }

    fn reset_to_default(&self, signum: libc::c_int) {
        (**self).reset_to_default(signum)
    }

    fn raise(&self, signum: libc::c_int) {
        (**self).raise(signum)
    }
}

/// The real signal table, through `sigaction(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PosixSignalTable;

impl SignalTable for PosixSignalTable {
    type Saved = SigAction;

    fn swap(
        &mut self,
        signal: TrackedSignal,
        handler: &HandlerDescriptor,
    ) -> Result<SigAction, CrashtrackerError> {
        let flags = if handler.on_alt_stack {
            SaFlags::SA_ONSTACK
        } else {
            SaFlags::empty()
        };
        // No signals are blocked while the handler runs, beyond the one being handled.
        let sig_action = SigAction::new(SigHandler::Handler(handler.entry), flags, SigSet::empty());
        // SAFETY: the handler only calls async-signal-safe functions, apart from the
        // documented best-effort symbol resolution.
        unsafe { signal::sigaction(signal.into(), &sig_action) }
            .map_err(|source| CrashtrackerError::Register { signal, source })
    }

    fn restore(
        &mut self,
        signal: TrackedSignal,
        saved: &SigAction,
    ) -> Result<(), CrashtrackerError> {
        // SAFETY: the value restored here was returned from a previous sigaction call.
        unsafe { signal::sigaction(signal.into(), saved) }
            .map(|_| ())
            .map_err(|source| CrashtrackerError::Restore { signal, source })
    }

    fn reset_to_default(&self, signum: libc::c_int) {
        // Goes through libc rather than nix so that signal numbers nix does not know
        // about are still handled.
        // SAFETY: sigaction is async-signal-safe, and a zeroed sigaction with an
        // empty mask and SIG_DFL is a valid argument.
        unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = libc::SIG_DFL;
            libc::sigemptyset(&mut action.sa_mask);
            libc::sigaction(signum, &action, std::ptr::null_mut());
        }
    }

    fn raise(&self, signum: libc::c_int) {
        // SAFETY: raise is async-signal-safe.
        unsafe { libc::raise(signum) };
    }
}
