// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helpers shared by the collector tests.

use super::signal_table::{HandlerDescriptor, SignalTable};
use crate::crash_info::TrackedSignal;
use crate::shared::error::CrashtrackerError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serializes tests that touch process-wide state: real signal dispositions,
/// the process-wide controller, or the handler's globals.
pub(crate) static SIGNAL_TEST_LOCK: Mutex<()> = Mutex::new(());

/// The address of the handler currently installed for `signum`, or
/// `SIG_DFL`/`SIG_IGN`.
pub(crate) fn current_handler_address(signum: libc::c_int) -> usize {
    // SAFETY: a null `act` only queries the current disposition.
    unsafe {
        let mut current: libc::sigaction = std::mem::zeroed();
        assert_eq!(
            libc::sigaction(signum, std::ptr::null(), &mut current),
            0,
            "sigaction query failed for {signum}"
        );
        current.sa_sigaction
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    Default,
    Sentinel(u32),
    Handler { address: usize, on_alt_stack: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TableOp {
    Swap(TrackedSignal),
    Restore(TrackedSignal),
    ResetToDefault(libc::c_int),
    Raise(libc::c_int),
}

/// In-memory signal table. Every signal starts with the default disposition.
#[derive(Debug, Default)]
pub(crate) struct FakeSignalTable {
    dispositions: HashMap<TrackedSignal, Disposition>,
    fail_on: Option<TrackedSignal>,
    ops: RefCell<Vec<TableOp>>,
}

impl FakeSignalTable {
    pub(crate) fn with_sentinels() -> Self {
        let mut table = Self::default();
        for (i, signal) in TrackedSignal::ALL.into_iter().enumerate() {
            table.dispositions.insert(signal, Disposition::Sentinel(i as u32));
        }
        table
    }

    pub(crate) fn failing_on(mut self, signal: TrackedSignal) -> Self {
        self.fail_on = Some(signal);
        self
    }

    pub(crate) fn disposition(&self, signal: TrackedSignal) -> Disposition {
        self.dispositions
            .get(&signal)
            .copied()
            .unwrap_or(Disposition::Default)
    }

    pub(crate) fn ops(&self) -> Vec<TableOp> {
        self.ops.borrow().clone()
    }
}

impl SignalTable for FakeSignalTable {
    type Saved = Disposition;

    fn swap(
        &mut self,
        signal: TrackedSignal,
        handler: &HandlerDescriptor,
    ) -> Result<Disposition, CrashtrackerError> {
        self.ops.borrow_mut().push(TableOp::Swap(signal));
        if self.fail_on == Some(signal) {
            return Err(CrashtrackerError::Register {
                signal,
                source: nix::Error::EINVAL,
            });
        }
        let new = Disposition::Handler {
            address: handler.entry as usize,
            on_alt_stack: handler.on_alt_stack,
        };
        Ok(self
            .dispositions
            .insert(signal, new)
            .unwrap_or(Disposition::Default))
    }

    fn restore(
        &mut self,
        signal: TrackedSignal,
        saved: &Disposition,
    ) -> Result<(), CrashtrackerError> {
        self.ops.borrow_mut().push(TableOp::Restore(signal));
        self.dispositions.insert(signal, *saved);
        Ok(())
    }

    fn reset_to_default(&self, signum: libc::c_int) {
        self.ops.borrow_mut().push(TableOp::ResetToDefault(signum));
    }

    fn raise(&self, signum: libc::c_int) {
        self.ops.borrow_mut().push(TableOp::Raise(signum));
    }
}
