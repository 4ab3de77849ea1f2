// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::crash_info::TrackedSignal;

/// The signals the crashtracker intercepts, and what was installed for each of
/// them before it did.
///
/// `signals()[i]` and the saved slot `i` always describe the same signal. To keep
/// that true the signal list is fixed the first time the registry is populated;
/// later attempts leave it untouched, whatever list they bring.
#[derive(Debug)]
pub struct SignalRegistry<H> {
    populated: bool,
    signals: Vec<TrackedSignal>,
    saved: Vec<Option<H>>,
}

impl<H> Default for SignalRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> SignalRegistry<H> {
    pub const fn new() -> Self {
        Self {
            populated: false,
            signals: Vec::new(),
            saved: Vec::new(),
        }
    }

    /// Fixes the tracked signals, unless that already happened.
    /// Returns true if this call populated the registry.
    pub fn populate(&mut self, signals: &[TrackedSignal]) -> bool {
        if self.populated {
            return false;
        }
        self.signals = signals.to_vec();
        self.saved = signals.iter().map(|_| None).collect();
        self.populated = true;
        true
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    pub fn signals(&self) -> &[TrackedSignal] {
        &self.signals
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Stores the handler that was in place for `signals()[index]`.
    ///
    /// # Panics
    /// If `index` is out of range.
    pub fn save(&mut self, index: usize, handler: H) {
        self.saved[index] = Some(handler);
    }

    pub fn saved(&self, index: usize) -> Option<&H> {
        self.saved.get(index).and_then(Option::as_ref)
    }

    /// Removes and returns the saved handler for `signals()[index]`.
    pub fn take(&mut self, index: usize) -> Option<H> {
        self.saved.get_mut(index).and_then(Option::take)
    }

    /// Saved slots in registry order.
    pub fn saved_handlers(&self) -> &[Option<H>] {
        &self.saved
    }
}
