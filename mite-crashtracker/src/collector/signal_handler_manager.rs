// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0
use super::crash_handler::{handle_posix_signal, update_handler_state};
use super::signal_registry::SignalRegistry;
use super::signal_table::{HandlerDescriptor, PosixSignalTable, SignalTable};
use crate::crash_info::TrackedSignal;
use crate::shared::configuration::CrashtrackerConfiguration;
use crate::shared::error::CrashtrackerError;
use libc::{
    mmap, munmap, sigaltstack, MAP_ANON, MAP_FAILED, MAP_PRIVATE, PROT_NONE, PROT_READ,
    PROT_WRITE, SIGSTKSZ,
};
use std::ptr;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::SeqCst;
use std::sync::{Mutex, PoisonError};

/// Owns the tracked signals and the dispositions they had before the crash
/// handler was swapped in.
///
/// Installing and removing are both idempotent. Dropping the controller puts back
/// every disposition it replaced, including after a partial installation.
pub struct HandlerController<T: SignalTable> {
    table: T,
    registry: SignalRegistry<T::Saved>,
    descriptor: HandlerDescriptor,
    installed: bool,
}

impl<T: SignalTable> HandlerController<T> {
    pub fn new(table: T, signals: &[TrackedSignal], descriptor: HandlerDescriptor) -> Self {
        let mut registry = SignalRegistry::new();
        registry.populate(signals);
        Self {
            table,
            registry,
            descriptor,
            installed: false,
        }
    }

    /// Swaps the crash handler in for every tracked signal, in registry order,
    /// remembering what each one replaced.
    ///
    /// Does nothing if the handlers are already installed.
    /// An error from the OS stops the installation where it is: signals swapped
    /// before the failure keep the crash handler, and the controller stays
    /// uninstalled. A later call only swaps the signals that are still missing,
    /// while [`Self::remove_crash_handlers`] puts the swapped ones back.
    pub fn install_crash_handlers(&mut self) -> Result<(), CrashtrackerError> {
        if self.installed {
            return Ok(());
        }
        for index in 0..self.registry.len() {
            if self.registry.saved(index).is_some() {
                continue;
            }
            let signal = self.registry.signals()[index];
            let saved = self.table.swap(signal, &self.descriptor)?;
            self.registry.save(index, saved);
        }
        self.installed = true;
        Ok(())
    }

    /// Puts back every disposition saved by [`Self::install_crash_handlers`],
    /// whether or not that installation completed.
    ///
    /// Does nothing if no disposition is saved.
    pub fn remove_crash_handlers(&mut self) -> Result<(), CrashtrackerError> {
        for index in 0..self.registry.len() {
            let signal = self.registry.signals()[index];
            if let Some(saved) = self.registry.saved(index) {
                self.table.restore(signal, saved)?;
            }
            self.registry.take(index);
        }
        self.installed = false;
        Ok(())
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Whether any signal still holds the crash handler, fully installed or not.
    pub fn has_saved_handlers(&self) -> bool {
        self.registry.saved_handlers().iter().any(Option::is_some)
    }

    pub fn registry(&self) -> &SignalRegistry<T::Saved> {
        &self.registry
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    /// Changes the handler used by the next installation.
    /// Returns false, and changes nothing, while the handlers are installed.
    pub fn set_descriptor(&mut self, descriptor: HandlerDescriptor) -> bool {
        if self.installed {
            return false;
        }
        self.descriptor = descriptor;
        true
    }
}

impl<T: SignalTable> Drop for HandlerController<T> {
    fn drop(&mut self) {
        if let Err(e) = self.remove_crash_handlers() {
            tracing::warn!("Failed to remove crash handlers on drop: {e}");
        }
    }
}

static CONTROLLER: Mutex<Option<HandlerController<PosixSignalTable>>> = Mutex::new(None);
static ALTSTACK_INIT: AtomicBool = AtomicBool::new(false);

/// Installs the crash handlers for this process.
///
/// The tracked signals are fixed by the first call; later calls with a
/// different signal list keep the original one. Returns immediately if the
/// handlers are already installed.
///
/// PRECONDITIONS:
///     None
/// SAFETY:
///     Crash-tracking functions are not guaranteed to be reentrant.
///     No other crash-handler functions should be called concurrently.
/// ATOMICITY:
///     Swapping the handlers is not atomic. A crash while this function runs may
///     find some signals handled by the crash handler and others not.
pub fn install_crash_handlers(config: CrashtrackerConfiguration) -> Result<(), CrashtrackerError> {
    let mut controller = CONTROLLER.lock().unwrap_or_else(PoisonError::into_inner);
    if controller.as_ref().is_some_and(|c| c.is_installed()) {
        tracing::debug!("Crash handlers already installed");
        return Ok(());
    }

    update_handler_state(&config)?;
    if config.create_alt_stack() {
        create_alt_stack_once()?;
    }

    let descriptor = HandlerDescriptor {
        entry: handle_posix_signal,
        on_alt_stack: config.use_alt_stack(),
    };
    let controller = controller.get_or_insert_with(|| {
        HandlerController::new(PosixSignalTable, config.signals(), descriptor)
    });
    if controller.registry().signals() != config.signals() {
        tracing::warn!(
            tracked = ?controller.registry().signals(),
            requested = ?config.signals(),
            "The tracked signals are fixed by the first installation, ignoring the requested ones"
        );
    }
    controller.set_descriptor(descriptor);
    controller.install_crash_handlers()?;
    tracing::info!(
        signals = ?controller.registry().signals(),
        "Crash handlers installed"
    );
    Ok(())
}

/// Restores the signal handlers that were in place before
/// [`install_crash_handlers`], including those swapped by an installation that
/// failed partway. Returns immediately if nothing is installed.
///
/// PRECONDITIONS:
///     None
/// SAFETY:
///     Crash-tracking functions are not guaranteed to be reentrant.
///     No other crash-handler functions should be called concurrently.
/// ATOMICITY:
///     Not atomic, see [`install_crash_handlers`].
pub fn remove_crash_handlers() -> Result<(), CrashtrackerError> {
    let mut controller = CONTROLLER.lock().unwrap_or_else(PoisonError::into_inner);
    match controller.as_mut() {
        Some(controller) if controller.has_saved_handlers() => {
            controller.remove_crash_handlers()?;
            tracing::info!("Crash handlers removed");
        }
        _ => tracing::debug!("Crash handlers not installed, nothing to remove"),
    }
    Ok(())
}

pub fn is_installed() -> bool {
    CONTROLLER
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .is_some_and(HandlerController::is_installed)
}

fn create_alt_stack_once() -> Result<(), CrashtrackerError> {
    if ALTSTACK_INIT
        .compare_exchange(false, true, SeqCst, SeqCst)
        .is_err()
    {
        return Ok(());
    }
    // Safety: This function has no documented preconditions.
    let result = unsafe { create_alt_stack() };
    match &result {
        Ok(()) => tracing::debug!("Alternate signal stack created"),
        Err(e) => {
            ALTSTACK_INIT.store(false, SeqCst);
            tracing::error!("{e}");
        }
    }
    result
}

/// Allocates a signal altstack, and puts a guard page at the end.
/// Inspired by https://github.com/rust-lang/rust/pull/69969/files
unsafe fn create_alt_stack() -> Result<(), CrashtrackerError> {
    // The altstack is the greater of 16 pages or SIGSTKSZ: symbol resolution
    // easily needs more than the default 8KB.
    let page_size = page_size::get();
    let sigalstack_base_size = std::cmp::max(SIGSTKSZ, 16 * page_size);
    let stackp = mmap(
        ptr::null_mut(),
        sigalstack_base_size + page_size,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANON,
        -1,
        0,
    );
    if stackp == MAP_FAILED {
        return Err(CrashtrackerError::AltStack(
            "failed to allocate an alternative stack".to_string(),
        ));
    }
    if libc::mprotect(stackp, page_size, PROT_NONE) != 0 {
        munmap(stackp, sigalstack_base_size + page_size);
        return Err(CrashtrackerError::AltStack(
            "failed to set up alternative stack guard page".to_string(),
        ));
    }
    let stackp = stackp.add(page_size);

    let stack = libc::stack_t {
        ss_sp: stackp,
        ss_flags: 0,
        ss_size: sigalstack_base_size,
    };
    let rval = sigaltstack(&stack, ptr::null_mut());
    if rval != 0 {
        munmap(stackp.sub(page_size), sigalstack_base_size + page_size);
        return Err(CrashtrackerError::AltStack(format!(
            "sigaltstack failed {rval}"
        )));
    }
    Ok(())
}
