// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0
use crate::MiteResult;
use function_name::named;
use mite_crashtracker::CrashtrackerConfiguration;
use std::ffi::CStr;

#[no_mangle]
#[must_use]
#[named]
/// Installs the crash handlers with the default configuration, adjusted by the
/// `MITE_CRASHTRACK_*` environment variables.
/// Calling it while the handlers are installed has no effect.
///
/// # Preconditions
///   None.
/// # Safety
///   Crash-tracking functions are not reentrant.
///   No other crash-handler functions should be called concurrently.
/// # Atomicity
///   This function is not atomic. A crash during its execution may lead to
///   unexpected crash-handling behaviour.
pub unsafe extern "C" fn mite_crasht_install() -> MiteResult {
    crate::wrap_with_mite_result!({
        mite_crashtracker::install_crash_handlers(CrashtrackerConfiguration::from_env()?)?;
    })
}

#[no_mangle]
#[must_use]
#[named]
/// Installs the crash handlers with a JSON configuration, for example
/// `{"signals": ["SIGSEGV", "SIGABRT"], "max_frames": 64, "sink": {"file": "/tmp/crash.log"}}`.
/// Missing fields take their default value.
///
/// # Preconditions
///   `config_json` is a nul-terminated UTF-8 string.
/// # Safety
///   `config_json` must be null or point to a valid C string.
///   Crash-tracking functions are not reentrant.
///   No other crash-handler functions should be called concurrently.
/// # Atomicity
///   This function is not atomic. A crash during its execution may lead to
///   unexpected crash-handling behaviour.
pub unsafe extern "C" fn mite_crasht_install_with_config(
    config_json: *const libc::c_char,
) -> MiteResult {
    crate::wrap_with_mite_result!({
        anyhow::ensure!(!config_json.is_null(), "config_json is null");
        let json = CStr::from_ptr(config_json).to_str()?;
        mite_crashtracker::install_crash_handlers(CrashtrackerConfiguration::from_json(json)?)?;
    })
}

#[no_mangle]
#[must_use]
#[named]
/// Restores the signal handlers that were in place before the crashtracker was installed.
/// Calling it while the handlers are not installed has no effect.
///
/// # Preconditions
///   None.
/// # Safety
///   Crash-tracking functions are not reentrant.
///   No other crash-handler functions should be called concurrently.
/// # Atomicity
///   This function is not atomic.
pub unsafe extern "C" fn mite_crasht_remove() -> MiteResult {
    crate::wrap_with_mite_result!({
        mite_crashtracker::remove_crash_handlers()?;
    })
}

#[no_mangle]
#[must_use]
/// Disables the crash report.
/// Note that this does not restore the old signal handlers: a tracked signal still
/// gets its default disposition and is re-raised, only the report is skipped.
///
/// # Preconditions
///   None
/// # Safety
///   None
/// # Atomicity
///   This function is atomic and idempotent.  Calling it multiple times is allowed.
pub unsafe extern "C" fn mite_crasht_disable() -> MiteResult {
    mite_crashtracker::disable();
    MiteResult::Ok
}

#[no_mangle]
#[must_use]
/// Enables the crash report, if it had been previously disabled.
///
/// # Preconditions
///   None
/// # Safety
///   None
/// # Atomicity
///   This function is atomic and idempotent.  Calling it multiple times is allowed.
pub unsafe extern "C" fn mite_crasht_enable() -> MiteResult {
    mite_crashtracker::enable();
    MiteResult::Ok
}

#[no_mangle]
#[must_use]
/// Whether the crash handlers are currently installed.
///
/// # Safety
///   None
pub extern "C" fn mite_crasht_is_installed() -> bool {
    mite_crashtracker::is_installed()
}
