// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

#[cfg(all(unix, feature = "collector"))]
mod collector;
mod log;
pub mod result;

#[cfg(all(unix, feature = "collector"))]
pub use collector::*;
pub use log::*;
pub use result::MiteResult;

/// Constant greeting, used by bindings to check that the library is loaded and callable.
pub const MITE_HELLO: &std::ffi::CStr = c"Hello World!";

#[no_mangle]
#[must_use]
/// Returns a static, nul-terminated "Hello World!".
///
/// # Preconditions
///   None
/// # Safety
///   The returned pointer is valid for the lifetime of the process and must not be freed.
/// # Atomicity
///   This function is atomic and idempotent.
pub extern "C" fn mite_get_hello() -> *const libc::c_char {
    MITE_HELLO.as_ptr()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_hello() {
        // SAFETY: the pointer comes from a static C string.
        let hello = unsafe { CStr::from_ptr(mite_get_hello()) };
        assert_eq!(hello.to_str().unwrap(), "Hello World!");
        assert_eq!(mite_get_hello(), mite_get_hello());
    }
}
