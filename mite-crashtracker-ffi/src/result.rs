// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Outcome of a fallible FFI call. Details of an error are logged through
/// `tracing` before it is returned, see `mite_crasht_init_logging`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiteResult {
    Ok,
    Err,
}

impl From<anyhow::Result<()>> for MiteResult {
    fn from(value: anyhow::Result<()>) -> Self {
        match value {
            Ok(()) => MiteResult::Ok,
            Err(e) => {
                tracing::error!("{e:#}");
                MiteResult::Err
            }
        }
    }
}

/// Wraps a C-FFI function body in standard form: errors get the name of the
/// function as context, panics are caught, and both become `MiteResult::Err`.
/// Expects the function to be decorated with #[named].
#[macro_export]
macro_rules! wrap_with_mite_result {
    ($body:block) => {{
        use anyhow::Context;
        use std::panic::{catch_unwind, AssertUnwindSafe};

        let result: anyhow::Result<()> = catch_unwind(AssertUnwindSafe(|| {
            (|| {
                $body;
                anyhow::Ok(())
            })()
            .context(concat!(function_name!(), " failed"))
        }))
        .unwrap_or_else(|e| {
            Err($crate::result::handle_panic_error(e, function_name!()))
        });
        $crate::MiteResult::from(result)
    }};
}

/// You probably don't want to use this directly. This is used by `wrap_with_mite_result` to
/// turn a panic payload into an error naming the function that panicked.
pub fn handle_panic_error(
    error: Box<dyn std::any::Any + Send + 'static>,
    function_name: &str,
) -> anyhow::Error {
    // This pattern of String vs &str comes from
    // https://doc.rust-lang.org/std/panic/struct.PanicHookInfo.html#method.payload
    if let Some(s) = error.downcast_ref::<String>() {
        anyhow::anyhow!("{} failed: (panic) {}", function_name, s)
    } else if let Some(s) = error.downcast_ref::<&str>() {
        anyhow::anyhow!("{} failed: (panic) {}", function_name, s)
    } else {
        anyhow::anyhow!(
            "{} failed: (panic) Unable to retrieve panic context",
            function_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use function_name::named;

    #[test]
    #[named]
    #[allow(clippy::redundant_closure_call)]
    fn test_wrap_turns_panic_into_error() {
        let result = wrap_with_mite_result!({
            panic!("boom");
        });
        assert_eq!(result, MiteResult::Err);
    }

    #[test]
    #[named]
    #[allow(clippy::redundant_closure_call)]
    fn test_wrap_propagates_errors() {
        let result = wrap_with_mite_result!({
            let frames = 0;
            anyhow::ensure!(frames > 0, "no frames");
        });
        assert_eq!(result, MiteResult::Err);

        let result = wrap_with_mite_result!({
            let frames = 1;
            anyhow::ensure!(frames > 0, "no frames");
        });
        assert_eq!(result, MiteResult::Ok);
    }

    #[test]
    fn test_panic_payloads() {
        let e = handle_panic_error(Box::new("static"), "f");
        assert_eq!(e.to_string(), "f failed: (panic) static");
        let e = handle_panic_error(Box::new(String::from("owned")), "g");
        assert_eq!(e.to_string(), "g failed: (panic) owned");
        let e = handle_panic_error(Box::new(42u8), "h");
        assert_eq!(
            e.to_string(),
            "h failed: (panic) Unable to retrieve panic context"
        );
    }
}
