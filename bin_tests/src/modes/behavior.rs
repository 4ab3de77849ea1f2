// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use mite_crashtracker::CrashtrackerConfiguration;
use std::path::Path;

use crate::modes::unix::*;

/// Defines the additional behavior for a given crashtracking test
pub trait Behavior {
    /// Adjusts the configuration before the crash handlers are installed.
    fn setup(&self, output_dir: &Path, config: &mut CrashtrackerConfiguration) -> Result<()>;
    /// Runs after the crash handlers are installed, right before the crash.
    fn pre(&self, output_dir: &Path) -> Result<()>;
    /// Crashes the process. Only returns if the crash did not kill it.
    fn crash(&self) {
        crash_null_read()
    }
}

/// Name of the file the `file_sink` mode writes its report to, inside the output directory.
pub const CRASH_LOG_FILENAME: &str = "crash.log";

/// Exit code used by the handler the `restored_handler` mode installs before the crashtracker.
pub const SENTINEL_EXIT_CODE: i32 = 42;

/// Printed by that same handler.
pub const SENTINEL_MESSAGE: &str = "sentinel handler reached";

#[inline(never)]
unsafe fn read_null() {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        std::arch::asm!("mov eax, [0]", options(nostack));
    }

    #[cfg(target_arch = "aarch64")]
    {
        std::arch::asm!("mov x0, #0", "ldr x1, [x0]", options(nostack));
    }

    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
    {
        std::ptr::read_volatile(std::ptr::null::<u8>());
    }
}

#[inline(never)]
fn fn3() {
    unsafe { read_null() }
}

#[inline(never)]
fn fn2() {
    fn3()
}

/// Segfaults a few named frames deep.
#[inline(never)]
pub fn crash_null_read() {
    fn2()
}

/// Calls `abort()` from `depth` frames deep.
#[inline(never)]
pub fn abort_at_depth(depth: usize) -> usize {
    if depth == 0 {
        unsafe { libc::abort() }
    }
    let below = abort_at_depth(std::hint::black_box(depth - 1));
    std::hint::black_box(below + 1)
}

/// Builds a copy of `config` with a different frame cap and collection mode.
pub fn with_frames(
    config: &CrashtrackerConfiguration,
    max_frames: usize,
    resolve_frames: mite_crashtracker::StacktraceCollection,
) -> Result<CrashtrackerConfiguration> {
    Ok(CrashtrackerConfiguration::new(
        config.create_alt_stack(),
        config.use_alt_stack(),
        max_frames,
        resolve_frames,
        config.signals().to_vec(),
        config.sink().clone(),
    )?)
}

pub fn get_behavior(mode_str: &str) -> Result<Box<dyn Behavior>> {
    Ok(match mode_str {
        "segv" => Box::new(test_000_segv::Test),
        "abort_frame_cap" => Box::new(test_001_abort_frame_cap::Test),
        "removed" => Box::new(test_002_removed::Test),
        "restored_handler" => Box::new(test_003_restored_handler::Test),
        "file_sink" => Box::new(test_004_file_sink::Test),
        "disabled" => Box::new(test_005_disabled::Test),
        "stack_overflow_sigstack" => Box::new(test_006_stack_overflow_sigstack::Test),
        _ => anyhow::bail!("Unknown mode: {mode_str}"),
    })
}
