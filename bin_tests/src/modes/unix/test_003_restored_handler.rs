// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0
//
// Installs a SIGSEGV handler of its own before the crashtracker, then installs and removes the
// crashtracker. The segfault must reach that first handler, unchanged.
use crate::modes::behavior::{Behavior, SENTINEL_EXIT_CODE, SENTINEL_MESSAGE};
use mite_crashtracker::CrashtrackerConfiguration;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet};
use std::path::Path;

pub struct Test;

extern "C" fn sentinel_handler(_signum: libc::c_int) {
    unsafe {
        for part in [SENTINEL_MESSAGE.as_bytes(), b"\n"] {
            libc::write(
                libc::STDERR_FILENO,
                part.as_ptr() as *const libc::c_void,
                part.len(),
            );
        }
        libc::_exit(SENTINEL_EXIT_CODE);
    }
}

impl Behavior for Test {
    fn setup(
        &self,
        _output_dir: &Path,
        _config: &mut CrashtrackerConfiguration,
    ) -> anyhow::Result<()> {
        let sig_action = SigAction::new(
            SigHandler::Handler(sentinel_handler),
            SaFlags::empty(),
            SigSet::empty(),
        );
        unsafe { signal::sigaction(signal::SIGSEGV, &sig_action) }?;
        Ok(())
    }

    fn pre(&self, _output_dir: &Path) -> anyhow::Result<()> {
        mite_crashtracker::remove_crash_handlers()?;
        Ok(())
    }
}
