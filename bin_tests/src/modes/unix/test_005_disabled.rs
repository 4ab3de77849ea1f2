// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0
//
// Disables the crash report without removing the handlers: the handler still runs, skips the
// report, and lets the signal kill the process.
use crate::modes::behavior::Behavior;
use mite_crashtracker::CrashtrackerConfiguration;
use std::path::Path;

pub struct Test;

impl Behavior for Test {
    fn setup(
        &self,
        _output_dir: &Path,
        _config: &mut CrashtrackerConfiguration,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn pre(&self, _output_dir: &Path) -> anyhow::Result<()> {
        mite_crashtracker::disable();
        anyhow::ensure!(mite_crashtracker::is_installed());
        Ok(())
    }
}
