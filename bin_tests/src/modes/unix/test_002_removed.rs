// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0
//
// Installs then removes the crashtracker before segfaulting: nothing gets reported, and the
// process dies from the signal as if the crashtracker had never been there.
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
        mite_crashtracker::remove_crash_handlers()?;
        anyhow::ensure!(!mite_crashtracker::is_installed());
        Ok(())
    }
}
