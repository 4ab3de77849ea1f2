// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0
//
// Sends the report to a file in the output directory instead of stderr, then aborts.
use crate::modes::behavior::{abort_at_depth, Behavior, CRASH_LOG_FILENAME};
use mite_crashtracker::{CrashSink, CrashtrackerConfiguration};
use std::path::Path;

pub struct Test;

impl Behavior for Test {
    fn setup(
        &self,
        output_dir: &Path,
        config: &mut CrashtrackerConfiguration,
    ) -> anyhow::Result<()> {
        config.set_sink(CrashSink::File(output_dir.join(CRASH_LOG_FILENAME)));
        Ok(())
    }

    fn pre(&self, output_dir: &Path) -> anyhow::Result<()> {
        // The sink is opened at install time.
        anyhow::ensure!(output_dir.join(CRASH_LOG_FILENAME).exists());
        Ok(())
    }

    fn crash(&self) {
        abort_at_depth(3);
    }
}
