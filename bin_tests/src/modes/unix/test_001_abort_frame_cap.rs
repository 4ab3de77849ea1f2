// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0
//
// Aborts from deep inside a recursion with a frame cap below the stack depth: the report must
// stop at the cap. The cap still leaves room for some recursion frames past the handler's own.
use crate::modes::behavior::{abort_at_depth, with_frames, Behavior};
use mite_crashtracker::{CrashtrackerConfiguration, StacktraceCollection};
use std::path::Path;

pub struct Test;

pub const MAX_FRAMES: usize = 32;

impl Behavior for Test {
    fn setup(
        &self,
        _output_dir: &Path,
        config: &mut CrashtrackerConfiguration,
    ) -> anyhow::Result<()> {
        *config = with_frames(config, MAX_FRAMES, StacktraceCollection::WithoutSymbols)?;
        Ok(())
    }

    fn pre(&self, _output_dir: &Path) -> anyhow::Result<()> {
        Ok(())
    }

    fn crash(&self) {
        abort_at_depth(64);
    }
}
