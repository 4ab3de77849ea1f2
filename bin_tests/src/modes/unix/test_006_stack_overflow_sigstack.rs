// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0
//
// Overflows the stack. Without an alternate signal stack the handler would have nowhere to run.
use crate::modes::behavior::{with_frames, Behavior};
use mite_crashtracker::{
    CrashtrackerConfiguration, StacktraceCollection, MITE_CRASHTRACK_MAX_FRAMES,
};
use std::path::Path;

pub struct Test;

#[inline(never)]
#[allow(unconditional_recursion)]
fn recurse(depth: u64) -> u64 {
    let pad = std::hint::black_box([depth; 64]);
    let below = recurse(std::hint::black_box(depth + 1));
    std::hint::black_box(below.wrapping_add(pad[63]))
}

impl Behavior for Test {
    fn setup(
        &self,
        _output_dir: &Path,
        config: &mut CrashtrackerConfiguration,
    ) -> anyhow::Result<()> {
        config.set_use_alt_stack(true)?;
        config.set_create_alt_stack(true)?;
        *config = with_frames(
            config,
            MITE_CRASHTRACK_MAX_FRAMES,
            StacktraceCollection::WithoutSymbols,
        )?;
        Ok(())
    }

    fn pre(&self, _output_dir: &Path) -> anyhow::Result<()> {
        Ok(())
    }

    fn crash(&self) {
        recurse(0);
    }
}
