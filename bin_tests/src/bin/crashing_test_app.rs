// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#[cfg(not(unix))]
fn main() {}

#[cfg(unix)]
fn main() -> anyhow::Result<()> {
    unix::main()
}

#[cfg(unix)]
mod unix {
    use anyhow::Context;
    use bin_tests::modes::behavior::get_behavior;
    use mite_crashtracker::{self as crashtracker, CrashtrackerConfiguration};
    use std::env;
    use std::path::PathBuf;

    #[inline(never)]
    pub fn main() -> anyhow::Result<()> {
        let mut args = env::args().skip(1);
        let mode = args.next().context("Unexpected number of arguments 1")?;
        let output_dir = PathBuf::from(args.next().context("Unexpected number of arguments 2")?);
        anyhow::ensure!(args.next().is_none(), "unexpected extra arguments");

        let behavior = get_behavior(&mode)?;
        let mut config = CrashtrackerConfiguration::default();
        behavior.setup(&output_dir, &mut config)?;
        crashtracker::install_crash_handlers(config)?;
        anyhow::ensure!(crashtracker::is_installed(), "crash handlers not installed");
        behavior.pre(&output_dir)?;

        behavior.crash();
        anyhow::bail!("{mode}: the process survived the crash")
    }
}
