// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0
#![cfg(unix)]
mod crash_handler;
mod emitters;
mod signal_handler_manager;
mod signal_registry;
mod signal_table;
#[cfg(test)]
mod test_utils;

pub use crash_handler::{deliver_fatal_signal, disable, enable, is_enabled};
pub use emitters::{emit_crash_report, EmitterError};
pub use signal_handler_manager::{
    install_crash_handlers, is_installed, remove_crash_handlers, HandlerController,
};
pub use signal_registry::SignalRegistry;
pub use signal_table::{HandlerDescriptor, PosixSignalTable, SignalTable};
