// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Test modes for the crashing test app.
//!
//! The app installs the crashtracker, lets a mode adjust the configuration and
//! the process around it, then crashes the way the mode asks. The integration
//! tests spawn it and check what it printed and how it died.

#![cfg(unix)]

pub mod modes;
