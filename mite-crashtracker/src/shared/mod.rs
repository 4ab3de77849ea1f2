// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! This module holds constants/structures that are shared between the code that
//! installs the crash handlers and the handlers themselves.

pub(crate) mod configuration;
pub(crate) mod constants;
pub(crate) mod error;
#[cfg(feature = "collector")]
pub(crate) mod sink;
