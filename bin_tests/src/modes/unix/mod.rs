// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0
pub mod test_000_segv;
pub mod test_001_abort_frame_cap;
pub mod test_002_removed;
pub mod test_003_restored_handler;
pub mod test_004_file_sink;
pub mod test_005_disabled;
pub mod test_006_stack_overflow_sigstack;
