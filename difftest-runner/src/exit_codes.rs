// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exit codes for the `difftest` binary.

/// Documented exit codes for `difftest` failures.
///
/// Per-test failures never affect the exit code: a run that completes exits with [`Self::OK`]
/// however many tests failed. Unknown or unexpected failures always result in exit code 1.
pub enum DifftestExitCode {}

impl DifftestExitCode {
    /// The run completed.
    pub const OK: i32 = 0;

    /// No test cases were found in the given paths.
    pub const NO_TEST_CASES: i32 = 4;

    /// A user issue happened while setting up the run: a bad config, a missing compiler, or a
    /// filesystem error while staging.
    pub const SETUP_ERROR: i32 = 96;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
