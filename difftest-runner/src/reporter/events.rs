// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Events emitted by the runner as a run progresses.

use crate::{classify::Outcome, runner::PipelineRun};
use std::time::Duration;

/// A test event, passed to the callback of
/// [`DifferentialRunner::execute`](crate::runner::DifferentialRunner::execute).
#[derive(Clone, Debug)]
pub enum TestEvent<'a> {
    /// The run started.
    RunStarted {
        /// The number of staged tests.
        test_count: usize,

        /// The number of tests that run simultaneously.
        test_threads: usize,
    },

    /// A test finished and was classified.
    TestFinished {
        /// The outcome.
        outcome: &'a Outcome,

        /// The reference compiler's pipeline.
        reference: &'a PipelineRun,

        /// The candidate compiler's pipeline.
        candidate: &'a PipelineRun,

        /// The number of tests finished so far, including this one.
        completed: usize,

        /// The total number of tests.
        total: usize,
    },

    /// Every test finished.
    RunFinished {
        /// The time taken by the whole run.
        elapsed: Duration,
    },
}
