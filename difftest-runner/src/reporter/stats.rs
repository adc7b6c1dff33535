// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::classify::{Outcome, Verdict};

/// Statistics for a completed run.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct RunStats {
    /// The number of test cases that ran.
    pub total: usize,

    /// The number of test cases that passed.
    pub passed: usize,

    /// The number of test cases that timed out. These are included in [`Self::failed`].
    pub timed_out: usize,
}

impl RunStats {
    /// Computes statistics over a full set of outcomes.
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut stats, outcome| {
            stats.total += 1;
            match outcome.verdict() {
                Verdict::Pass => stats.passed += 1,
                Verdict::TimedOut => stats.timed_out += 1,
                Verdict::Fail => {}
            }
            stats
        })
    }

    /// The number of test cases that did not pass.
    pub fn failed(&self) -> usize {
        self.total - self.passed
    }

    /// The fraction of test cases that passed, between 0 and 1. 0 if nothing ran.
    pub fn coverage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64
        }
    }
}
