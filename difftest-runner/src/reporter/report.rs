// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::RunStats;
use crate::{
    classify::{EquivalenceOracle, Outcome},
    compiler::Toolchain,
    errors::WriteReportError,
};
use chrono::{DateTime, Local};
use quick_junit::ReportUuid;
use std::{io, time::Duration};

/// Everything known about a finished run.
///
/// Formatters only read from this.
#[derive(Clone, Debug)]
pub struct RunReport<'a> {
    /// A unique identifier for this run.
    pub run_id: ReportUuid,

    /// When the run started.
    pub start_time: DateTime<Local>,

    /// How long the run took.
    pub elapsed: Duration,

    /// The reference compiler's name.
    pub reference_name: &'a str,

    /// The candidate compiler's name.
    pub candidate_name: &'a str,

    /// The oracle executions were compared with.
    pub oracle: EquivalenceOracle,

    /// Outcomes, sorted by test name.
    pub outcomes: &'a [Outcome],

    /// Statistics over [`Self::outcomes`].
    pub stats: RunStats,
}

impl<'a> RunReport<'a> {
    /// Creates a new report, computing statistics.
    pub fn new(
        toolchain: &'a Toolchain,
        oracle: EquivalenceOracle,
        outcomes: &'a [Outcome],
        start_time: DateTime<Local>,
        elapsed: Duration,
    ) -> Self {
        Self {
            run_id: ReportUuid::new_v4(),
            start_time,
            elapsed,
            reference_name: toolchain.reference().name(),
            candidate_name: toolchain.candidate().name(),
            oracle,
            outcomes,
            stats: RunStats::from_outcomes(outcomes),
        }
    }
}

/// Renders a [`RunReport`] for one output target.
pub trait OutcomeFormatter {
    /// Writes the report out.
    fn write_report(
        &self,
        report: &RunReport<'_>,
        writer: &mut dyn io::Write,
    ) -> Result<(), WriteReportError>;
}
