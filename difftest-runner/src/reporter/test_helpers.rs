// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{RunReport, RunStats};
use crate::{
    classify::{EquivalenceOracle, Outcome, classify},
    runner::{PipelineRun, StageKind, StageResult, StageStatus},
};
use chrono::{Local, TimeZone};
use quick_junit::ReportUuid;
use std::time::Duration;

pub(super) const OK: StageStatus = StageStatus::Exited(0);
pub(super) const ERR: StageStatus = StageStatus::Exited(1);
pub(super) const SKIP: StageStatus = StageStatus::NotAttempted;

pub(super) fn make_pipeline(compiler: &str, statuses: [StageStatus; 3]) -> PipelineRun {
    let stage = |kind, status| StageResult {
        status,
        ..StageResult::not_attempted(kind)
    };
    PipelineRun {
        compiler: compiler.to_owned(),
        compile: stage(StageKind::Compile, statuses[0]),
        link: stage(StageKind::Link, statuses[1]),
        execute: stage(StageKind::Execute, statuses[2]),
    }
}

pub(super) fn make_outcome(
    name: &str,
    reference: [StageStatus; 3],
    candidate: [StageStatus; 3],
) -> Outcome {
    classify(
        name,
        &make_pipeline("gcc", reference),
        &make_pipeline("mycc", candidate),
        EquivalenceOracle::Output,
    )
}

pub(super) fn make_report(outcomes: &[Outcome]) -> RunReport<'_> {
    RunReport {
        run_id: ReportUuid::nil(),
        start_time: Local
            .with_ymd_and_hms(2024, 3, 1, 12, 30, 5)
            .single()
            .expect("unambiguous local time"),
        elapsed: Duration::from_millis(1500),
        reference_name: "gcc",
        candidate_name: "mycc",
        oracle: EquivalenceOracle::Output,
        outcomes,
        stats: RunStats::from_outcomes(outcomes),
    }
}
