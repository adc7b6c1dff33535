// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classifies a pair of pipeline runs into a single outcome.
//!
//! The main entry point is [`classify`].

use crate::{
    errors::OracleParseError,
    runner::{PipelineRun, StageKind, StageResult, StageStatus},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Decides whether two executions count as the same behavior.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EquivalenceOracle {
    /// Only the exit statuses are compared.
    ExitCode,

    /// Both the exit statuses and the combined output are compared.
    #[default]
    Output,
}

impl EquivalenceOracle {
    /// Returns string representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &["exit-code", "output"]
    }

    /// Returns true if the two execute stages are equivalent under this oracle.
    pub fn equivalent(self, reference: &StageResult, candidate: &StageResult) -> bool {
        match self {
            Self::ExitCode => reference.status == candidate.status,
            Self::Output => {
                reference.status == candidate.status && reference.output == candidate.output
            }
        }
    }
}

impl FromStr for EquivalenceOracle {
    type Err = OracleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = match s {
            "exit-code" => Self::ExitCode,
            "output" => Self::Output,
            other => return Err(OracleParseError::new(other)),
        };
        Ok(val)
    }
}

impl fmt::Display for EquivalenceOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExitCode => f.write_str("exit-code"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// The verdict for a single test case.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    /// The candidate behaved like the reference.
    Pass,

    /// The candidate diverged from the reference.
    Fail,

    /// A stage ran for too long and was killed.
    TimedOut,
}

impl Verdict {
    /// Returns the uppercase label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::TimedOut => "TIMEOUT",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The classified result of a test case.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Outcome {
    test_name: String,
    verdict: Verdict,
    stage: StageKind,
    reference: StageStatus,
    candidate: StageStatus,
    comment: String,
}

impl Outcome {
    /// The name of the test case.
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// The verdict.
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Returns true if the verdict is [`Verdict::Pass`].
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    /// The stage at which the verdict was reached.
    pub fn stage(&self) -> StageKind {
        self.stage
    }

    /// The reference compiler's status at [`Self::stage`].
    pub fn reference_status(&self) -> StageStatus {
        self.reference
    }

    /// The candidate compiler's status at [`Self::stage`].
    pub fn candidate_status(&self) -> StageStatus {
        self.candidate
    }

    /// A human-readable explanation. Empty for most passing tests.
    pub fn comment(&self) -> &str {
        &self.comment
    }
}

/// Classifies the pipelines of the reference and candidate compilers on one test case.
///
/// Stages are examined in order. The first stage where a timeout or a divergence shows up decides
/// the verdict.
pub fn classify(
    test_name: &str,
    reference: &PipelineRun,
    candidate: &PipelineRun,
    oracle: EquivalenceOracle,
) -> Outcome {
    let outcome = |stage: StageKind, verdict: Verdict, comment: &str| Outcome {
        test_name: test_name.to_owned(),
        verdict,
        stage,
        reference: reference.stage(stage).status,
        candidate: candidate.stage(stage).status,
        comment: comment.to_owned(),
    };

    for stage in StageKind::ALL {
        let r = reference.stage(stage);
        let c = candidate.stage(stage);

        let timed_out = (r.status.is_timed_out(), c.status.is_timed_out());
        if let Some(comment) = side_comment(stage, timed_out, "timed out") {
            return outcome(stage, Verdict::TimedOut, &comment);
        }
        // A tool that can't be started says nothing about the program.
        let spawn_failed = (r.status.is_spawn_failed(), c.status.is_spawn_failed());
        if let Some(comment) = side_comment(stage, spawn_failed, "could not be started") {
            return outcome(stage, Verdict::Fail, &comment);
        }

        match (stage, r.status.is_success(), c.status.is_success()) {
            (StageKind::Compile, false, false) => {
                return outcome(stage, Verdict::Pass, "");
            }
            (StageKind::Compile, false, true) => {
                return outcome(stage, Verdict::Fail, "candidate accepts an invalid program");
            }
            (StageKind::Compile, true, false) => {
                return outcome(stage, Verdict::Fail, "candidate rejects a valid program");
            }
            (StageKind::Link, false, false) => {
                return outcome(stage, Verdict::Pass, "both fail to link");
            }
            (StageKind::Link, true, false) => {
                return outcome(stage, Verdict::Fail, "candidate produces incorrect assembly");
            }
            (StageKind::Link, false, true) => {
                return outcome(
                    stage,
                    Verdict::Fail,
                    "reference fails to link a program the candidate links",
                );
            }
            (StageKind::Execute, _, _) => {
                if !oracle.equivalent(r, c) {
                    return outcome(stage, Verdict::Fail, "different results at execution");
                }
            }
            (StageKind::Compile | StageKind::Link, true, true) => {}
        }
    }

    outcome(StageKind::Execute, Verdict::Pass, "")
}

/// Describes which side of a stage `what` happened to, if any.
fn side_comment(
    stage: StageKind,
    (reference, candidate): (bool, bool),
    what: &str,
) -> Option<String> {
    let (noun, plural) = match stage {
        StageKind::Compile => ("compiler", "compilers"),
        StageKind::Link => ("linker", "linkers"),
        StageKind::Execute => ("executable", "executables"),
    };
    match (reference, candidate) {
        (true, true) => Some(format!("both {plural} {what}")),
        (true, false) => Some(format!("reference {noun} {what}")),
        (false, true) => Some(format!("candidate {noun} {what}")),
        (false, false) => None,
    }
}
