// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{OutcomeFormatter, RunReport};
use crate::{classify::Verdict, errors::WriteReportError};
use camino::{Utf8Path, Utf8PathBuf};
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};
use std::{fs::File, io::Write};

/// Writes outcomes as a JUnit XML report, with one test suite for the candidate compiler.
#[derive(Clone, Copy, Debug, Default)]
pub struct JunitFormatter;

impl JunitFormatter {
    /// The file name the report is written to, within the output directory.
    pub const FILE_NAME: &'static str = "junit.xml";

    /// Writes the report to `<output_dir>/junit.xml`. Returns the path written to.
    pub fn write_to_dir(
        &self,
        report: &RunReport<'_>,
        output_dir: &Utf8Path,
    ) -> Result<Utf8PathBuf, WriteReportError> {
        let path = output_dir.join(Self::FILE_NAME);
        let mut file = File::create(&path).map_err(|error| WriteReportError::Fs {
            file: path.clone(),
            error,
        })?;
        self.write_report(report, &mut file)?;
        Ok(path)
    }

    fn make_report(report: &RunReport<'_>) -> Report {
        let mut test_suite = TestSuite::new(report.candidate_name);
        test_suite
            .add_property(("reference", report.reference_name))
            .add_property(("oracle".to_owned(), report.oracle.to_string()));

        for outcome in report.outcomes {
            let status = match outcome.verdict() {
                Verdict::Pass => TestCaseStatus::success(),
                verdict @ (Verdict::Fail | Verdict::TimedOut) => {
                    let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
                    status
                        .set_type(format!("{} at {}", verdict.label(), outcome.stage()))
                        .set_message(outcome.comment());
                    status
                }
            };

            let mut test_case = TestCase::new(outcome.test_name(), status);
            test_case.set_classname(outcome.stage().as_str());
            test_suite.add_test_case(test_case);
        }

        let mut junit = Report::new("difftest");
        junit
            .set_report_uuid(report.run_id)
            .set_timestamp(report.start_time.fixed_offset())
            .set_time(report.elapsed)
            .add_test_suite(test_suite);
        junit
    }
}

impl OutcomeFormatter for JunitFormatter {
    fn write_report(
        &self,
        report: &RunReport<'_>,
        writer: &mut dyn Write,
    ) -> Result<(), WriteReportError> {
        Self::make_report(report)
            .serialize(writer)
            .map_err(WriteReportError::Junit)
    }
}
