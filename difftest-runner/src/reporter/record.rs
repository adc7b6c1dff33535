// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{OutcomeFormatter, RunReport};
use crate::{
    classify::{EquivalenceOracle, Verdict},
    errors::WriteReportError,
    runner::StageStatus,
};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::{
    fs::File,
    io::{BufWriter, Write},
};

/// Writes the durable record of a run: JSON lines, a header followed by one line per outcome.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordFormatter;

impl RecordFormatter {
    /// Returns the file name the record for this report is written to.
    pub fn file_name(report: &RunReport<'_>) -> String {
        format!(
            "difftest-{}.jsonl",
            report.start_time.format("%Y%m%d-%H%M%S%.3f")
        )
    }

    /// Writes the record into `dir`, creating it if necessary. Returns the path written to.
    ///
    /// An existing record is never overwritten.
    pub fn write_to_dir(
        &self,
        report: &RunReport<'_>,
        dir: &Utf8Path,
    ) -> Result<Utf8PathBuf, WriteReportError> {
        std::fs::create_dir_all(dir).map_err(|error| WriteReportError::Fs {
            file: dir.to_owned(),
            error,
        })?;

        let path = dir.join(Self::file_name(report));
        let file = File::create_new(&path).map_err(|error| WriteReportError::Fs {
            file: path.clone(),
            error,
        })?;
        let mut writer = BufWriter::new(file);
        self.write_report(report, &mut writer)?;
        writer.flush().map_err(|error| WriteReportError::Fs {
            file: path.clone(),
            error,
        })?;
        Ok(path)
    }
}

impl OutcomeFormatter for RecordFormatter {
    fn write_report(
        &self,
        report: &RunReport<'_>,
        writer: &mut dyn Write,
    ) -> Result<(), WriteReportError> {
        let header = RecordHeader {
            run_id: report.run_id.to_string(),
            timestamp: report.start_time.to_rfc3339(),
            reference: report.reference_name,
            candidate: report.candidate_name,
            oracle: report.oracle,
            total: report.stats.total,
            passed: report.stats.passed,
        };
        write_line(writer, &header)?;

        for outcome in report.outcomes {
            let line = RecordLine {
                test: outcome.test_name(),
                passed: outcome.passed(),
                verdict: outcome.verdict(),
                stage: outcome.stage().as_str(),
                reference: outcome.reference_status(),
                candidate: outcome.candidate_status(),
                comment: outcome.comment(),
            };
            write_line(writer, &line)?;
        }
        Ok(())
    }
}

fn write_line(writer: &mut dyn Write, value: &impl Serialize) -> Result<(), WriteReportError> {
    serde_json::to_writer(&mut *writer, value).map_err(WriteReportError::Json)?;
    writer.write_all(b"\n").map_err(WriteReportError::Io)
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct RecordHeader<'a> {
    run_id: String,
    timestamp: String,
    reference: &'a str,
    candidate: &'a str,
    oracle: EquivalenceOracle,
    total: usize,
    passed: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct RecordLine<'a> {
    test: &'a str,
    passed: bool,
    verdict: Verdict,
    stage: &'a str,
    reference: StageStatus,
    candidate: StageStatus,
    comment: &'a str,
}
