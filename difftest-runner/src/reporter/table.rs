// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{OutcomeFormatter, RunReport, helpers::Styles};
use crate::{
    errors::WriteReportError,
    helpers::{percentage, plural},
};
use owo_colors::{OwoColorize, Style};
use swrite::{SWrite, swrite};
use unicode_width::UnicodeWidthStr;

/// Renders outcomes as a bordered table followed by a summary line.
///
/// With default styles this is plain text. Call [`Self::colorize`] for terminal output.
#[derive(Debug, Default)]
pub struct TableFormatter {
    fail_only: bool,
    styles: Styles,
}

impl TableFormatter {
    /// Creates a new formatter. If `fail_only` is true, passing tests are left out of the table.
    /// The summary always covers every test.
    pub fn new(fail_only: bool) -> Self {
        Self {
            fail_only,
            styles: Styles::default(),
        }
    }

    /// Colorizes the output.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Renders the table into a string.
    pub fn render_table(&self, report: &RunReport<'_>) -> String {
        let header = [
            "Test",
            "Result",
            "Stage",
            report.reference_name,
            report.candidate_name,
            "Comment",
        ]
        .map(|text| Cell::new(text, self.styles.header));

        let rows: Vec<[Cell; 6]> = report
            .outcomes
            .iter()
            .filter(|outcome| !(self.fail_only && outcome.passed()))
            .map(|outcome| {
                [
                    Cell::new(outcome.test_name(), self.styles.test_name),
                    Cell::new(
                        outcome.verdict().label(),
                        self.styles.verdict(outcome.verdict()),
                    ),
                    Cell::plain(outcome.stage().as_str()),
                    Cell::plain(outcome.reference_status().to_string()),
                    Cell::plain(outcome.candidate_status().to_string()),
                    Cell::plain(outcome.comment()),
                ]
            })
            .collect();

        let mut widths = header.each_ref().map(Cell::width);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.width());
            }
        }

        let mut out = String::new();
        write_border(&mut out, &widths, '-');
        write_row(&mut out, &widths, &header);
        write_border(&mut out, &widths, '=');
        for row in &rows {
            write_row(&mut out, &widths, row);
            write_border(&mut out, &widths, '-');
        }
        out
    }

    /// Renders the summary line, including the trailing newline.
    pub fn render_summary(&self, report: &RunReport<'_>) -> String {
        let stats = &report.stats;
        let mut out = String::new();
        swrite!(
            out,
            "SUMMARY: {}/{} {} passed ({}), {} failed",
            stats.passed.style(self.styles.count),
            stats.total.style(self.styles.count),
            plural::tests_str(stats.total),
            percentage(stats.coverage()),
            stats.failed().style(if stats.failed() > 0 {
                self.styles.fail
            } else {
                self.styles.count
            }),
        );
        if stats.timed_out > 0 {
            swrite!(
                out,
                " ({} timed out)",
                stats.timed_out.style(self.styles.timed_out)
            );
        }
        out.push('\n');
        out
    }
}

impl OutcomeFormatter for TableFormatter {
    fn write_report(
        &self,
        report: &RunReport<'_>,
        writer: &mut dyn std::io::Write,
    ) -> Result<(), WriteReportError> {
        let mut out = self.render_table(report);
        out.push('\n');
        out.push_str(&self.render_summary(report));
        writer
            .write_all(out.as_bytes())
            .map_err(WriteReportError::Io)
    }
}

#[derive(Debug)]
struct Cell {
    text: String,
    style: Style,
}

impl Cell {
    fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::new())
    }

    fn width(&self) -> usize {
        self.text.width()
    }
}

fn write_border(out: &mut String, widths: &[usize; 6], fill: char) {
    out.push('+');
    for width in widths {
        out.extend(std::iter::repeat_n(fill, width + 2));
        out.push('+');
    }
    out.push('\n');
}

fn write_row(out: &mut String, widths: &[usize; 6], row: &[Cell; 6]) {
    out.push('|');
    for (width, cell) in widths.iter().zip(row) {
        // Pad outside the styled text so escape codes don't count towards the width.
        let padding = width - cell.width();
        swrite!(out, " {}{} |", cell.text.style(cell.style), " ".repeat(padding));
    }
    out.push('\n');
}
