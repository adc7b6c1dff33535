// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{TestEvent, helpers::Styles, progress::ProgressBarState};
use crate::{
    classify::Outcome,
    helpers::plural,
    runner::PipelineRun,
};
use owo_colors::OwoColorize;
use std::io::{IsTerminal, Write};
use swrite::{SWrite, swrite, swriteln};
use tracing::{debug, info, warn};

/// Test reporter builder.
#[derive(Debug, Default)]
pub struct TestReporterBuilder {
    verbose: u8,
    hide_progress_bar: bool,
}

impl TestReporterBuilder {
    /// Sets the verbosity level.
    ///
    /// At 1 and above, a line is logged for every finished test. At 2 and above, the stage logs of
    /// failing tests are printed as well.
    pub fn set_verbose(&mut self, verbose: u8) -> &mut Self {
        self.verbose = verbose;
        self
    }

    /// Sets visibility of the progress bar. The bar is always hidden when stderr isn't a terminal,
    /// or when verbose.
    pub fn set_hide_progress_bar(&mut self, hide_progress_bar: bool) -> &mut Self {
        self.hide_progress_bar = hide_progress_bar;
        self
    }

    /// Creates a new test reporter.
    pub fn build(&self) -> TestReporter {
        let show_progress_bar =
            !self.hide_progress_bar && self.verbose == 0 && std::io::stderr().is_terminal();
        TestReporter {
            verbose: self.verbose,
            show_progress_bar,
            progress_bar: None,
            styles: Styles::default(),
        }
    }
}

/// Reports live progress as test events come in.
#[derive(Debug)]
pub struct TestReporter {
    verbose: u8,
    show_progress_bar: bool,
    progress_bar: Option<ProgressBarState>,
    styles: Styles,
}

impl TestReporter {
    /// Colorizes output.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Reports a test event.
    pub fn report_event(&mut self, event: TestEvent<'_>) {
        match event {
            TestEvent::RunStarted {
                test_count,
                test_threads,
            } => {
                info!(
                    "running {} {} with {test_threads} concurrent {}",
                    test_count.style(self.styles.count),
                    plural::test_cases_str(test_count),
                    if test_threads == 1 { "job" } else { "jobs" },
                );
                if self.show_progress_bar {
                    self.progress_bar = Some(ProgressBarState::new(test_count, &self.styles));
                }
            }
            TestEvent::TestFinished {
                outcome,
                reference,
                candidate,
                ..
            } => {
                if let Some(progress_bar) = &self.progress_bar {
                    progress_bar.test_finished(outcome, &self.styles);
                }
                if self.verbose >= 1 {
                    self.log_outcome(outcome);
                }
                if self.verbose >= 2 && !outcome.passed() {
                    self.dump_stage_logs(outcome, reference, candidate);
                }
            }
            TestEvent::RunFinished { elapsed } => {
                if let Some(progress_bar) = self.progress_bar.take() {
                    progress_bar.finish_and_clear();
                }
                debug!("run finished in {elapsed:.3?}");
            }
        }
    }

    fn log_outcome(&self, outcome: &Outcome) {
        let verdict = outcome.verdict();
        let verdict = verdict.style(self.styles.verdict(verdict));
        if outcome.comment().is_empty() {
            info!("TEST-CASE {}: {verdict}", outcome.test_name());
        } else {
            info!(
                "TEST-CASE {}: {verdict} ({})",
                outcome.test_name(),
                outcome.comment()
            );
        }
    }

    fn dump_stage_logs(&self, outcome: &Outcome, reference: &PipelineRun, candidate: &PipelineRun) {
        let mut out = String::new();
        for run in [reference, candidate] {
            let stage = run.stage(outcome.stage());
            let Some(log_path) = &stage.log_path else {
                continue;
            };
            swriteln!(
                out,
                "--- {} {} log ({log_path}, took {:.3}s) ---",
                run.compiler.style(self.styles.test_name),
                stage.kind,
                stage.duration.as_secs_f64(),
            );
            // The log is the captured output followed by the exit status.
            match std::fs::read_to_string(log_path) {
                Ok(contents) => swrite!(out, "{contents}"),
                Err(error) => {
                    warn!("failed to read stage log `{log_path}`: {error}");
                }
            }
        }

        let res = match &self.progress_bar {
            Some(progress_bar) => progress_bar.write_buf(out.as_bytes()),
            None => std::io::stderr().write_all(out.as_bytes()),
        };
        if let Err(error) = res {
            debug!("failed to write stage logs to stderr: {error}");
        }
    }
}
