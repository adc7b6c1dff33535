// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::helpers::Styles;
use crate::classify::Outcome;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use owo_colors::OwoColorize;
use std::{io::Write, time::Duration};

#[derive(Debug)]
pub(super) struct ProgressBarState {
    bar: ProgressBar,
}

impl ProgressBarState {
    pub(super) fn new(test_count: usize, styles: &Styles) -> Self {
        let bar = ProgressBar::with_draw_target(
            Some(test_count as u64),
            // Twice the steady tick rate.
            ProgressDrawTarget::stderr_with_hz(20),
        );
        let test_count_width = test_count.to_string().len();
        // {{foo}} is passed into the ProgressBar, while {test_count_width} is inserted by format!().
        let template = format!(
            "{{prefix:>12}} [{{elapsed_precise:>9}}] {{wide_bar}} \
             {{pos:>{test_count_width}}}/{{len:{test_count_width}}}: {{msg}}     "
        );
        bar.set_style(
            ProgressStyle::default_bar()
                .progress_chars("=> ")
                .template(&template)
                .expect("template is known to be valid"),
        );
        bar.set_prefix("Running".style(styles.count).to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    pub(super) fn test_finished(&self, outcome: &Outcome, styles: &Styles) {
        self.bar.set_message(format!(
            "{} {}",
            outcome.verdict().style(styles.verdict(outcome.verdict())),
            outcome.test_name().style(styles.test_name),
        ));
        self.bar.inc(1);
    }

    /// Writes to stderr without garbling the bar.
    pub(super) fn write_buf(&self, buf: &[u8]) -> std::io::Result<()> {
        self.bar.suspend(|| std::io::stderr().write_all(buf))
    }

    pub(super) fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}
