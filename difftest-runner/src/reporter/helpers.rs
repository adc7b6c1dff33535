// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::classify::Verdict;
use owo_colors::Style;

/// Styles used by reporters. The default is uncolored.
#[derive(Debug, Default, Clone)]
pub(crate) struct Styles {
    pub(crate) count: Style,
    pub(crate) pass: Style,
    pub(crate) fail: Style,
    pub(crate) timed_out: Style,
    pub(crate) test_name: Style,
    pub(crate) header: Style,
}

impl Styles {
    pub(crate) fn colorize(&mut self) {
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.timed_out = Style::new().yellow().bold();
        self.test_name = Style::new().blue().bold();
        self.header = Style::new().bold();
    }

    pub(crate) fn verdict(&self, verdict: Verdict) -> Style {
        match verdict {
            Verdict::Pass => self.pass,
            Verdict::Fail => self.fail,
            Verdict::TimedOut => self.timed_out,
        }
    }
}
