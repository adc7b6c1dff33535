// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Utilities for pluralizing various words based on count or plurality.
pub(crate) mod plural {
    /// Returns "test" if `count` is 1, otherwise "tests".
    pub(crate) fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "test case" if `count` is 1, otherwise "test cases".
    pub(crate) fn test_cases_str(count: usize) -> &'static str {
        if count == 1 { "test case" } else { "test cases" }
    }
}

/// Formats a fraction between 0 and 1 as a percentage with one decimal place.
pub(crate) fn percentage(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}
