// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregates outcomes and prints them out.
//!
//! Live progress goes through [`TestReporter`]. Once every outcome is in, a [`RunReport`] is
//! rendered by one [`OutcomeFormatter`] per output target.

mod events;
mod helpers;
mod imp;
mod junit;
mod progress;
mod record;
mod report;
mod stats;
mod table;
#[cfg(test)]
mod test_helpers;

pub use events::*;
pub use imp::*;
pub use junit::*;
pub use record::*;
pub use report::*;
pub use stats::*;
pub use table::*;
