// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for difftest, a differential test harness for compilers.
//!
//! difftest runs a corpus of source files through a trusted reference compiler and a candidate
//! compiler, links and executes the results, and classifies every divergence between the two.
//!
//! The flow of a run is:
//!
//! 1. [`discovery`]: resolve input paths into a deduplicated, sorted [`TestList`](discovery::TestList).
//! 2. [`staging`]: copy each test case into its own working directory.
//! 3. [`runner`]: run the compile, link and execute pipeline for both compilers.
//! 4. [`classify`]: turn the two pipelines into a single [`Outcome`](classify::Outcome).
//! 5. [`reporter`]: aggregate outcomes into statistics, a table and a durable record.

pub mod classify;
pub mod compiler;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod exit_codes;
mod helpers;
pub mod reporter;
pub mod runner;
pub mod staging;
mod test_command;
pub mod test_output;
