// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for difftest.
//!
//! The configuration is layered: the embedded default config comes first, then
//! `.config/difftest.toml` (or a file passed in explicitly), then command-line overrides.

mod imp;
mod test_threads;

pub use imp::*;
pub use test_threads::*;
