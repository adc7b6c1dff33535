// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The differential runner.
//!
//! The main structure in this module is [`DifferentialRunner`].

mod imp;
mod pipeline;

pub use imp::*;
pub use pipeline::*;
