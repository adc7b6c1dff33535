// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for discovery, staging and differential execution.
//!
//! The compilers and linker are shell scripts, so these tests only run on Unix.

#![cfg(unix)]

mod basic;
mod fixtures;
