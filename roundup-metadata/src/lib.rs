// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared types for [roundup](https://github.com/roundup-rs/roundup): documented
//! process exit codes, and the serialized format of the known-failures tracker
//! document.
//!
//! This crate is kept dependency-light so that external integrations can consume
//! roundup's formats without pulling in the engine.

#![warn(missing_docs)]

mod exit_codes;
mod tracker_format;

pub use exit_codes::*;
pub use tracker_format::*;
