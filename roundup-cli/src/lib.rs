// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconcile nightly CI test results against a known-failures tracker.
//!
//! This crate is the `roundup` binary; the engine lives in
//! [`roundup-core`](roundup_core).

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputWriter;
