// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `roundup` failures.
///
/// A roundup pass may halt for a variety of reasons. This structure documents
/// the exit codes that occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum RoundupExitCode {}

impl RoundupExitCode {
    /// No errors occurred and roundup exited normally.
    pub const OK: i32 = 0;

    /// A user issue happened while setting up a roundup invocation: a missing
    /// or invalid configuration file, a mapping table that is not a bijection,
    /// or duplicate test identities within one build scope.
    pub const SETUP_ERROR: i32 = 96;

    /// The new-failure count exceeded the wipeout threshold; the build is
    /// presumed broken and no write-back was attempted.
    pub const WIPEOUT: i32 = 100;

    /// One or more records could not be translated between namespaces. The
    /// pass completed but its results cannot be trusted for write-back.
    pub const UNRESOLVABLE_FAILURES: i32 = 101;

    /// Fewer CI report files were found than the configured minimum. The build
    /// is presumed incomplete.
    pub const INSUFFICIENT_REPORTS: i32 = 102;

    /// Reading from or writing to the known-failures tracker failed.
    pub const TRACKER_ERROR: i32 = 103;

    /// Writing the pass report to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
