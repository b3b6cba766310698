// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Utilities for pluralizing various words based on count.
pub(crate) mod plural {
    /// Returns "failure" or "failures" based on count.
    pub(crate) fn failures_str(count: usize) -> &'static str {
        if count == 1 { "failure" } else { "failures" }
    }

    /// Returns "test" or "tests" based on count.
    pub(crate) fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "record" or "records" based on count.
    pub(crate) fn records_str(count: usize) -> &'static str {
        if count == 1 { "record" } else { "records" }
    }
}
