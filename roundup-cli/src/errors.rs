// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::StderrStyles;
use owo_colors::OwoColorize;
use roundup_core::{
    errors::{CollectError, ConfigParseError, ReconcileError, TrackerError},
    reconcile::Unresolvable,
};
use roundup_metadata::RoundupExitCode;
use std::{error::Error, io};
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the
// expected way to print out errors is with the display_to_stderr method, which
// colorizes errors.

/// An expected failure of a roundup invocation, mapped to a documented exit
/// code.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("error collecting CI reports")]
    CollectError {
        scope: String,
        #[source]
        err: CollectError,
    },
    #[error("reconciliation failed")]
    ReconcileError {
        scope: String,
        #[source]
        err: ReconcileError,
    },
    #[error("unresolvable records")]
    UnresolvableFailures {
        scope: String,
        records: Vec<Unresolvable>,
    },
    #[error("tracker error")]
    TrackerError {
        #[from]
        err: TrackerError,
    },
    #[error("writing the pass report failed")]
    WriteReportError {
        #[source]
        err: io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn collect_error(scope: impl Into<String>, err: CollectError) -> Self {
        Self::CollectError {
            scope: scope.into(),
            err,
        }
    }

    pub(crate) fn reconcile_error(scope: impl Into<String>, err: ReconcileError) -> Self {
        Self::ReconcileError {
            scope: scope.into(),
            err,
        }
    }

    pub(crate) fn unresolvable_failures(
        scope: impl Into<String>,
        records: Vec<Unresolvable>,
    ) -> Self {
        Self::UnresolvableFailures {
            scope: scope.into(),
            records,
        }
    }

    pub(crate) fn write_report_error(err: io::Error) -> Self {
        Self::WriteReportError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. } => RoundupExitCode::SETUP_ERROR,
            Self::CollectError { .. } => RoundupExitCode::INSUFFICIENT_REPORTS,
            Self::ReconcileError { err, .. } => match err {
                ReconcileError::Wipeout { .. } => RoundupExitCode::WIPEOUT,
                ReconcileError::DuplicateTestKey { .. } => RoundupExitCode::SETUP_ERROR,
            },
            Self::UnresolvableFailures { .. } => RoundupExitCode::UNRESOLVABLE_FAILURES,
            Self::TrackerError { .. } => RoundupExitCode::TRACKER_ERROR,
            Self::WriteReportError { .. } => RoundupExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::ConfigParseError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::CollectError { scope, err } => {
                tracing::error!(
                    "failed to collect CI reports for scope `{}`",
                    scope.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::ReconcileError { scope, err } => {
                tracing::error!(
                    "reconciliation of scope `{}` aborted",
                    scope.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::UnresolvableFailures { scope, records } => {
                tracing::error!(
                    "scope `{}` has {} unresolvable records; fix the mapping tables before \
                     write-back can be trusted:",
                    scope.style(styles.bold),
                    records.len().style(styles.bold),
                );
                for record in records {
                    tracing::error!(target: "roundup_cli::no_heading", "  - {record}");
                }
                None
            }
            Self::TrackerError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::WriteReportError { err } => {
                tracing::error!("failed to write the pass report");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: "roundup_cli::no_heading", "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
