// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by roundup.

use crate::{mapping::MapAxis, record::TestKey, summary::FailureSummary};
use camino::Utf8PathBuf;
use std::io;
use thiserror::Error;

/// A name could not be translated between namespaces.
///
/// Mapping misses are never tolerated silently: a miss would misclassify a
/// failure as new or fixed. During reconciliation they accumulate into the
/// unresolvable channel; everywhere else they abort the operation directly.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    /// An external display name has no internal counterpart.
    #[error("external {axis} `{name}` has no internal counterpart")]
    NoInternal {
        /// The axis that was consulted.
        axis: MapAxis,
        /// The name that failed to translate.
        name: String,
    },

    /// An internal build-system name has no external counterpart.
    #[error("internal {axis} `{name}` has no external counterpart")]
    NoExternal {
        /// The axis that was consulted.
        axis: MapAxis,
        /// The name that failed to translate.
        name: String,
    },
}

impl MappingError {
    pub(crate) fn no_internal(axis: MapAxis, name: impl Into<String>) -> Self {
        Self::NoInternal {
            axis,
            name: name.into(),
        }
    }

    pub(crate) fn no_external(axis: MapAxis, name: impl Into<String>) -> Self {
        Self::NoExternal {
            axis,
            name: name.into(),
        }
    }

    /// The name that failed to translate.
    pub fn name(&self) -> &str {
        match self {
            Self::NoInternal { name, .. } | Self::NoExternal { name, .. } => name,
        }
    }

    /// The axis the failed lookup was performed on.
    pub fn axis(&self) -> MapAxis {
        match self {
            Self::NoInternal { axis, .. } | Self::NoExternal { axis, .. } => *axis,
        }
    }
}

/// A name map could not be constructed because it is not a bijection.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MapBuildError {
    /// The same external name occurs in more than one entry.
    #[error("external name `{name}` is mapped more than once")]
    DuplicateExternal {
        /// The duplicated name.
        name: String,
    },

    /// The same internal name occurs in more than one entry.
    #[error("internal name `{name}` is mapped more than once")]
    DuplicateInternal {
        /// The duplicated name.
        name: String,
    },
}

impl MapBuildError {
    pub(crate) fn duplicate_external(name: impl Into<String>) -> Self {
        Self::DuplicateExternal { name: name.into() }
    }

    pub(crate) fn duplicate_internal(name: impl Into<String>) -> Self {
        Self::DuplicateInternal { name: name.into() }
    }
}

/// A reconciliation pass could not produce a trustworthy outcome.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Two current results share an identity key within one build scope.
    ///
    /// Identity keys are what make map-indexed matching sound; a duplicate is
    /// a configuration error (overlapping scopes, a job feeding two
    /// groupings), not something to break ties on.
    #[error("duplicate test identity `{key}` among current results")]
    DuplicateTestKey {
        /// The duplicated identity key.
        key: TestKey,
    },

    /// The new-failure count exceeded the wipeout threshold.
    ///
    /// An anomalously large new-failure volume is treated as a build or
    /// report malfunction masquerading as mass regression; the pass aborts
    /// before any write-back. The per-group summary is carried along so the
    /// operator still sees the breakdown.
    #[error("wipeout: {new_failure_count} new failures exceeds the threshold of {threshold}")]
    Wipeout {
        /// How many new failures were detected.
        new_failure_count: usize,
        /// The configured threshold that was exceeded.
        threshold: usize,
        /// Per-group failure counts, for operator triage.
        summary: FailureSummary,
    },
}

/// An error collecting test results from CI run reports.
#[derive(Debug, Error)]
pub enum CollectError {
    /// Fewer report files were found than the configured minimum, indicating
    /// an incomplete build.
    #[error("found {found} CI report files, expected at least {expected}; build is probably not finished")]
    InsufficientReports {
        /// The configured minimum.
        expected: usize,
        /// How many report files were actually found.
        found: usize,
    },

    /// A builds directory could not be listed.
    #[error("error listing build directories under `{path}`")]
    ListBuilds {
        /// The directory being listed.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// A report file could not be read.
    #[error("error reading CI report `{path}`")]
    ReadReport {
        /// The report file.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// A report file could not be parsed.
    #[error("error parsing CI report `{path}`")]
    ParseReport {
        /// The report file.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: ReportParseError,
    },
}

/// An error parsing one CI run report.
#[derive(Debug, Error)]
pub enum ReportParseError {
    /// The document is not well-formed XML.
    #[error("invalid XML")]
    Xml {
        /// The underlying error.
        #[from]
        error: quick_xml::Error,
    },

    /// A test case is missing a required element.
    #[error("case {case_index}: missing required element `{field}`")]
    MissingField {
        /// 0-based index of the case within the report.
        case_index: usize,
        /// The missing element.
        field: &'static str,
    },

    /// A test case element holds an unparseable value.
    #[error("case {case_index}: invalid value `{value}` for `{field}`")]
    InvalidField {
        /// 0-based index of the case within the report.
        case_index: usize,
        /// The offending element.
        field: &'static str,
        /// The value that failed to parse.
        value: String,
        /// The underlying error.
        #[source]
        error: std::num::ParseFloatError,
    },
}

/// An error reading from or writing to the known-failures tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The tracker document could not be read.
    #[error("error reading tracker document `{path}`")]
    Read {
        /// The document path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The tracker document could not be parsed.
    #[error("error parsing tracker document `{path}`")]
    Parse {
        /// The document path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },

    /// The tracker document could not be written back.
    #[error("error writing tracker document `{path}`")]
    Write {
        /// The document path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: atomicwrites::Error<io::Error>,
    },

    /// The requested worksheet does not exist in the document.
    #[error("worksheet `{worksheet}` not found in tracker document")]
    WorksheetNotFound {
        /// The worksheet that was requested.
        worksheet: String,
    },

    /// A row handle no longer fits the worksheet it was fetched from.
    #[error(
        "row {row} is out of range for worksheet `{worksheet}` ({len} rows): the snapshot is stale"
    )]
    StaleRow {
        /// The worksheet being modified.
        worksheet: String,
        /// The out-of-range row handle.
        row: usize,
        /// The worksheet's current length.
        len: usize,
    },

    /// The same row handle appears twice in one delete set.
    #[error("row {row} appears more than once in the delete set for worksheet `{worksheet}`")]
    DuplicateRow {
        /// The worksheet being modified.
        worksheet: String,
        /// The duplicated row handle.
        row: usize,
    },

    /// A name failed to translate while constructing a row for insertion.
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// An error loading the roundup configuration file.
#[derive(Debug, Error)]
#[error("failed to load roundup config at `{config_file}`")]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// The config file that failed to load.
    pub fn config_file(&self) -> &camino::Utf8Path {
        &self.config_file
    }

    /// The kind of error that occurred.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kinds of errors that can occur while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigParseErrorKind {
    /// The file could not be read.
    #[error("error reading config file")]
    Read {
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The file is not valid TOML for the expected shape.
    #[error("error deserializing config file")]
    Deserialize {
        /// The underlying error.
        #[source]
        error: Box<toml::de::Error>,
    },

    /// The configuration defines no scopes, so there is nothing to reconcile.
    #[error("no scopes defined")]
    NoScopes,

    /// Two scopes share a name.
    #[error("scope `{name}` is defined more than once")]
    DuplicateScope {
        /// The duplicated scope name.
        name: String,
    },

    /// A mapping table is not a bijection.
    #[error("invalid {axis} mapping table{}", scope_suffix(.scope.as_deref()))]
    InvalidMapping {
        /// The axis of the offending table.
        axis: MapAxis,
        /// The scope the table belongs to, or `None` for the global table.
        scope: Option<String>,
        /// The underlying error.
        #[source]
        error: MapBuildError,
    },
}

fn scope_suffix(scope: Option<&str>) -> String {
    match scope {
        Some(name) => format!(" for scope `{name}`"),
        None => String::new(),
    }
}
