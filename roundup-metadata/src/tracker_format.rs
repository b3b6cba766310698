// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The serialized form of the known-failures tracker: a document of named
/// worksheets, each an ordered list of rows.
///
/// Row positions are meaningful — the engine addresses rows by their 1-based
/// index within a worksheet — so worksheets preserve insertion order and
/// deletions shift everything below them, exactly like rows in the tabular
/// document this format stands in for.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TrackerDocument {
    /// Worksheets by name. Each reconciliation scope reads and writes exactly
    /// one worksheet.
    pub worksheets: IndexMap<String, Vec<TrackerRow>>,
}

impl TrackerDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the rows of the named worksheet, or `None` if no such worksheet
    /// exists.
    pub fn worksheet(&self, name: &str) -> Option<&[TrackerRow]> {
        self.worksheets.get(name).map(Vec::as_slice)
    }
}

/// One tracked failure as stored in the tracker document.
///
/// The `grouping` and `project` fields are in the external (display)
/// namespace, not the build system's internal one.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TrackerRow {
    /// The display name of the build family this failure belongs to.
    pub grouping: String,

    /// The display name of the project this failure belongs to.
    pub project: String,

    /// The test suite (typically a class name).
    pub suite: String,

    /// The test name within the suite.
    pub test: String,

    /// Truncated failure detail, if any was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,

    /// The person responsible for this failure.
    pub responsible: String,

    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
