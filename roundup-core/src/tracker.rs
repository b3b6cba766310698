// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The known-failures tracker: fetching the current snapshot, deleting fixed
//! rows, and inserting new failures.
//!
//! The tracker is addressed through the [`KnownFailureSource`] and
//! [`FailureSink`] traits; the reconciliation driver never sees the concrete
//! storage. [`JsonTracker`] is the file-backed implementation,
//! [`MemoryTracker`] the in-memory one used by tests.

use crate::{
    errors::TrackerError,
    mapping::NameMapping,
    record::{TestResult, TrackedFailure},
};
use camino::Utf8PathBuf;
use chrono::Local;
use roundup_metadata::{TrackerDocument, TrackerRow};
use std::{fs, io::Write};
use tracing::debug;

/// Failure detail is truncated to this many characters before insertion; the
/// tracker stores a teaser, the full trace stays in the CI report.
pub const MAX_FAILURE_DETAIL_LEN: usize = 75;

/// The `responsible` value given to every newly inserted row.
pub const UNASSIGNED: &str = "Unassigned";

/// A source of previously recorded failures.
pub trait KnownFailureSource {
    /// Fetches the current snapshot of the named worksheet. Every record
    /// carries its 1-based row handle, valid until the next mutation.
    fn fetch(&self, worksheet: &str) -> Result<Vec<TrackedFailure>, TrackerError>;
}

/// Applies reconciliation results to the tracker.
///
/// The sink is the sole mutator of the tracker for the lifetime of a pass; no
/// other agent may race row indices during the delete/insert sequence.
pub trait FailureSink {
    /// Deletes the given fixed failures from the named worksheet, using the
    /// row handles fetched earlier in the same pass.
    fn delete_fixed(
        &mut self,
        worksheet: &str,
        fixed: &[TrackedFailure],
    ) -> Result<(), TrackerError>;

    /// Inserts the given new failures into the named worksheet, translating
    /// their names back into the external namespace.
    fn insert_new(
        &mut self,
        worksheet: &str,
        new_failures: &[TestResult],
        mapping: &NameMapping,
    ) -> Result<(), TrackerError>;
}

/// A tracker backed by a JSON document on disk.
///
/// The document is read once at open; every mutation rewrites the file
/// atomically so a crashed pass never leaves a half-written tracker behind.
#[derive(Debug)]
pub struct JsonTracker {
    path: Utf8PathBuf,
    document: TrackerDocument,
}

impl JsonTracker {
    /// Opens the tracker document at `path`.
    pub fn open(path: impl Into<Utf8PathBuf>) -> Result<Self, TrackerError> {
        let path = path.into();
        let contents = fs::read_to_string(&path).map_err(|error| TrackerError::Read {
            path: path.clone(),
            error,
        })?;
        let document = serde_json::from_str(&contents).map_err(|error| TrackerError::Parse {
            path: path.clone(),
            error,
        })?;
        Ok(Self { path, document })
    }

    /// The parsed document.
    pub fn document(&self) -> &TrackerDocument {
        &self.document
    }

    fn persist(&self) -> Result<(), TrackerError> {
        atomicwrites::AtomicFile::new(&self.path, atomicwrites::AllowOverwrite)
            .write(|file| {
                serde_json::to_writer_pretty(&mut *file, &self.document)?;
                file.write_all(b"\n")
            })
            .map_err(|error| TrackerError::Write {
                path: self.path.clone(),
                error,
            })
    }
}

impl KnownFailureSource for JsonTracker {
    fn fetch(&self, worksheet: &str) -> Result<Vec<TrackedFailure>, TrackerError> {
        fetch_rows(&self.document, worksheet)
    }
}

impl FailureSink for JsonTracker {
    fn delete_fixed(
        &mut self,
        worksheet: &str,
        fixed: &[TrackedFailure],
    ) -> Result<(), TrackerError> {
        delete_rows(&mut self.document, worksheet, fixed)?;
        self.persist()
    }

    fn insert_new(
        &mut self,
        worksheet: &str,
        new_failures: &[TestResult],
        mapping: &NameMapping,
    ) -> Result<(), TrackerError> {
        insert_rows(&mut self.document, worksheet, new_failures, mapping)?;
        self.persist()
    }
}

/// A tracker held entirely in memory. Implements the same contracts as
/// [`JsonTracker`] minus persistence; useful for tests and dry harnesses.
#[derive(Debug, Default)]
pub struct MemoryTracker {
    document: TrackerDocument,
}

impl MemoryTracker {
    /// Creates a tracker over the given document.
    pub fn new(document: TrackerDocument) -> Self {
        Self { document }
    }

    /// The current document.
    pub fn document(&self) -> &TrackerDocument {
        &self.document
    }
}

impl KnownFailureSource for MemoryTracker {
    fn fetch(&self, worksheet: &str) -> Result<Vec<TrackedFailure>, TrackerError> {
        fetch_rows(&self.document, worksheet)
    }
}

impl FailureSink for MemoryTracker {
    fn delete_fixed(
        &mut self,
        worksheet: &str,
        fixed: &[TrackedFailure],
    ) -> Result<(), TrackerError> {
        delete_rows(&mut self.document, worksheet, fixed)
    }

    fn insert_new(
        &mut self,
        worksheet: &str,
        new_failures: &[TestResult],
        mapping: &NameMapping,
    ) -> Result<(), TrackerError> {
        insert_rows(&mut self.document, worksheet, new_failures, mapping)
    }
}

fn fetch_rows(
    document: &TrackerDocument,
    worksheet: &str,
) -> Result<Vec<TrackedFailure>, TrackerError> {
    let rows = document
        .worksheet(worksheet)
        .ok_or_else(|| TrackerError::WorksheetNotFound {
            worksheet: worksheet.to_owned(),
        })?;
    Ok(rows
        .iter()
        .enumerate()
        .map(|(index, row)| TrackedFailure {
            grouping: row.grouping.clone(),
            project: row.project.clone(),
            suite: row.suite.clone(),
            test_name: row.test.clone(),
            failure: row.failure.clone(),
            notes: row.notes.clone(),
            row: index + 1,
        })
        .collect())
}

fn delete_rows(
    document: &mut TrackerDocument,
    worksheet: &str,
    fixed: &[TrackedFailure],
) -> Result<(), TrackerError> {
    let rows = document
        .worksheets
        .get_mut(worksheet)
        .ok_or_else(|| TrackerError::WorksheetNotFound {
            worksheet: worksheet.to_owned(),
        })?;

    // Delete bottom-up: each removal shifts every row below it, so handles
    // above the removal point stay valid only in descending order.
    let mut handles: Vec<usize> = fixed.iter().map(|f| f.row).collect();
    handles.sort_unstable_by(|a, b| b.cmp(a));
    for pair in handles.windows(2) {
        if pair[0] == pair[1] {
            return Err(TrackerError::DuplicateRow {
                worksheet: worksheet.to_owned(),
                row: pair[0],
            });
        }
    }

    for row in handles {
        if row == 0 || row > rows.len() {
            return Err(TrackerError::StaleRow {
                worksheet: worksheet.to_owned(),
                row,
                len: rows.len(),
            });
        }
        let removed = rows.remove(row - 1);
        debug!(
            "deleted row {row} ({},{},{},{}) from worksheet `{worksheet}`",
            removed.grouping, removed.project, removed.suite, removed.test
        );
    }
    Ok(())
}

fn insert_rows(
    document: &mut TrackerDocument,
    worksheet: &str,
    new_failures: &[TestResult],
    mapping: &NameMapping,
) -> Result<(), TrackerError> {
    let timestamp = Local::now().format("%H_%M_%a_%d_%b_%Y");
    let note = format!("New failure {timestamp}");

    let rows = document.worksheets.entry(worksheet.to_owned()).or_default();
    for failure in new_failures {
        let grouping = mapping.groupings.to_external(&failure.grouping)?;
        let project = mapping.projects.to_external(&failure.project)?;
        let row = TrackerRow {
            grouping: grouping.to_owned(),
            project: project.to_owned(),
            suite: failure.suite.clone(),
            test: failure.test_name.clone(),
            failure: failure.failure.as_deref().map(truncate_detail),
            responsible: UNASSIGNED.to_owned(),
            notes: Some(note.clone()),
        };
        debug!(
            "inserting ({},{},{},{}) into worksheet `{worksheet}`",
            row.grouping, row.project, row.suite, row.test
        );
        rows.push(row);
    }
    Ok(())
}

fn truncate_detail(detail: &str) -> String {
    detail.chars().take(MAX_FAILURE_DETAIL_LEN).collect()
}
