// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collecting test results from CI run reports.
//!
//! The concrete collector walks a Jenkins-style jobs tree:
//! `<reports-dir>/<grouping>/modules/<project>/builds/<build>/junitResult.xml`,
//! where `<grouping>` and `<project>` are internal build-system names and
//! `<build>` directories are named by timestamp, so the lexically greatest one
//! is the latest build.

mod junit;

use crate::{errors::CollectError, record::TestResult};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing::debug;

/// The file name Jenkins gives aggregated JUnit results within a build
/// directory.
const REPORT_FILE_NAME: &str = "junitResult.xml";

/// A source of current test results for one scope.
///
/// `groupings` and `projects` are internal build-system names; every
/// grouping × project combination is probed. Implementations must return the
/// full result set — passes and failures both — and must fail with
/// [`CollectError::InsufficientReports`] when fewer source reports exist than
/// the scope expects, since that means the build has not finished.
pub trait ReportCollector {
    /// Collects all results for the given grouping × project combinations.
    fn collect(&self, groupings: &[&str], projects: &[&str])
    -> Result<Vec<TestResult>, CollectError>;
}

/// Collects results from the latest build's `junitResult.xml` under each
/// grouping × project directory of a Jenkins jobs tree.
#[derive(Clone, Debug)]
pub struct JenkinsCollector {
    reports_dir: Utf8PathBuf,
    min_report_files: usize,
}

impl JenkinsCollector {
    /// Creates a collector rooted at `reports_dir`, requiring at least
    /// `min_report_files` report files across the whole scope.
    pub fn new(reports_dir: impl Into<Utf8PathBuf>, min_report_files: usize) -> Self {
        Self {
            reports_dir: reports_dir.into(),
            min_report_files,
        }
    }

    fn report_paths(
        &self,
        groupings: &[&str],
        projects: &[&str],
    ) -> Result<Vec<(String, String, Utf8PathBuf)>, CollectError> {
        let mut paths = Vec::new();
        for &grouping in groupings {
            for &project in projects {
                let builds_dir = self
                    .reports_dir
                    .join(grouping)
                    .join("modules")
                    .join(project)
                    .join("builds");
                if !builds_dir.is_dir() {
                    debug!("skipping `{builds_dir}`: no builds directory");
                    continue;
                }
                let Some(build_dir) = latest_build_dir(&builds_dir)? else {
                    debug!("skipping `{builds_dir}`: no build directories");
                    continue;
                };
                let report = build_dir.join(REPORT_FILE_NAME);
                if report.is_file() {
                    debug!("will parse `{report}`");
                    paths.push((grouping.to_owned(), project.to_owned(), report));
                } else {
                    debug!("skipping `{report}`: file does not exist");
                }
            }
        }
        Ok(paths)
    }
}

impl ReportCollector for JenkinsCollector {
    fn collect(
        &self,
        groupings: &[&str],
        projects: &[&str],
    ) -> Result<Vec<TestResult>, CollectError> {
        let paths = self.report_paths(groupings, projects)?;
        if paths.len() < self.min_report_files {
            return Err(CollectError::InsufficientReports {
                expected: self.min_report_files,
                found: paths.len(),
            });
        }

        let mut results = Vec::new();
        for (grouping, project, path) in paths {
            let contents = fs::read_to_string(&path).map_err(|error| CollectError::ReadReport {
                path: path.clone(),
                error,
            })?;
            let cases = junit::parse_report(&grouping, &project, &contents)
                .map_err(|error| CollectError::ParseReport { path: path.clone(), error })?;
            debug!("parsed {} test cases from `{path}`", cases.len());
            results.extend(cases);
        }
        Ok(results)
    }
}

/// Returns the lexically greatest build directory under `builds_dir`, which
/// for Jenkins' timestamp-named directories is the most recent build.
fn latest_build_dir(builds_dir: &Utf8Path) -> Result<Option<Utf8PathBuf>, CollectError> {
    let list_error = |error| CollectError::ListBuilds {
        path: builds_dir.to_owned(),
        error,
    };

    let mut latest: Option<Utf8PathBuf> = None;
    for entry in builds_dir.read_dir_utf8().map_err(list_error)? {
        let entry = entry.map_err(list_error)?;
        if !entry.file_type().map_err(list_error)?.is_dir() {
            continue;
        }
        let path = entry.into_path();
        match &latest {
            Some(current) if path.file_name() <= current.file_name() => {}
            _ => latest = Some(path),
        }
    }
    Ok(latest)
}
