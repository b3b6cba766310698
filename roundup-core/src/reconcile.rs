// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The failure-set reconciliation engine.
//!
//! [`reconcile`] compares the current build's results (internal namespace)
//! against the tracker's known failures (external namespace), bridged by a
//! [`NameMapping`], and classifies every record as fixed, still failing, new,
//! or unresolvable. It is a pure function: no logging, no I/O, no ambient
//! state, so identical inputs always produce identical outcomes.

pub use crate::errors::ReconcileError;
use crate::{
    errors::MappingError,
    mapping::NameMapping,
    record::{TestKey, TestResult, TrackedFailure},
    summary::FailureSummary,
};
use std::{collections::HashSet, fmt};

/// The default wipeout threshold: more new failures than this aborts the pass
/// as a presumed build malfunction.
pub const DEFAULT_WIPEOUT_THRESHOLD: usize = 500;

/// The classified output of one reconciliation pass.
#[derive(Clone, Debug)]
pub struct ReconcileOutcome {
    /// Known failures whose test now passes. These are candidates for
    /// deletion from the tracker; each still carries its fetched row handle.
    /// Sorted ascending by `(grouping, project, suite, test_name)`.
    pub fixed: Vec<TrackedFailure>,

    /// Currently-failing results with no corresponding tracker entry. These
    /// are candidates for insertion. Sorted ascending by
    /// `(grouping, project, suite, test_name)`.
    pub new_failures: Vec<TestResult>,

    /// Currently-failing results that are already tracked. Reporting only;
    /// no write-back action is taken for these. Sorted like `new_failures`.
    pub still_failing: Vec<TestResult>,

    /// Records whose namespace translation failed. Any entry here makes the
    /// whole outcome untrustworthy for write-back; the caller must halt with
    /// the full list once the pass is complete.
    pub unresolvable: Vec<Unresolvable>,

    /// Per-group failure counts for the current build.
    pub summary: FailureSummary,

    /// Input counts, for the pass report.
    pub stats: PassStats,
}

impl ReconcileOutcome {
    /// Returns true if every record was successfully classified.
    pub fn is_resolved(&self) -> bool {
        self.unresolvable.is_empty()
    }
}

/// Counts describing the inputs of a pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Total current results collected.
    pub total_results: usize,

    /// How many of them are passing.
    pub passed: usize,

    /// How many of them are failing.
    pub failed: usize,

    /// How many known failures were fetched from the tracker.
    pub known_failures: usize,
}

/// A record that could not be classified because a namespace translation
/// failed.
#[derive(Clone, Debug)]
pub enum Unresolvable {
    /// A tracker row whose external names could not be translated to the
    /// internal namespace during fixed-failure detection.
    KnownFailure {
        /// The offending tracker row.
        record: TrackedFailure,
        /// The translation failure.
        error: MappingError,
    },

    /// A failing result whose internal names could not be translated to the
    /// external namespace during new-failure detection.
    CurrentResult {
        /// The offending result.
        record: TestResult,
        /// The translation failure.
        error: MappingError,
    },
}

impl Unresolvable {
    /// The translation failure that blocked classification.
    pub fn error(&self) -> &MappingError {
        match self {
            Self::KnownFailure { error, .. } | Self::CurrentResult { error, .. } => error,
        }
    }
}

impl fmt::Display for Unresolvable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KnownFailure { record, error } => {
                write!(f, "tracked failure `{}` (row {}): {}", record.key(), record.row, error)
            }
            Self::CurrentResult { record, error } => {
                write!(f, "current result `{}`: {}", record.key(), error)
            }
        }
    }
}

/// Reconciles the current build's full result set against the tracker's
/// known-failure snapshot for the same scope.
///
/// `current_results` must contain passes and failures both; the function
/// partitions them itself. Matching is done on identity keys after
/// translating both sides into a common namespace, so a single pass over each
/// input suffices.
///
/// Mapping misses never abort mid-pass: they accumulate into
/// [`ReconcileOutcome::unresolvable`] so the operator sees the complete list.
/// The two errors that do abort are a duplicate identity key among the
/// current results and a new-failure count above `wipeout_threshold`.
pub fn reconcile(
    current_results: Vec<TestResult>,
    known_failures: Vec<TrackedFailure>,
    mapping: &NameMapping,
    wipeout_threshold: usize,
) -> Result<ReconcileOutcome, ReconcileError> {
    let mut seen = HashSet::with_capacity(current_results.len());
    for result in &current_results {
        if !seen.insert(result.key()) {
            return Err(ReconcileError::DuplicateTestKey { key: result.key() });
        }
    }

    let (failed, passed): (Vec<_>, Vec<_>) =
        current_results.into_iter().partition(TestResult::is_failing);

    let stats = PassStats {
        total_results: passed.len() + failed.len(),
        passed: passed.len(),
        failed: failed.len(),
        known_failures: known_failures.len(),
    };

    let passed_keys: HashSet<TestKey> = passed.iter().map(TestResult::key).collect();
    // Known-failure identities in the external namespace need no translation.
    let known_keys: HashSet<TestKey> = known_failures.iter().map(TrackedFailure::key).collect();

    let mut fixed = Vec::new();
    let mut unresolvable = Vec::new();
    for known in known_failures {
        match mapping.to_internal_key(&known) {
            Ok(key) => {
                if passed_keys.contains(&key) {
                    fixed.push(known);
                }
            }
            Err(error) => unresolvable.push(Unresolvable::KnownFailure {
                record: known,
                error,
            }),
        }
    }

    let mut new_failures = Vec::new();
    let mut still_failing = Vec::new();
    for result in failed {
        match mapping.to_external_key(&result) {
            Ok(key) => {
                if known_keys.contains(&key) {
                    still_failing.push(result);
                } else {
                    new_failures.push(result);
                }
            }
            Err(error) => unresolvable.push(Unresolvable::CurrentResult {
                record: result,
                error,
            }),
        }
    }

    fixed.sort_by(|a, b| {
        (&a.grouping, &a.project, &a.suite, &a.test_name)
            .cmp(&(&b.grouping, &b.project, &b.suite, &b.test_name))
    });
    sort_results(&mut new_failures);
    sort_results(&mut still_failing);

    let summary = FailureSummary::new(
        still_failing
            .iter()
            .chain(&new_failures)
            .chain(unresolvable.iter().filter_map(|u| match u {
                Unresolvable::CurrentResult { record, .. } => Some(record),
                Unresolvable::KnownFailure { .. } => None,
            })),
        &new_failures,
    );

    if new_failures.len() > wipeout_threshold {
        return Err(ReconcileError::Wipeout {
            new_failure_count: new_failures.len(),
            threshold: wipeout_threshold,
            summary,
        });
    }

    Ok(ReconcileOutcome {
        fixed,
        new_failures,
        still_failing,
        unresolvable,
        summary,
        stats,
    })
}

fn sort_results(results: &mut [TestResult]) {
    results.sort_by(|a, b| {
        (&a.grouping, &a.project, &a.suite, &a.test_name)
            .cmp(&(&b.grouping, &b.project, &b.suite, &b.test_name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{MapAxis, NameMap};
    use pretty_assertions::assert_eq;

    fn mapping() -> NameMapping {
        NameMapping::new(
            NameMap::new(
                MapAxis::Grouping,
                [("Trunk-display".to_owned(), "Trunk".to_owned())],
            )
            .unwrap(),
            NameMap::new(MapAxis::Project, [("Core".to_owned(), "core".to_owned())]).unwrap(),
        )
    }

    fn result(suite: &str, test_name: &str, failed_since: &str) -> TestResult {
        TestResult {
            grouping: "Trunk".to_owned(),
            project: "core".to_owned(),
            suite: suite.to_owned(),
            test_name: test_name.to_owned(),
            skipped: false,
            failed_since: failed_since.to_owned(),
            duration: 0.1,
            failure: (failed_since != "0").then(|| "stack trace".to_owned()),
        }
    }

    fn known(suite: &str, test_name: &str, row: usize) -> TrackedFailure {
        TrackedFailure {
            grouping: "Trunk-display".to_owned(),
            project: "Core".to_owned(),
            suite: suite.to_owned(),
            test_name: test_name.to_owned(),
            failure: None,
            notes: None,
            row,
        }
    }

    #[test]
    fn passing_known_failure_is_fixed() {
        let outcome = reconcile(
            vec![result("FooTest", "testBar", "0")],
            vec![known("FooTest", "testBar", 5)],
            &mapping(),
            DEFAULT_WIPEOUT_THRESHOLD,
        )
        .expect("pass completes");

        assert_eq!(outcome.fixed, vec![known("FooTest", "testBar", 5)]);
        assert_eq!(outcome.new_failures, vec![]);
        assert_eq!(outcome.still_failing, vec![]);
        assert!(outcome.is_resolved());
        assert_eq!(outcome.stats.passed, 1);
        assert_eq!(outcome.stats.known_failures, 1);
    }

    #[test]
    fn untracked_failure_is_new_and_tracked_failure_is_not() {
        let outcome = reconcile(
            vec![
                result("FooTest", "testKnown", "12"),
                result("FooTest", "testNew", "12"),
            ],
            vec![known("FooTest", "testKnown", 2)],
            &mapping(),
            DEFAULT_WIPEOUT_THRESHOLD,
        )
        .expect("pass completes");

        assert_eq!(outcome.fixed, vec![]);
        assert_eq!(outcome.new_failures, vec![result("FooTest", "testNew", "12")]);
        assert_eq!(
            outcome.still_failing,
            vec![result("FooTest", "testKnown", "12")]
        );
    }

    #[test]
    fn fixed_and_new_are_disjoint_and_sorted() {
        let outcome = reconcile(
            vec![
                result("ZTest", "z", "3"),
                result("ATest", "a", "3"),
                result("MTest", "m", "0"),
            ],
            vec![known("MTest", "m", 9), known("QTest", "q", 4)],
            &mapping(),
            DEFAULT_WIPEOUT_THRESHOLD,
        )
        .expect("pass completes");

        assert_eq!(outcome.fixed, vec![known("MTest", "m", 9)]);
        assert_eq!(
            outcome.new_failures,
            vec![result("ATest", "a", "3"), result("ZTest", "z", "3")]
        );
        // A record classified as fixed draws from known failures, new draws
        // from current results: the sets cannot overlap.
        for fixed in &outcome.fixed {
            assert!(
                outcome
                    .new_failures
                    .iter()
                    .all(|n| mapping().to_internal_key(fixed).unwrap() != n.key())
            );
        }
    }

    #[test]
    fn unmapped_known_failure_is_unresolvable_not_fatal_mid_pass() {
        let mut stray = known("FooTest", "testBar", 7);
        stray.grouping = "Unknown-display".to_owned();

        let outcome = reconcile(
            vec![result("FooTest", "testBar", "0"), result("BarTest", "t", "4")],
            vec![stray, known("FooTest", "testBar", 8)],
            &mapping(),
            DEFAULT_WIPEOUT_THRESHOLD,
        )
        .expect("mapping misses accumulate instead of aborting");

        // The resolvable known failure was still classified.
        assert_eq!(outcome.fixed.len(), 1);
        assert_eq!(outcome.fixed[0].row, 8);
        assert_eq!(outcome.unresolvable.len(), 1);
        assert!(!outcome.is_resolved());
        match &outcome.unresolvable[0] {
            Unresolvable::KnownFailure { record, error } => {
                assert_eq!(record.row, 7);
                assert_eq!(error.name(), "Unknown-display");
            }
            other => panic!("expected unresolvable known failure, got {other}"),
        }
    }

    #[test]
    fn unmapped_current_failure_is_unresolvable() {
        let mut foreign = result("FooTest", "testBar", "4");
        foreign.project = "orphan".to_owned();

        let outcome = reconcile(
            vec![foreign],
            vec![],
            &mapping(),
            DEFAULT_WIPEOUT_THRESHOLD,
        )
        .expect("mapping misses accumulate instead of aborting");

        assert_eq!(outcome.new_failures, vec![]);
        assert_eq!(outcome.unresolvable.len(), 1);
        match &outcome.unresolvable[0] {
            Unresolvable::CurrentResult { record, error } => {
                assert_eq!(record.project, "orphan");
                assert_eq!(error.name(), "orphan");
            }
            other => panic!("expected unresolvable current result, got {other}"),
        }
    }

    #[test]
    fn wipeout_boundary_is_exclusive() {
        let at_threshold: Vec<_> = (0..3)
            .map(|i| result("BigTest", &format!("test{i}"), "2"))
            .collect();
        let outcome = reconcile(at_threshold, vec![], &mapping(), 3).expect("at threshold is fine");
        assert_eq!(outcome.new_failures.len(), 3);

        let over_threshold: Vec<_> = (0..4)
            .map(|i| result("BigTest", &format!("test{i}"), "2"))
            .collect();
        let err = reconcile(over_threshold, vec![], &mapping(), 3).unwrap_err();
        match err {
            ReconcileError::Wipeout {
                new_failure_count,
                threshold,
                summary,
            } => {
                assert_eq!(new_failure_count, 4);
                assert_eq!(threshold, 3);
                assert_eq!(summary.new_failures[0].count, 4);
            }
            other => panic!("expected wipeout, got {other}"),
        }
    }

    #[test]
    fn default_threshold_tolerates_500_and_aborts_at_501() {
        let failures = |count: usize| -> Vec<TestResult> {
            (0..count)
                .map(|i| result("MassTest", &format!("test{i}"), "8"))
                .collect()
        };

        let outcome = reconcile(
            failures(DEFAULT_WIPEOUT_THRESHOLD),
            vec![],
            &mapping(),
            DEFAULT_WIPEOUT_THRESHOLD,
        )
        .expect("exactly the threshold is not a wipeout");
        assert_eq!(outcome.new_failures.len(), 500);

        let err = reconcile(
            failures(DEFAULT_WIPEOUT_THRESHOLD + 1),
            vec![],
            &mapping(),
            DEFAULT_WIPEOUT_THRESHOLD,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Wipeout {
                new_failure_count: 501,
                threshold: 500,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_identity_key_is_a_hard_error() {
        let err = reconcile(
            vec![result("FooTest", "testBar", "0"), result("FooTest", "testBar", "7")],
            vec![],
            &mapping(),
            DEFAULT_WIPEOUT_THRESHOLD,
        )
        .unwrap_err();
        match err {
            ReconcileError::DuplicateTestKey { key } => {
                assert_eq!(key, TestKey::new("Trunk", "core", "FooTest", "testBar"));
            }
            other => panic!("expected duplicate key error, got {other}"),
        }
    }

    #[test]
    fn reconcile_is_a_pure_function_of_its_inputs() {
        let results = vec![
            result("FooTest", "testBar", "0"),
            result("BarTest", "testNew", "6"),
        ];
        let failures = vec![known("FooTest", "testBar", 1), known("GoneTest", "t", 2)];

        let first = reconcile(
            results.clone(),
            failures.clone(),
            &mapping(),
            DEFAULT_WIPEOUT_THRESHOLD,
        )
        .unwrap();
        let second = reconcile(results, failures, &mapping(), DEFAULT_WIPEOUT_THRESHOLD).unwrap();

        assert_eq!(first.fixed, second.fixed);
        assert_eq!(first.new_failures, second.new_failures);
        assert_eq!(first.still_failing, second.still_failing);
        assert_eq!(first.unresolvable.len(), second.unresolvable.len());
        assert_eq!(first.summary, second.summary);
    }

    #[test]
    fn summary_counts_every_current_failure() {
        let mut foreign = result("UnmappedTest", "t", "4");
        foreign.grouping = "Other".to_owned();

        let outcome = reconcile(
            vec![
                result("FooTest", "testKnown", "12"),
                result("FooTest", "testNew", "12"),
                foreign,
            ],
            vec![known("FooTest", "testKnown", 1)],
            &mapping(),
            DEFAULT_WIPEOUT_THRESHOLD,
        )
        .unwrap();

        let total: usize = outcome.summary.all_failures.iter().map(|g| g.count).sum();
        assert_eq!(total, 3);
        let new_total: usize = outcome.summary.new_failures.iter().map(|g| g.count).sum();
        assert_eq!(new_total, 1);
    }
}
