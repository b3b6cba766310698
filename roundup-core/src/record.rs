// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The data model for test outcomes and tracked failures.
//!
//! Two namespaces are in play throughout roundup: the build system's internal
//! identifiers, and the external display identifiers used by the tracker.
//! [`TestResult`] records carry whichever namespace their source produced
//! (internal, for results collected from CI reports); [`TrackedFailure`]
//! records always carry external names. [`TestKey`] is the identity both are
//! translated into for matching.

use std::fmt;

/// One test-case outcome, as parsed from a CI run report.
///
/// `grouping` and `project` are in the internal (build system) namespace when
/// the record comes from the report collector.
#[derive(Clone, Debug, PartialEq)]
pub struct TestResult {
    /// The build family/job category this result belongs to.
    pub grouping: String,

    /// The project (module) this result belongs to.
    pub project: String,

    /// The test suite, typically a class name.
    pub suite: String,

    /// The test name within the suite.
    pub test_name: String,

    /// Whether the test was skipped.
    pub skipped: bool,

    /// The build identifier this test has been failing since. The sentinel
    /// [`TestResult::NOT_FAILING`] means the test is not currently failing.
    pub failed_since: String,

    /// Test duration in seconds. Informational only; never part of identity.
    pub duration: f64,

    /// Failure detail (stack trace), present only for failing tests.
    pub failure: Option<String>,
}

impl TestResult {
    /// The `failed_since` sentinel for a test that is not currently failing.
    pub const NOT_FAILING: &'static str = "0";

    /// Returns true if this record represents a currently-failing test.
    pub fn is_failing(&self) -> bool {
        self.failed_since != Self::NOT_FAILING
    }

    /// Returns this result's identity key, in whatever namespace the record
    /// itself carries.
    pub fn key(&self) -> TestKey {
        TestKey::new(&self.grouping, &self.project, &self.suite, &self.test_name)
    }
}

/// One row of the known-failures tracker.
///
/// `grouping` and `project` are in the external (display) namespace. The `row`
/// handle is the 1-based position of this record within its worksheet at fetch
/// time; it is invalidated by any insertion or deletion, so it must never
/// outlive the reconciliation pass that fetched it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedFailure {
    /// Display name of the build family.
    pub grouping: String,

    /// Display name of the project.
    pub project: String,

    /// The test suite.
    pub suite: String,

    /// The test name within the suite.
    pub test_name: String,

    /// Failure detail recorded when the failure was first tracked.
    pub failure: Option<String>,

    /// Free-form operator notes.
    pub notes: Option<String>,

    /// 1-based position within the fetched worksheet snapshot.
    pub row: usize,
}

impl TrackedFailure {
    /// Returns this record's identity key in the external namespace it
    /// carries.
    pub fn key(&self) -> TestKey {
        TestKey::new(&self.grouping, &self.project, &self.suite, &self.test_name)
    }
}

/// The identity of one logical test, used to match records across sources.
///
/// Keys from differently-namespaced sources only compare meaningfully after
/// both have been translated into a common namespace via
/// [`NameMapping`](crate::mapping::NameMapping).
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestKey {
    /// The build family, in the namespace the key was built for.
    pub grouping: String,

    /// The project, in the namespace the key was built for.
    pub project: String,

    /// The test suite.
    pub suite: String,

    /// The test name.
    pub test_name: String,
}

impl TestKey {
    /// Creates a new key.
    pub fn new(
        grouping: impl Into<String>,
        project: impl Into<String>,
        suite: impl Into<String>,
        test_name: impl Into<String>,
    ) -> Self {
        Self {
            grouping: grouping.into(),
            project: project.into(),
            suite: suite.into(),
            test_name: test_name.into(),
        }
    }
}

impl fmt::Display for TestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.grouping, self.project, self.suite, self.test_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("0", false; "zero is not failing")]
    #[test_case("1731", true; "build number is failing")]
    #[test_case("unknown", true; "any non-zero string is failing")]
    fn failing_invariant(failed_since: &str, expected: bool) {
        let result = TestResult {
            grouping: "trunk-nightly".to_owned(),
            project: "core".to_owned(),
            suite: "FooTest".to_owned(),
            test_name: "testBar".to_owned(),
            skipped: false,
            failed_since: failed_since.to_owned(),
            duration: 0.25,
            failure: None,
        };
        assert_eq!(result.is_failing(), expected);
    }

    #[test]
    fn key_ordering_is_field_lexicographic() {
        let mut keys = vec![
            TestKey::new("trunk", "util", "ATest", "a"),
            TestKey::new("branch", "core", "ZTest", "z"),
            TestKey::new("trunk", "core", "BTest", "b"),
            TestKey::new("trunk", "core", "BTest", "a"),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                TestKey::new("branch", "core", "ZTest", "z"),
                TestKey::new("trunk", "core", "BTest", "a"),
                TestKey::new("trunk", "core", "BTest", "b"),
                TestKey::new("trunk", "util", "ATest", "a"),
            ]
        );
    }
}
