// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-group failure counts for human review.

use crate::record::TestResult;
use std::collections::BTreeMap;

/// Failure counts grouped by `grouping + " " + project`, computed once per
/// reconciliation pass.
///
/// Both tables are sorted descending by count; ties are broken by ascending
/// group key so the output is reproducible run to run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FailureSummary {
    /// Counts over every currently-failing result.
    pub all_failures: Vec<GroupCount>,

    /// Counts over the newly-detected failures only.
    pub new_failures: Vec<GroupCount>,
}

impl FailureSummary {
    /// Builds the summary from the full failed set and the new-failure set.
    ///
    /// Group keys are in the internal namespace, since both inputs come from
    /// the current build's results.
    pub fn new<'a>(
        failed: impl IntoIterator<Item = &'a TestResult>,
        new_failures: impl IntoIterator<Item = &'a TestResult>,
    ) -> Self {
        Self {
            all_failures: count_by_group(failed),
            new_failures: count_by_group(new_failures),
        }
    }
}

/// One row of a summary table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupCount {
    /// The `grouping + " " + project` key.
    pub group: String,

    /// How many failures fell into this group.
    pub count: usize,
}

fn count_by_group<'a>(results: impl IntoIterator<Item = &'a TestResult>) -> Vec<GroupCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for result in results {
        let group = format!("{} {}", result.grouping, result.project);
        *counts.entry(group).or_default() += 1;
    }

    let mut table: Vec<_> = counts
        .into_iter()
        .map(|(group, count)| GroupCount { group, count })
        .collect();
    // BTreeMap iteration already yields ascending keys; a stable sort on the
    // count alone keeps that as the tie-break.
    table.sort_by(|a, b| b.count.cmp(&a.count));
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn failing(grouping: &str, project: &str, test_name: &str) -> TestResult {
        TestResult {
            grouping: grouping.to_owned(),
            project: project.to_owned(),
            suite: "SomeTest".to_owned(),
            test_name: test_name.to_owned(),
            skipped: false,
            failed_since: "42".to_owned(),
            duration: 0.0,
            failure: Some("boom".to_owned()),
        }
    }

    #[test]
    fn counts_sort_descending_with_ascending_key_tie_break() {
        let failed = vec![
            failing("trunk", "util", "a"),
            failing("trunk", "core", "b"),
            failing("trunk", "core", "c"),
            failing("branch", "core", "d"),
            failing("trunk", "util", "e"),
            failing("trunk", "core", "f"),
            failing("branch", "util", "g"),
            failing("branch", "core", "h"),
        ];
        let new_failures = vec![failed[1].clone(), failed[3].clone()];

        let summary = FailureSummary::new(&failed, &new_failures);

        assert_eq!(
            summary.all_failures,
            vec![
                GroupCount {
                    group: "trunk core".to_owned(),
                    count: 3
                },
                GroupCount {
                    group: "branch core".to_owned(),
                    count: 2
                },
                GroupCount {
                    group: "trunk util".to_owned(),
                    count: 2
                },
                GroupCount {
                    group: "branch util".to_owned(),
                    count: 1
                },
            ]
        );
        assert_eq!(
            summary.new_failures,
            vec![
                GroupCount {
                    group: "branch core".to_owned(),
                    count: 1
                },
                GroupCount {
                    group: "trunk core".to_owned(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn empty_inputs_produce_empty_tables() {
        let summary = FailureSummary::new([], []);
        assert_eq!(summary, FailureSummary::default());
    }
}
