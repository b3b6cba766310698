// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full-pass flow: collect reports from disk, reconcile against a tracker,
//! apply the results, and verify the next pass converges.

use camino::Utf8Path;
use indoc::indoc;
use pretty_assertions::assert_eq;
use roundup_core::{
    collect::{JenkinsCollector, ReportCollector},
    mapping::{MapAxis, NameMap, NameMapping},
    reconcile::{DEFAULT_WIPEOUT_THRESHOLD, reconcile},
    tracker::{FailureSink, KnownFailureSource, MemoryTracker, UNASSIGNED},
};
use roundup_metadata::{TrackerDocument, TrackerRow};
use std::fs;

const WORKSHEET: &str = "Trunk";

const REPORT: &str = indoc! {r#"
    <?xml version="1.0" encoding="UTF-8"?>
    <result>
      <suites>
        <suite>
          <cases>
            <case>
              <className>FooTest</className>
              <testName>testFixed</testName>
              <duration>0.05</duration>
              <skipped>false</skipped>
              <failedSince>0</failedSince>
            </case>
            <case>
              <className>FooTest</className>
              <testName>testNew</testName>
              <duration>0.4</duration>
              <skipped>false</skipped>
              <failedSince>87</failedSince>
              <errorStackTrace>java.lang.IllegalStateException: kaboom</errorStackTrace>
            </case>
            <case>
              <className>BarTest</className>
              <testName>testStillFailing</testName>
              <duration>1.0</duration>
              <skipped>false</skipped>
              <failedSince>61</failedSince>
              <errorStackTrace>java.lang.AssertionError</errorStackTrace>
            </case>
          </cases>
        </suite>
      </suites>
    </result>
"#};

fn mapping() -> NameMapping {
    NameMapping::new(
        NameMap::new(
            MapAxis::Grouping,
            [("Trunk Nightly".to_owned(), "trunk-nightly".to_owned())],
        )
        .unwrap(),
        NameMap::new(MapAxis::Project, [("Core".to_owned(), "core".to_owned())]).unwrap(),
    )
}

fn tracker_with(tests: &[&str]) -> MemoryTracker {
    let mut document = TrackerDocument::new();
    document.worksheets.insert(
        WORKSHEET.to_owned(),
        tests
            .iter()
            .map(|test| TrackerRow {
                grouping: "Trunk Nightly".to_owned(),
                project: "Core".to_owned(),
                suite: if *test == "testStillFailing" {
                    "BarTest".to_owned()
                } else {
                    "FooTest".to_owned()
                },
                test: (*test).to_owned(),
                failure: None,
                responsible: UNASSIGNED.to_owned(),
                notes: None,
            })
            .collect(),
    );
    MemoryTracker::new(document)
}

fn write_report(root: &Utf8Path) {
    let build_dir = root
        .join("trunk-nightly")
        .join("modules")
        .join("core")
        .join("builds")
        .join("2026-01-06_22-00-00");
    fs::create_dir_all(&build_dir).unwrap();
    fs::write(build_dir.join("junitResult.xml"), REPORT).unwrap();
}

#[test]
fn apply_then_reconcile_again_converges() {
    let dir = camino_tempfile::Utf8TempDir::new().unwrap();
    write_report(dir.path());

    let mapping = mapping();
    let collector = JenkinsCollector::new(dir.path(), 1);
    let mut tracker = tracker_with(&["testFixed", "testStillFailing"]);

    // First pass: one failure is fixed, one is new, one keeps failing.
    let results = collector
        .collect(&["trunk-nightly"], &["core"])
        .expect("collection succeeds");
    let known = tracker.fetch(WORKSHEET).unwrap();
    let outcome = reconcile(results, known, &mapping, DEFAULT_WIPEOUT_THRESHOLD).unwrap();

    assert_eq!(outcome.stats.total_results, 3);
    assert_eq!(outcome.fixed.len(), 1);
    assert_eq!(outcome.fixed[0].test_name, "testFixed");
    assert_eq!(outcome.new_failures.len(), 1);
    assert_eq!(outcome.new_failures[0].test_name, "testNew");
    assert_eq!(outcome.still_failing.len(), 1);
    assert_eq!(outcome.still_failing[0].test_name, "testStillFailing");
    assert!(outcome.is_resolved());

    tracker.delete_fixed(WORKSHEET, &outcome.fixed).unwrap();
    tracker
        .insert_new(WORKSHEET, &outcome.new_failures, &mapping)
        .unwrap();

    // The inserted row carries external names and the insertion boilerplate.
    let rows = tracker.document().worksheet(WORKSHEET).unwrap();
    assert_eq!(rows.len(), 2);
    let inserted = rows.iter().find(|row| row.test == "testNew").unwrap();
    assert_eq!(inserted.grouping, "Trunk Nightly");
    assert_eq!(inserted.project, "Core");
    assert_eq!(inserted.responsible, UNASSIGNED);
    assert_eq!(
        inserted.failure.as_deref(),
        Some("java.lang.IllegalStateException: kaboom")
    );

    // Second pass over the same results: the tracker now matches the build,
    // so nothing is fixed and nothing is new.
    let results = collector
        .collect(&["trunk-nightly"], &["core"])
        .expect("collection succeeds");
    let known = tracker.fetch(WORKSHEET).unwrap();
    let outcome = reconcile(results, known, &mapping, DEFAULT_WIPEOUT_THRESHOLD).unwrap();

    assert_eq!(outcome.fixed, vec![]);
    assert_eq!(outcome.new_failures, vec![]);
    assert_eq!(outcome.still_failing.len(), 2);
    assert!(outcome.is_resolved());
}
