// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable rendering of a reconciliation pass.
//!
//! The reporter is write-only plumbing: it takes the outcome and summary the
//! engine produced and renders them to any [`io::Write`]. Styling is opt-in
//! so captured output in tests and piped output in CI stay plain.

use crate::{
    helpers::plural,
    reconcile::{ReconcileOutcome, Unresolvable},
    record::TestResult,
    summary::FailureSummary,
};
use owo_colors::{OwoColorize, Style, style};
use std::io;

/// Styles used by the pass reporter.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReportStyles {
    heading: Style,
    bold: Style,
    fixed: Style,
    new_failure: Style,
}

impl ReportStyles {
    fn colorized() -> Self {
        Self {
            heading: style().bold().underline(),
            bold: style().bold(),
            fixed: style().green(),
            new_failure: style().red(),
        }
    }
}

/// Renders reconciliation outcomes and summaries for one invocation.
#[derive(Clone, Debug, Default)]
pub struct PassReporter {
    styles: ReportStyles,
}

impl PassReporter {
    /// Creates a reporter that renders plain text.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reporter that colorizes its output.
    pub fn colorized() -> Self {
        Self {
            styles: ReportStyles::colorized(),
        }
    }

    /// Writes the heading that introduces one scope's pass.
    pub fn write_scope_heading(&self, writer: &mut dyn io::Write, name: &str) -> io::Result<()> {
        writeln!(writer, "=== {} ===", name.style(self.styles.heading))
    }

    /// Writes the classified outcome of one pass: counts, the fixed list, and
    /// the new-failure list.
    pub fn write_outcome(
        &self,
        writer: &mut dyn io::Write,
        outcome: &ReconcileOutcome,
    ) -> io::Result<()> {
        let stats = &outcome.stats;
        writeln!(
            writer,
            "{} {} ran: {} passed, {} failing",
            stats.total_results.style(self.styles.bold),
            plural::tests_str(stats.total_results),
            stats.passed,
            stats.failed,
        )?;
        writeln!(
            writer,
            "of the {} {} previously reported, {} now fixed",
            stats.known_failures,
            plural::failures_str(stats.known_failures),
            outcome.fixed.len().style(self.styles.fixed),
        )?;

        if outcome.fixed.is_empty() {
            writeln!(writer, "no fixed failures to remove")?;
        } else {
            writeln!(
                writer,
                "remove these {} {} from the tracker:",
                outcome.fixed.len().style(self.styles.fixed),
                plural::failures_str(outcome.fixed.len()),
            )?;
            for (index, fixed) in outcome.fixed.iter().enumerate() {
                writeln!(
                    writer,
                    "  {}: row={}, {}",
                    index + 1,
                    fixed.row,
                    fixed.key(),
                )?;
            }
        }

        if outcome.new_failures.is_empty() {
            writeln!(writer, "no new failures to add")?;
        } else {
            writeln!(
                writer,
                "add these {} {} to the tracker:",
                outcome.new_failures.len().style(self.styles.new_failure),
                plural::failures_str(outcome.new_failures.len()),
            )?;
            for (index, failure) in outcome.new_failures.iter().enumerate() {
                writeln!(writer, "  {}: {}", index + 1, failure.key())?;
            }
        }

        if !outcome.unresolvable.is_empty() {
            self.write_unresolvable(writer, &outcome.unresolvable)?;
        }
        Ok(())
    }

    /// Writes the still-failing list. Reporting only — these records trigger
    /// no write-back — so the driver typically gates this behind a verbose
    /// flag.
    pub fn write_still_failing(
        &self,
        writer: &mut dyn io::Write,
        still_failing: &[TestResult],
    ) -> io::Result<()> {
        writeln!(
            writer,
            "{} tracked {} still failing:",
            still_failing.len().style(self.styles.bold),
            plural::failures_str(still_failing.len()),
        )?;
        for (index, failure) in still_failing.iter().enumerate() {
            writeln!(writer, "  {}: {}", index + 1, failure.key())?;
        }
        Ok(())
    }

    /// Writes the per-group failure counts.
    pub fn write_summary(
        &self,
        writer: &mut dyn io::Write,
        summary: &FailureSummary,
    ) -> io::Result<()> {
        writeln!(writer, "{}", "total failures by group:".style(self.styles.bold))?;
        if summary.all_failures.is_empty() {
            writeln!(writer, "  (none)")?;
        }
        for group in &summary.all_failures {
            writeln!(
                writer,
                "  {} has {} {}",
                group.group,
                group.count,
                plural::failures_str(group.count)
            )?;
        }

        writeln!(writer, "{}", "new failures by group:".style(self.styles.bold))?;
        if summary.new_failures.is_empty() {
            writeln!(writer, "  (none)")?;
        }
        for group in &summary.new_failures {
            writeln!(
                writer,
                "  {} has {} new {}",
                group.group,
                group.count,
                plural::failures_str(group.count)
            )?;
        }
        Ok(())
    }

    /// Writes the unresolvable-record list.
    pub fn write_unresolvable(
        &self,
        writer: &mut dyn io::Write,
        unresolvable: &[Unresolvable],
    ) -> io::Result<()> {
        writeln!(
            writer,
            "{} {} could not be resolved:",
            unresolvable.len().style(self.styles.new_failure),
            plural::records_str(unresolvable.len()),
        )?;
        for record in unresolvable {
            writeln!(writer, "  - {record}")?;
        }
        Ok(())
    }
}
