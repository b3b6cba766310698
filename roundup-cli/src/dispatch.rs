// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Top-level application and command routing.

use crate::{
    errors::{ExpectedError, Result},
    output::{OutputContext, OutputOpts, OutputWriter},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use roundup_core::{
    collect::{JenkinsCollector, ReportCollector},
    config::{RoundupConfig, ScopeConfig},
    reconcile::{ReconcileError, reconcile},
    report::PassReporter,
    tracker::{FailureSink, JsonTracker, KnownFailureSource},
};
use roundup_metadata::RoundupExitCode;
use std::io::Write;
use tracing::info;

/// Reconcile nightly CI test results against a known-failures tracker.
///
/// Roundup reads the latest JUnit result reports from a CI jobs tree, compares
/// the failures against the tracker's known-failure worksheets, and reports
/// which failures are fixed and which are new. With `--apply`, it also updates
/// the tracker.
#[derive(Debug, Parser)]
#[command(
    version,
    bin_name = "roundup",
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct RoundupApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

impl RoundupApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        match self.command {
            Command::Run(opts) => opts.exec(output, output_writer),
            Command::ShowConfig(opts) => opts.exec(output_writer),
        }
    }
}

/// All commands supported by roundup.
#[derive(Debug, Subcommand)]
enum Command {
    /// Reconcile the latest nightly results against the tracker.
    ///
    /// Every configured scope is processed in order: results are collected
    /// from the CI jobs tree, reconciled against the scope's tracker
    /// worksheet, and reported. This is a dry run unless --apply is passed.
    #[command(visible_alias = "r")]
    Run(RunOpts),

    /// Show the resolved configuration.
    ///
    /// Prints the tracker location, thresholds, and the validated mapping
    /// tables for every scope.
    ShowConfig(ShowConfigOpts),
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Config file [default: roundup.toml]
    #[arg(long, value_name = "PATH")]
    config: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn load(&self) -> Result<RoundupConfig> {
        let path = self
            .config
            .as_deref()
            .unwrap_or_else(|| Utf8Path::new(RoundupConfig::DEFAULT_CONFIG_PATH));
        Ok(RoundupConfig::from_file(path)?)
    }
}

#[derive(Debug, Args)]
struct RunOpts {
    #[clap(flatten)]
    config_opts: ConfigOpts,

    /// Update the tracker with the reconciliation results
    #[arg(long)]
    apply: bool,

    /// Override the configured CI reports directory
    #[arg(long, value_name = "DIR")]
    reports_dir: Option<Utf8PathBuf>,

    /// Override the configured minimum report-file count
    #[arg(long, value_name = "N")]
    min_report_files: Option<usize>,

    /// Override the configured wipeout threshold
    #[arg(long, value_name = "N")]
    wipeout_threshold: Option<usize>,
}

impl RunOpts {
    fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let mut config = self.config_opts.load()?;
        if let Some(dir) = self.reports_dir {
            config.reports_dir = dir;
        }
        if let Some(min) = self.min_report_files {
            config.min_report_files = min;
        }
        if let Some(threshold) = self.wipeout_threshold {
            config.wipeout_threshold = threshold;
        }

        let collector = JenkinsCollector::new(config.reports_dir.clone(), config.min_report_files);
        let mut tracker = JsonTracker::open(&config.tracker_path)?;
        let reporter = if output.color.should_colorize(supports_color::Stream::Stdout) {
            PassReporter::colorized()
        } else {
            PassReporter::new()
        };

        let mut writer = output_writer.stdout_writer();
        for scope in &config.scopes {
            run_scope(ScopeArgs {
                config: &config,
                scope,
                collector: &collector,
                tracker: &mut tracker,
                reporter: &reporter,
                writer: &mut writer,
                apply: self.apply,
                verbose: output.verbose,
            })?;
        }
        writer.flush().map_err(ExpectedError::write_report_error)?;
        Ok(RoundupExitCode::OK)
    }
}

struct ScopeArgs<'a> {
    config: &'a RoundupConfig,
    scope: &'a ScopeConfig,
    collector: &'a JenkinsCollector,
    tracker: &'a mut JsonTracker,
    reporter: &'a PassReporter,
    writer: &'a mut dyn Write,
    apply: bool,
    verbose: bool,
}

/// Runs one scope's pass: collect, fetch, reconcile, report, and (with
/// `--apply`) write back. The first failing scope halts the invocation; later
/// scopes are not attempted against a possibly broken build.
fn run_scope(args: ScopeArgs<'_>) -> Result<()> {
    let ScopeArgs {
        config,
        scope,
        collector,
        tracker,
        reporter,
        writer,
        apply,
        verbose,
    } = args;
    let write_err = ExpectedError::write_report_error;

    reporter
        .write_scope_heading(writer, &scope.name)
        .map_err(write_err)?;

    let mapping = config.mapping_for(scope);
    let groupings: Vec<&str> = mapping.groupings.internal_names().collect();
    let projects: Vec<&str> = mapping.projects.internal_names().collect();

    info!("collecting CI reports for scope `{}`", scope.name);
    let results = collector
        .collect(&groupings, &projects)
        .map_err(|err| ExpectedError::collect_error(&scope.name, err))?;
    let known = tracker.fetch(&scope.name)?;
    info!(
        "collected {} results, {} known failures on worksheet `{}`",
        results.len(),
        known.len(),
        scope.name
    );

    match reconcile(results, known, &mapping, config.wipeout_threshold) {
        Ok(outcome) => {
            reporter.write_outcome(writer, &outcome).map_err(write_err)?;
            if verbose && !outcome.still_failing.is_empty() {
                reporter
                    .write_still_failing(writer, &outcome.still_failing)
                    .map_err(write_err)?;
            }
            reporter
                .write_summary(writer, &outcome.summary)
                .map_err(write_err)?;

            if !outcome.is_resolved() {
                return Err(ExpectedError::unresolvable_failures(
                    &scope.name,
                    outcome.unresolvable,
                ));
            }

            if apply {
                if !outcome.fixed.is_empty() {
                    tracker.delete_fixed(&scope.name, &outcome.fixed)?;
                }
                if !outcome.new_failures.is_empty() {
                    tracker.insert_new(&scope.name, &outcome.new_failures, &mapping)?;
                }
                info!(
                    "worksheet `{}` updated: {} deleted, {} inserted",
                    scope.name,
                    outcome.fixed.len(),
                    outcome.new_failures.len()
                );
            } else {
                info!("dry run: pass --apply to update the tracker");
            }
            Ok(())
        }
        Err(err) => {
            // The summary still goes out on a wipeout so the operator sees
            // which groups exploded.
            if let ReconcileError::Wipeout { summary, .. } = &err {
                reporter.write_summary(writer, summary).map_err(write_err)?;
            }
            Err(ExpectedError::reconcile_error(&scope.name, err))
        }
    }
}

#[derive(Debug, Args)]
struct ShowConfigOpts {
    #[clap(flatten)]
    config_opts: ConfigOpts,
}

impl ShowConfigOpts {
    fn exec(self, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = self.config_opts.load()?;
        let write_err = ExpectedError::write_report_error;

        let mut writer = output_writer.stdout_writer();
        writeln!(writer, "tracker document: {}", config.tracker_path).map_err(write_err)?;
        writeln!(writer, "reports directory: {}", config.reports_dir).map_err(write_err)?;
        writeln!(writer, "minimum report files: {}", config.min_report_files)
            .map_err(write_err)?;
        writeln!(writer, "wipeout threshold: {}", config.wipeout_threshold).map_err(write_err)?;

        writeln!(writer, "projects:").map_err(write_err)?;
        for (external, internal) in config.projects.iter() {
            writeln!(writer, "  {external} = {internal}").map_err(write_err)?;
        }
        for scope in &config.scopes {
            writeln!(writer, "scope {}:", scope.name).map_err(write_err)?;
            for (external, internal) in scope.groupings.iter() {
                writeln!(writer, "  {external} = {internal}").map_err(write_err)?;
            }
        }
        writer.flush().map_err(write_err)?;
        Ok(RoundupExitCode::OK)
    }
}
