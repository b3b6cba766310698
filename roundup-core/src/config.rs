// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Roundup configuration.
//!
//! Configuration lives in a single TOML file. The interesting parts are the
//! mapping tables: a global `[projects]` table shared by every scope, and a
//! per-scope `[scopes.groupings]` table, both keyed by external display name.
//! Validation turns them into [`NameMap`] bijections up front so that a bad
//! table aborts before any scope is processed.

use crate::{
    errors::{ConfigParseError, ConfigParseErrorKind},
    mapping::{MapAxis, NameMap, NameMapping},
    reconcile::DEFAULT_WIPEOUT_THRESHOLD,
};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::Deserialize;
use std::{collections::HashSet, fs};

/// Validated roundup configuration.
#[derive(Clone, Debug)]
pub struct RoundupConfig {
    /// Path to the known-failures tracker document.
    pub tracker_path: Utf8PathBuf,

    /// Root of the CI jobs tree holding run reports.
    pub reports_dir: Utf8PathBuf,

    /// Minimum number of report files expected across one scope; fewer means
    /// the build has not finished.
    pub min_report_files: usize,

    /// New-failure count above which a pass aborts as a wipeout.
    pub wipeout_threshold: usize,

    /// The project-axis map, shared read-only across all scopes.
    pub projects: NameMap,

    /// The configured scopes, reconciled sequentially in order.
    pub scopes: Vec<ScopeConfig>,
}

/// One configured scope: a tracker worksheet plus its grouping map.
#[derive(Clone, Debug)]
pub struct ScopeConfig {
    /// The worksheet name, also used as the scope heading in reports.
    pub name: String,

    /// The grouping-axis map for this scope.
    pub groupings: NameMap,
}

impl RoundupConfig {
    /// The default location of the config file, relative to the working
    /// directory.
    pub const DEFAULT_CONFIG_PATH: &'static str = "roundup.toml";

    /// Reads and validates the configuration at `config_file`.
    pub fn from_file(config_file: &Utf8Path) -> Result<Self, ConfigParseError> {
        let contents = fs::read_to_string(config_file).map_err(|error| {
            ConfigParseError::new(config_file, ConfigParseErrorKind::Read { error })
        })?;
        let deserialized: DeserializedConfig = toml::from_str(&contents).map_err(|error| {
            ConfigParseError::new(
                config_file,
                ConfigParseErrorKind::Deserialize {
                    error: Box::new(error),
                },
            )
        })?;
        Self::validate(config_file, deserialized)
    }

    fn validate(
        config_file: &Utf8Path,
        deserialized: DeserializedConfig,
    ) -> Result<Self, ConfigParseError> {
        let parse_error = |kind| ConfigParseError::new(config_file, kind);

        if deserialized.scopes.is_empty() {
            return Err(parse_error(ConfigParseErrorKind::NoScopes));
        }
        let mut names = HashSet::new();
        for scope in &deserialized.scopes {
            if !names.insert(scope.name.as_str()) {
                return Err(parse_error(ConfigParseErrorKind::DuplicateScope {
                    name: scope.name.clone(),
                }));
            }
        }

        let projects = NameMap::new(MapAxis::Project, deserialized.projects).map_err(|error| {
            parse_error(ConfigParseErrorKind::InvalidMapping {
                axis: MapAxis::Project,
                scope: None,
                error,
            })
        })?;

        let scopes = deserialized
            .scopes
            .into_iter()
            .map(|scope| {
                let groupings =
                    NameMap::new(MapAxis::Grouping, scope.groupings).map_err(|error| {
                        parse_error(ConfigParseErrorKind::InvalidMapping {
                            axis: MapAxis::Grouping,
                            scope: Some(scope.name.clone()),
                            error,
                        })
                    })?;
                Ok(ScopeConfig {
                    name: scope.name,
                    groupings,
                })
            })
            .collect::<Result<Vec<_>, ConfigParseError>>()?;

        Ok(Self {
            tracker_path: deserialized.store.tracker,
            reports_dir: deserialized.reports.dir,
            min_report_files: deserialized.reports.min_files,
            wipeout_threshold: deserialized.thresholds.wipeout,
            projects,
            scopes,
        })
    }

    /// The mapping table for one scope: its grouping map plus the shared
    /// project map.
    pub fn mapping_for(&self, scope: &ScopeConfig) -> NameMapping {
        NameMapping::new(scope.groupings.clone(), self.projects.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeserializedConfig {
    store: StoreConfig,
    reports: ReportsConfig,
    #[serde(default)]
    thresholds: ThresholdsConfig,
    #[serde(default)]
    projects: IndexMap<String, String>,
    #[serde(default)]
    scopes: Vec<DeserializedScope>,
}

#[derive(Debug, Deserialize)]
struct StoreConfig {
    tracker: Utf8PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReportsConfig {
    dir: Utf8PathBuf,
    #[serde(default = "default_min_files")]
    min_files: usize,
}

#[derive(Debug, Deserialize)]
struct ThresholdsConfig {
    #[serde(default = "default_wipeout")]
    wipeout: usize,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            wipeout: DEFAULT_WIPEOUT_THRESHOLD,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeserializedScope {
    name: String,
    #[serde(default)]
    groupings: IndexMap<String, String>,
}

fn default_min_files() -> usize {
    1
}

fn default_wipeout() -> usize {
    DEFAULT_WIPEOUT_THRESHOLD
}
