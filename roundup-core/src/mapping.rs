// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bidirectional translation between the external (display) and internal
//! (build system) naming namespaces.
//!
//! A [`NameMap`] is a bijection for one axis (groupings or projects). Both
//! directions are precomputed at construction, and construction rejects any
//! duplicate on either side: a name with two counterparts would make
//! reconciliation ambiguous, which is a configuration error rather than
//! something to tolerate at run time.

use crate::{
    errors::{MapBuildError, MappingError},
    record::{TestKey, TestResult, TrackedFailure},
};
use indexmap::IndexMap;
use std::fmt;

/// The axis a name map translates: build groupings or projects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapAxis {
    /// The build family/job category axis.
    Grouping,
    /// The project (module) axis.
    Project,
}

impl fmt::Display for MapAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapAxis::Grouping => write!(f, "grouping"),
            MapAxis::Project => write!(f, "project"),
        }
    }
}

/// A one-to-one mapping from external display names to internal build-system
/// names, with the computed inverse for the opposite direction.
///
/// Iteration order follows insertion order so that reports and directory scans
/// are deterministic across runs.
#[derive(Clone, Debug)]
pub struct NameMap {
    axis: MapAxis,
    external_to_internal: IndexMap<String, String>,
    internal_to_external: IndexMap<String, String>,
}

impl NameMap {
    /// Builds a map for the given axis from `(external, internal)` pairs.
    ///
    /// Fails if any external or internal name occurs more than once.
    pub fn new(
        axis: MapAxis,
        entries: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, MapBuildError> {
        let mut external_to_internal = IndexMap::new();
        let mut internal_to_external = IndexMap::new();
        for (external, internal) in entries {
            if external_to_internal.contains_key(&external) {
                return Err(MapBuildError::duplicate_external(external));
            }
            if internal_to_external.contains_key(&internal) {
                return Err(MapBuildError::duplicate_internal(internal));
            }
            external_to_internal.insert(external.clone(), internal.clone());
            internal_to_external.insert(internal, external);
        }
        Ok(Self {
            axis,
            external_to_internal,
            internal_to_external,
        })
    }

    /// The axis this map translates.
    pub fn axis(&self) -> MapAxis {
        self.axis
    }

    /// Translates an external display name to its internal name.
    pub fn to_internal(&self, external: &str) -> Result<&str, MappingError> {
        self.external_to_internal
            .get(external)
            .map(String::as_str)
            .ok_or_else(|| MappingError::no_internal(self.axis, external))
    }

    /// Translates an internal name to its external display name.
    pub fn to_external(&self, internal: &str) -> Result<&str, MappingError> {
        self.internal_to_external
            .get(internal)
            .map(String::as_str)
            .ok_or_else(|| MappingError::no_external(self.axis, internal))
    }

    /// Iterates over the internal names, in insertion order.
    pub fn internal_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.internal_to_external.keys().map(String::as_str)
    }

    /// Iterates over `(external, internal)` pairs, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.external_to_internal
            .iter()
            .map(|(external, internal)| (external.as_str(), internal.as_str()))
    }

    /// The number of entries in the map.
    pub fn len(&self) -> usize {
        self.external_to_internal.len()
    }

    /// Returns true if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.external_to_internal.is_empty()
    }
}

/// The grouping and project maps for one reconciliation scope.
#[derive(Clone, Debug)]
pub struct NameMapping {
    /// The grouping-axis map.
    pub groupings: NameMap,

    /// The project-axis map.
    pub projects: NameMap,
}

impl NameMapping {
    /// Creates a mapping table from the two axis maps.
    pub fn new(groupings: NameMap, projects: NameMap) -> Self {
        Self {
            groupings,
            projects,
        }
    }

    /// Translates a tracked failure's identity into the internal namespace.
    pub fn to_internal_key(&self, failure: &TrackedFailure) -> Result<TestKey, MappingError> {
        let grouping = self.groupings.to_internal(&failure.grouping)?;
        let project = self.projects.to_internal(&failure.project)?;
        Ok(TestKey::new(
            grouping,
            project,
            &failure.suite,
            &failure.test_name,
        ))
    }

    /// Translates a test result's identity into the external namespace.
    pub fn to_external_key(&self, result: &TestResult) -> Result<TestKey, MappingError> {
        let grouping = self.groupings.to_external(&result.grouping)?;
        let project = self.projects.to_external(&result.project)?;
        Ok(TestKey::new(
            grouping,
            project,
            &result.suite,
            &result.test_name,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entries(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(e, i)| (e.to_string(), i.to_string()))
            .collect()
    }

    #[test]
    fn translates_both_directions() {
        let map = NameMap::new(
            MapAxis::Grouping,
            entries(&[("Trunk Nightly", "trunk-nightly"), ("Branch", "branch")]),
        )
        .expect("bijection is valid");

        assert_eq!(map.to_internal("Trunk Nightly").unwrap(), "trunk-nightly");
        assert_eq!(map.to_external("branch").unwrap(), "Branch");
        assert_eq!(
            map.internal_names().collect::<Vec<_>>(),
            vec!["trunk-nightly", "branch"]
        );
    }

    #[test]
    fn missing_names_error_with_axis_and_direction() {
        let map = NameMap::new(
            MapAxis::Project,
            entries(&[("Core", "core")]),
        )
        .expect("bijection is valid");

        let err = map.to_internal("Util").unwrap_err();
        assert_eq!(
            err.to_string(),
            "external project `Util` has no internal counterpart"
        );

        let err = map.to_external("util").unwrap_err();
        assert_eq!(
            err.to_string(),
            "internal project `util` has no external counterpart"
        );
    }

    #[test]
    fn duplicate_external_name_is_rejected() {
        let err = NameMap::new(
            MapAxis::Grouping,
            entries(&[("Trunk", "trunk-a"), ("Trunk", "trunk-b")]),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "external name `Trunk` is mapped more than once"
        );
    }

    #[test]
    fn duplicate_internal_name_is_rejected() {
        let err = NameMap::new(
            MapAxis::Grouping,
            entries(&[("Trunk", "nightly"), ("Branch", "nightly")]),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "internal name `nightly` is mapped more than once"
        );
    }

    #[test]
    fn keys_translate_through_both_axes() {
        let mapping = NameMapping::new(
            NameMap::new(
                MapAxis::Grouping,
                entries(&[("Trunk-display", "Trunk")]),
            )
            .unwrap(),
            NameMap::new(MapAxis::Project, entries(&[("Core", "core")])).unwrap(),
        );

        let tracked = TrackedFailure {
            grouping: "Trunk-display".to_owned(),
            project: "Core".to_owned(),
            suite: "FooTest".to_owned(),
            test_name: "testBar".to_owned(),
            failure: None,
            notes: None,
            row: 5,
        };
        assert_eq!(
            mapping.to_internal_key(&tracked).unwrap(),
            TestKey::new("Trunk", "core", "FooTest", "testBar")
        );

        let result = TestResult {
            grouping: "Trunk".to_owned(),
            project: "core".to_owned(),
            suite: "FooTest".to_owned(),
            test_name: "testBar".to_owned(),
            skipped: false,
            failed_since: "12".to_owned(),
            duration: 0.0,
            failure: None,
        };
        assert_eq!(
            mapping.to_external_key(&result).unwrap(),
            TestKey::new("Trunk-display", "Core", "FooTest", "testBar")
        );
    }
}
