// Copyright (c) The roundup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event-based reader for Jenkins `junitResult.xml` files.
//!
//! `<case>` elements are matched at any depth, since the wrapping structure
//! (`<result>/<suites>/<suite>/<cases>`) varies across Jenkins versions.
//! Only the elements roundup consumes are read; everything else inside a case
//! is ignored.

use crate::{errors::ReportParseError, record::TestResult};
use quick_xml::{Reader, events::Event};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CaseField {
    ClassName,
    TestName,
    Duration,
    Skipped,
    FailedSince,
    ErrorStackTrace,
}

impl CaseField {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"className" => Some(Self::ClassName),
            b"testName" => Some(Self::TestName),
            b"duration" => Some(Self::Duration),
            b"skipped" => Some(Self::Skipped),
            b"failedSince" => Some(Self::FailedSince),
            b"errorStackTrace" => Some(Self::ErrorStackTrace),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct CaseBuilder {
    class_name: Option<String>,
    test_name: Option<String>,
    duration: Option<String>,
    skipped: Option<String>,
    failed_since: Option<String>,
    error_stack_trace: Option<String>,
}

impl CaseBuilder {
    fn append(&mut self, field: CaseField, value: &str) {
        let slot = match field {
            CaseField::ClassName => &mut self.class_name,
            CaseField::TestName => &mut self.test_name,
            CaseField::Duration => &mut self.duration,
            CaseField::Skipped => &mut self.skipped,
            CaseField::FailedSince => &mut self.failed_since,
            CaseField::ErrorStackTrace => &mut self.error_stack_trace,
        };
        // Text nodes may arrive in several chunks (text around CDATA
        // sections), so append rather than overwrite.
        slot.get_or_insert_with(String::new).push_str(value);
    }

    fn build(
        self,
        grouping: &str,
        project: &str,
        case_index: usize,
    ) -> Result<TestResult, ReportParseError> {
        let missing = |field| ReportParseError::MissingField { case_index, field };
        let class_name = self.class_name.ok_or_else(|| missing("className"))?;
        let test_name = self.test_name.ok_or_else(|| missing("testName"))?;
        let failed_since = self.failed_since.ok_or_else(|| missing("failedSince"))?;

        let duration = match self.duration {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|error| ReportParseError::InvalidField {
                    case_index,
                    field: "duration",
                    value,
                    error,
                })?,
            None => 0.0,
        };
        let skipped = self.skipped.as_deref().is_some_and(|s| s.trim() == "true");
        let failure = if failed_since.trim() != TestResult::NOT_FAILING {
            self.error_stack_trace
        } else {
            None
        };

        Ok(TestResult {
            grouping: grouping.to_owned(),
            project: project.to_owned(),
            suite: class_name,
            test_name,
            skipped,
            failed_since: failed_since.trim().to_owned(),
            duration,
            failure,
        })
    }
}

/// Parses one report, attributing every case to the given grouping and
/// project (both internal names).
pub(crate) fn parse_report(
    grouping: &str,
    project: &str,
    xml: &str,
) -> Result<Vec<TestResult>, ReportParseError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut results = Vec::new();
    let mut case: Option<CaseBuilder> = None;
    let mut field: Option<CaseField> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if start.name().as_ref() == b"case" {
                    case = Some(CaseBuilder::default());
                    field = None;
                } else if case.is_some() {
                    field = CaseField::from_tag(start.name().as_ref());
                }
            }
            Event::End(end) => {
                if end.name().as_ref() == b"case" {
                    if let Some(builder) = case.take() {
                        results.push(builder.build(grouping, project, results.len())?);
                    }
                } else {
                    field = None;
                }
            }
            Event::Text(text) => {
                if let (Some(builder), Some(field)) = (case.as_mut(), field) {
                    builder.append(field, &text.unescape()?);
                }
            }
            Event::CData(cdata) => {
                if let (Some(builder), Some(field)) = (case.as_mut(), field) {
                    builder.append(field, &String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(results)
}
