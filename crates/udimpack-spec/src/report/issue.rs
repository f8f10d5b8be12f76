//! Per-unit issues recorded in a run report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The smallest unit a failure affects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum IssueUnit {
    Object(String),
    Material(String),
    Channel(String),
    /// The run as a whole.
    Run,
}

impl fmt::Display for IssueUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueUnit::Object(name) => write!(f, "object '{}'", name),
            IssueUnit::Material(name) => write!(f, "material '{}'", name),
            IssueUnit::Channel(name) => write!(f, "channel '{}'", name),
            IssueUnit::Run => f.write_str("run"),
        }
    }
}

/// An error or warning entry in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportIssue {
    /// Stable code (e.g., "LAYOUT_001").
    pub code: String,
    pub unit: IssueUnit,
    pub message: String,
}

impl ReportIssue {
    pub fn new(code: impl Into<String>, unit: IssueUnit, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            unit,
            message: message.into(),
        }
    }
}

impl fmt::Display for ReportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.code, self.unit, self.message)
    }
}
