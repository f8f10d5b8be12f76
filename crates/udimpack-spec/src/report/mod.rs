//! Run report types.
//!
//! A report documents one `combine` run: which object went to which tile,
//! the grid plan, every destination image written, and the per-unit issues
//! collected along the way. Failures are attached to the smallest unit they
//! affect and never abort the report itself.

mod builder;
mod issue;
mod output;

pub use builder::ReportBuilder;
pub use issue::{IssueUnit, ReportIssue};
pub use output::{BitDepth, OutputRecord};

use serde::{Deserialize, Serialize};

use crate::plan::GridPlan;
use crate::tile::TileIndex;

/// Report schema version.
pub const REPORT_VERSION: u32 = 1;

/// Tile assigned to one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectSummary {
    pub object: String,
    pub tile: TileIndex,
}

/// A complete report for a combine run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub report_version: u32,
    /// Texture-set identifier.
    pub set_name: String,
    /// Milliseconds since the Unix epoch at run start.
    pub timestamp_ms: i64,
    /// Whether the run finished without errors.
    pub ok: bool,
    /// Object to source tile assignments.
    pub objects: Vec<ObjectSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<GridPlan>,
    pub outputs: Vec<OutputRecord>,
    pub errors: Vec<ReportIssue>,
    pub warnings: Vec<ReportIssue>,
    /// Total execution time in milliseconds.
    pub duration_ms: u64,
    /// Tool identifier and version (e.g., "udimpack v0.1.0").
    pub tool_version: String,
    /// Rust target triple (e.g., "x86_64-unknown-linux-gnu").
    pub target_triple: String,
}

impl RunReport {
    pub fn builder(set_name: String, timestamp_ms: i64, tool_version: String) -> ReportBuilder {
        ReportBuilder::new(set_name, timestamp_ms, tool_version)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Generates the report filename for a run directory stem.
    ///
    /// # Example
    ///
    /// ```
    /// use udimpack_spec::report::RunReport;
    ///
    /// assert_eq!(RunReport::filename("Crate_1700000000000"), "Crate_1700000000000.report.json");
    /// ```
    pub fn filename(stem: &str) -> String {
        format!("{}.report.json", stem)
    }

    /// Channels that produced no output because of an error.
    pub fn failed_channels(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .errors
            .iter()
            .filter_map(|issue| match &issue.unit {
                IssueUnit::Channel(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelKind, Colorspace};
    use pretty_assertions::assert_eq;

    fn sample_report() -> RunReport {
        ReportBuilder::new("Crate".into(), 1_700_000_000_000, "udimpack v0.1.0".into())
            .object(ObjectSummary {
                object: "Crate".into(),
                tile: TileIndex::BASE,
            })
            .output(OutputRecord {
                channel: ChannelKind::from_name("Normal"),
                tile: TileIndex::BASE,
                path: "Crate_1700000000000/Crate_1700000000000_Normal.1001.png".into(),
                hash: "ab".repeat(32),
                width: 1024,
                height: 1024,
                bit_depth: BitDepth::U8,
                colorspace: Colorspace::NonColor,
            })
            .error(ReportIssue::new(
                "TEXTURE_002",
                IssueUnit::Channel("Roughness".into()),
                "cannot read tile",
            ))
            .duration_ms(12)
            .build()
    }

    #[test]
    fn test_errors_clear_ok() {
        let report = sample_report();
        assert!(!report.ok);
        assert_eq!(report.failed_channels(), vec!["Roughness"]);
    }

    #[test]
    fn test_json_round_trip() {
        let report = sample_report();
        let json = report.to_json_pretty().unwrap();
        assert!(json.contains("\"colorspace\": \"non_color\""));
        assert!(json.contains("\"kind\": \"channel\""));
        let parsed = RunReport::from_json(&json).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_warnings_keep_ok() {
        let report = ReportBuilder::new("S".into(), 0, "v".into())
            .warning(ReportIssue::new("RUN_004", IssueUnit::Material("M".into()), "odd"))
            .build();
        assert!(report.ok);
        assert_eq!(report.warnings.len(), 1);
    }
}
