//! Builder pattern for creating reports.

use super::{ObjectSummary, OutputRecord, ReportIssue, RunReport, REPORT_VERSION};
use crate::plan::GridPlan;

/// Builder for creating run reports ergonomically.
pub struct ReportBuilder {
    set_name: String,
    timestamp_ms: i64,
    ok: bool,
    objects: Vec<ObjectSummary>,
    plan: Option<GridPlan>,
    outputs: Vec<OutputRecord>,
    errors: Vec<ReportIssue>,
    warnings: Vec<ReportIssue>,
    duration_ms: u64,
    tool_version: String,
    target_triple: String,
}

impl ReportBuilder {
    /// Creates a new report builder.
    ///
    /// # Example
    ///
    /// ```
    /// use udimpack_spec::report::ReportBuilder;
    ///
    /// let report = ReportBuilder::new("TextureSet".to_string(), 0, "udimpack v0.1.0".to_string())
    ///     .duration_ms(1234)
    ///     .build();
    /// assert!(report.ok);
    /// ```
    pub fn new(set_name: String, timestamp_ms: i64, tool_version: String) -> Self {
        Self {
            set_name,
            timestamp_ms,
            ok: true,
            objects: Vec::new(),
            plan: None,
            outputs: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            duration_ms: 0,
            tool_version,
            target_triple: Self::detect_target_triple(),
        }
    }

    pub fn object(mut self, object: ObjectSummary) -> Self {
        self.objects.push(object);
        self
    }

    pub fn objects(mut self, objects: Vec<ObjectSummary>) -> Self {
        self.objects.extend(objects);
        self
    }

    pub fn plan(mut self, plan: GridPlan) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Adds an error to the report.
    pub fn error(mut self, error: ReportIssue) -> Self {
        self.errors.push(error);
        self.ok = false;
        self
    }

    /// Adds multiple errors to the report.
    pub fn errors(mut self, errors: Vec<ReportIssue>) -> Self {
        if !errors.is_empty() {
            self.ok = false;
        }
        self.errors.extend(errors);
        self
    }

    pub fn warning(mut self, warning: ReportIssue) -> Self {
        self.warnings.push(warning);
        self
    }

    pub fn warnings(mut self, warnings: Vec<ReportIssue>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn output(mut self, output: OutputRecord) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn outputs(mut self, outputs: Vec<OutputRecord>) -> Self {
        self.outputs.extend(outputs);
        self
    }

    /// Sets the execution duration in milliseconds.
    pub fn duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }

    pub fn build(self) -> RunReport {
        RunReport {
            report_version: REPORT_VERSION,
            set_name: self.set_name,
            timestamp_ms: self.timestamp_ms,
            ok: self.ok,
            objects: self.objects,
            plan: self.plan,
            outputs: self.outputs,
            errors: self.errors,
            warnings: self.warnings,
            duration_ms: self.duration_ms,
            tool_version: self.tool_version,
            target_triple: self.target_triple,
        }
    }

    fn detect_target_triple() -> String {
        #[cfg(target_arch = "x86_64")]
        const ARCH: &str = "x86_64";
        #[cfg(target_arch = "aarch64")]
        const ARCH: &str = "aarch64";
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        const ARCH: &str = "unknown";

        #[cfg(target_os = "windows")]
        const OS: &str = "pc-windows";
        #[cfg(target_os = "linux")]
        const OS: &str = "unknown-linux";
        #[cfg(target_os = "macos")]
        const OS: &str = "apple-darwin";
        #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
        const OS: &str = "unknown";

        #[cfg(target_env = "msvc")]
        const ENV: &str = "msvc";
        #[cfg(target_env = "gnu")]
        const ENV: &str = "gnu";
        #[cfg(not(any(target_env = "msvc", target_env = "gnu")))]
        const ENV: &str = "";

        // ENV is conditionally compiled, so is_empty() varies by platform
        #[allow(clippy::const_is_empty)]
        if ENV.is_empty() {
            format!("{}-{}", ARCH, OS)
        } else {
            format!("{}-{}-{}", ARCH, OS, ENV)
        }
    }
}
