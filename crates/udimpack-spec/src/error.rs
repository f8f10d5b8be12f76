//! Shared error interface for the pipeline stages.

use crate::report::{IssueUnit, ReportIssue};

/// Common trait for stage errors.
///
/// Every stage (layout, texture, material) implements this for its error
/// enum so failures can be turned into report issues uniformly.
///
/// # Example
///
/// ```ignore
/// use udimpack_spec::error::BackendError;
///
/// fn handle_error<E: BackendError>(err: E) {
///     eprintln!("[{}] {}", err.code(), err.message());
/// }
/// ```
pub trait BackendError: std::error::Error {
    /// Stable code such as "LAYOUT_001" or "TEXTURE_003".
    fn code(&self) -> &'static str;

    /// Human-readable message; defaults to the `Display` output.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Stage the error came from ("layout", "texture", "material").
    fn category(&self) -> &'static str;

    /// Converts the error into a report issue attached to `unit`.
    fn to_issue(&self, unit: IssueUnit) -> ReportIssue {
        ReportIssue::new(self.code(), unit, self.message())
    }
}

/// Run-level issue codes that do not belong to a single stage.
pub mod codes {
    /// No selected object had usable UV data.
    pub const RUN_NO_OBJECTS: &str = "RUN_001";
    /// No material in the selection has a discoverable texture.
    pub const RUN_NO_TEXTURES: &str = "RUN_002";
    /// A channel could not be produced by any compositing strategy.
    pub const RUN_CHANNEL_FAILED: &str = "RUN_003";
    /// Detected image colorspace differs from the channel's usual encoding.
    pub const RUN_COLORSPACE_MISMATCH: &str = "RUN_004";
    /// Two objects on one source tile use different images for a channel.
    pub const RUN_TILE_CONFLICT: &str = "RUN_005";
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("tile {0} missing")]
    struct Missing(u32);

    impl BackendError for Missing {
        fn code(&self) -> &'static str {
            "TEST_001"
        }

        fn category(&self) -> &'static str {
            "test"
        }
    }

    #[test]
    fn test_to_issue_uses_code_and_message() {
        let issue = Missing(1004).to_issue(IssueUnit::Object("Crate".into()));
        assert_eq!(issue.code, "TEST_001");
        assert_eq!(issue.message, "tile 1004 missing");
        assert_eq!(issue.unit, IssueUnit::Object("Crate".into()));
    }
}
