//! Per-parse options.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::issue::RawIssue;

/// Maps a raw issue to a message; `None` or an empty string falls through to
/// the next source.
pub type ErrorMap = Arc<dyn Fn(&RawIssue) -> Option<String> + Send + Sync>;

/// How a [`ValidationError`](crate::ValidationError) renders through `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Nested JSON tree mirroring the input's shape.
    Tree,
    /// One `pointer: message` line per issue.
    Flat,
    /// Human-oriented report with a marker per issue.
    #[default]
    Pretty,
}

/// Caller-supplied options for a single parse.
#[derive(Clone, Default)]
pub struct ParseContext {
    pub error_map: Option<ErrorMap>,
    pub locale: Option<String>,
    /// When true, objects in the default `strip` mode reject unknown keys.
    pub strict: bool,
    /// When true, parsing stops at the first issue.
    pub abort_early: bool,
    pub report_format: ReportFormat,
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error_map<F>(mut self, map: F) -> Self
    where
        F: Fn(&RawIssue) -> Option<String> + Send + Sync + 'static,
    {
        self.error_map = Some(Arc::new(map));
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn abort_early(mut self, abort_early: bool) -> Self {
        self.abort_early = abort_early;
        self
    }

    pub fn report_format(mut self, format: ReportFormat) -> Self {
        self.report_format = format;
        self
    }
}

impl fmt::Debug for ParseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseContext")
            .field("error_map", &self.error_map.is_some())
            .field("locale", &self.locale)
            .field("strict", &self.strict)
            .field("abort_early", &self.abort_early)
            .field("report_format", &self.report_format)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let ctx = ParseContext::new()
            .strict(true)
            .abort_early(true)
            .locale("fr")
            .report_format(ReportFormat::Flat);
        assert!(ctx.strict);
        assert!(ctx.abort_early);
        assert_eq!(ctx.locale.as_deref(), Some("fr"));
        assert_eq!(ctx.report_format, ReportFormat::Flat);
        assert!(ctx.error_map.is_none());
    }

    #[test]
    fn report_format_deserializes_lowercase() {
        let format: ReportFormat = serde_json::from_str("\"tree\"").unwrap();
        assert_eq!(format, ReportFormat::Tree);
        assert_eq!(ReportFormat::default(), ReportFormat::Pretty);
    }
}
