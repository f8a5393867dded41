//! Error types for schema construction and validation.

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::context::{ParseContext, ReportFormat};
use crate::issue::{dotted_path, finalize, Issue, PathSegment, RawIssue};
use crate::schema::SchemaKind;

/// Errors raised while building a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unknown key \"{key}\" in object shape")]
    UnknownKey { key: String },

    #[error("enum has no option named \"{name}\"")]
    UnknownOption { name: String },

    #[error("union member {index} is not an object schema (got {kind})")]
    NotAnObject { index: usize, kind: SchemaKind },

    #[error("union member {index} has no literal values at \"{discriminator}\"")]
    MissingDiscriminator { discriminator: String, index: usize },

    #[error("duplicate discriminator value {value} at \"{discriminator}\"")]
    DuplicateDiscriminator {
        discriminator: String,
        value: String,
    },

    #[error("schema \"{name}\" is already registered")]
    DuplicateName { name: String },
}

/// A failed parse: an ordered, non-empty list of finalised issues.
#[derive(Debug, Clone, Error)]
#[error("{}", render(.issues, .format))]
pub struct ValidationError {
    issues: Vec<Issue>,
    format: ReportFormat,
}

impl ValidationError {
    pub(crate) fn new(issues: Vec<Issue>, format: ReportFormat) -> Self {
        debug_assert!(!issues.is_empty(), "validation error without issues");
        Self { issues, format }
    }

    /// A single `custom` issue at the root.
    pub fn custom(message: impl Into<String>) -> Self {
        let issue = finalize(RawIssue::custom(message), &ParseContext::default());
        Self::new(vec![issue], ReportFormat::default())
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    /// The first issue; every error carries at least one.
    pub fn first(&self) -> &Issue {
        &self.issues[0]
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    /// Same issues, rendered in another format.
    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    /// Group messages by the first path segment; root issues become form errors.
    pub fn flatten(&self) -> FlattenedError {
        let mut flat = FlattenedError::default();
        for issue in &self.issues {
            match issue.path.first() {
                Some(segment) => flat
                    .field_errors
                    .entry(segment.to_string())
                    .or_default()
                    .push(issue.message.clone()),
                None => flat.form_errors.push(issue.message.clone()),
            }
        }
        flat
    }

    /// Nest messages along their paths.
    pub fn tree(&self) -> ErrorTree {
        build_tree(&self.issues)
    }

    /// One `✖ message` entry per issue, followed by its location when nested.
    pub fn pretty(&self) -> String {
        pretty(&self.issues)
    }

    /// The issue list as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::to_value(&self.issues).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for ValidationError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.issues.serialize(serializer)
    }
}

fn render(issues: &[Issue], format: &ReportFormat) -> String {
    match format {
        ReportFormat::Pretty => pretty(issues),
        ReportFormat::Flat => issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
        ReportFormat::Tree => serde_json::to_string_pretty(&build_tree(issues)).unwrap_or_default(),
    }
}

fn pretty(issues: &[Issue]) -> String {
    let mut lines = Vec::with_capacity(issues.len() * 2);
    for issue in issues {
        lines.push(format!("✖ {}", issue.message));
        if !issue.path.is_empty() {
            lines.push(format!("  → at {}", dotted_path(&issue.path)));
        }
    }
    lines.join("\n")
}

fn build_tree(issues: &[Issue]) -> ErrorTree {
    let mut root = ErrorTree::default();
    for issue in issues {
        root.insert(&issue.path, issue.message.clone());
    }
    root
}

/// Messages grouped by top-level field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlattenedError {
    pub form_errors: Vec<String>,
    pub field_errors: IndexMap<String, Vec<String>>,
}

/// Messages nested along the shape of the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorTree {
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, ErrorTree>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Option<ErrorTree>>,
}

impl ErrorTree {
    fn insert(&mut self, path: &[PathSegment], message: String) {
        let Some((head, rest)) = path.split_first() else {
            self.errors.push(message);
            return;
        };
        let child = match head {
            PathSegment::Key(key) => self.properties.entry(key.clone()).or_default(),
            PathSegment::Index(index) => {
                if self.items.len() <= *index {
                    self.items.resize(*index + 1, None);
                }
                self.items[*index].get_or_insert_with(ErrorTree::default)
            }
        };
        child.insert(rest, message);
    }

    /// Subtree for a field, if any issue was reported beneath it.
    pub fn property(&self, key: &str) -> Option<&ErrorTree> {
        self.properties.get(key)
    }

    pub fn item(&self, index: usize) -> Option<&ErrorTree> {
        self.items.get(index).and_then(Option::as_ref)
    }
}
