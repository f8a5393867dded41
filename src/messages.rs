//! Built-in English messages, the last resort of issue finalisation.

use crate::issue::{IssueKind, RawIssue};
use crate::schema::SchemaKind;

pub(crate) fn default_message(raw: &RawIssue) -> String {
    match &raw.kind {
        IssueKind::InvalidType { expected, received } => {
            format!("Invalid input: expected {expected}, received {received}")
        }
        IssueKind::InvalidValue { values } => match values.as_slice() {
            [single] => format!("Invalid input: expected {}", single),
            _ => format!(
                "Invalid option: expected one of {}",
                values
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("|")
            ),
        },
        IssueKind::TooSmall {
            minimum,
            inclusive,
            exact,
        } => {
            let op = comparator(*exact, *inclusive, ">");
            match size_noun(raw.origin) {
                Some((subject, unit)) => {
                    format!("Too small: expected {subject} to have {op}{minimum} {unit}")
                }
                None => {
                    let subject = subject(raw.origin);
                    format!("Too small: expected {subject} to be {op}{minimum}")
                }
            }
        }
        IssueKind::TooBig {
            maximum,
            inclusive,
            exact,
        } => {
            let op = comparator(*exact, *inclusive, "<");
            match size_noun(raw.origin) {
                Some((subject, unit)) => {
                    format!("Too big: expected {subject} to have {op}{maximum} {unit}")
                }
                None => {
                    let subject = subject(raw.origin);
                    format!("Too big: expected {subject} to be {op}{maximum}")
                }
            }
        }
        IssueKind::InvalidFormat { format, pattern } => match format.as_str() {
            "starts_with" => format!("Invalid string: must start with {}", quoted(pattern)),
            "ends_with" => format!("Invalid string: must end with {}", quoted(pattern)),
            "includes" => format!("Invalid string: must include {}", quoted(pattern)),
            "regex" => format!(
                "Invalid string: must match pattern /{}/",
                pattern.as_deref().unwrap_or_default()
            ),
            other => format!("Invalid {}", other.replace('_', " ")),
        },
        IssueKind::NotMultipleOf { divisor } => {
            format!("Invalid number: must be a multiple of {}", divisor)
        }
        IssueKind::UnrecognisedKeys { keys } => {
            let plural = if keys.len() == 1 { "" } else { "s" };
            let keys: Vec<String> = keys.iter().map(|k| format!("{:?}", k)).collect();
            format!("Unrecognised key{}: {}", plural, keys.join(", "))
        }
        IssueKind::InvalidUnion { note, .. } => match note {
            Some(note) => format!("Invalid input: {}", note),
            None => "Invalid input".to_string(),
        },
        IssueKind::InvalidKey { .. } => format!("Invalid key in {}", subject(raw.origin)),
        IssueKind::InvalidElement { .. } => format!("Invalid value in {}", subject(raw.origin)),
        IssueKind::InvalidIntersection { reason, .. } => {
            format!("Unmergeable intersection: {}", reason)
        }
        IssueKind::Custom { .. } => "Invalid input".to_string(),
    }
}

fn comparator(exact: bool, inclusive: bool, strict: &str) -> String {
    if exact {
        String::new()
    } else if inclusive {
        format!("{}=", strict)
    } else {
        strict.to_string()
    }
}

fn size_noun(origin: Option<SchemaKind>) -> Option<(&'static str, &'static str)> {
    match origin? {
        SchemaKind::String => Some(("string", "characters")),
        SchemaKind::Array | SchemaKind::Tuple => Some(("array", "items")),
        SchemaKind::Set => Some(("set", "items")),
        SchemaKind::Map => Some(("map", "entries")),
        SchemaKind::Record | SchemaKind::Object => Some(("object", "keys")),
        _ => None,
    }
}

fn subject(origin: Option<SchemaKind>) -> &'static str {
    origin.map(|kind| kind.as_str()).unwrap_or("value")
}

fn quoted(pattern: &Option<String>) -> String {
    format!("{:?}", pattern.as_deref().unwrap_or_default())
}
