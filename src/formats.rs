//! String format predicates.

use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

const EMAIL_PATTERN: &str =
    r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$";
const DATE_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}$";
const TIME_PATTERN: &str = r"^([01]\d|2[0-3]):[0-5]\d(:[0-5]\d(\.\d+)?)?$";
const DATETIME_PATTERN: &str = concat!(
    r"^(\d{4}-\d{2}-\d{2})T(([01]\d|2[0-3]):[0-5]\d(:[0-5]\d(\.\d+)?)?)",
    r"(Z|[+-]([01]\d|2[0-3]):?[0-5]\d)?$"
);
const DURATION_PATTERN: &str =
    r"^P(\d+W|(\d+Y)?(\d+M)?(\d+D)?(T(\d+H)?(\d+M)?(\d+([.,]\d+)?S)?)?)$";

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"));
static DATE: Lazy<Regex> = Lazy::new(|| Regex::new(DATE_PATTERN).expect("date pattern compiles"));
static TIME: Lazy<Regex> = Lazy::new(|| Regex::new(TIME_PATTERN).expect("time pattern compiles"));
static DATETIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(DATETIME_PATTERN).expect("datetime pattern compiles"));
static DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(DURATION_PATTERN).expect("duration pattern compiles"));

/// Built-in string formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringFormat {
    Email,
    Url,
    Uuid,
    Ipv4,
    Ipv6,
    /// `YYYY-MM-DD`, calendar-checked.
    IsoDate,
    /// `HH:MM[:SS[.fff]]`
    IsoTime,
    /// Date and time joined by `T`. A trailing `Z` is always accepted;
    /// `offset` admits `±HH:MM`, `local` admits no zone designator.
    IsoDateTime { offset: bool, local: bool },
    IsoDuration,
}

impl StringFormat {
    pub fn name(&self) -> &'static str {
        match self {
            StringFormat::Email => "email",
            StringFormat::Url => "url",
            StringFormat::Uuid => "uuid",
            StringFormat::Ipv4 => "ipv4",
            StringFormat::Ipv6 => "ipv6",
            StringFormat::IsoDate => "date",
            StringFormat::IsoTime => "time",
            StringFormat::IsoDateTime { .. } => "datetime",
            StringFormat::IsoDuration => "duration",
        }
    }

    /// The regular expression behind this format, where one exists.
    pub fn pattern(&self) -> Option<&'static str> {
        match self {
            StringFormat::Email => Some(EMAIL_PATTERN),
            StringFormat::IsoDate => Some(DATE_PATTERN),
            StringFormat::IsoTime => Some(TIME_PATTERN),
            StringFormat::IsoDateTime { .. } => Some(DATETIME_PATTERN),
            StringFormat::IsoDuration => Some(DURATION_PATTERN),
            _ => None,
        }
    }

    pub fn matches(&self, s: &str) -> bool {
        match self {
            StringFormat::Email => is_email(s),
            StringFormat::Url => url::Url::parse(s).is_ok(),
            StringFormat::Uuid => is_uuid(s),
            StringFormat::Ipv4 => s.parse::<Ipv4Addr>().is_ok(),
            StringFormat::Ipv6 => s.parse::<Ipv6Addr>().is_ok(),
            StringFormat::IsoDate => is_date(s),
            StringFormat::IsoTime => TIME.is_match(s),
            StringFormat::IsoDateTime { offset, local } => is_datetime(s, *offset, *local),
            StringFormat::IsoDuration => is_duration(s),
        }
    }
}

fn is_email(s: &str) -> bool {
    !s.starts_with('.') && !s.contains("..") && EMAIL.is_match(s)
}

/// Hyphenated form only; nil and max UUIDs pass, others need an RFC 4122
/// variant and a version between 1 and 8.
fn is_uuid(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }
    let Ok(id) = Uuid::try_parse(s) else {
        return false;
    };
    if id.is_nil() || id.as_u128() == u128::MAX {
        return true;
    }
    id.get_variant() == uuid::Variant::RFC4122 && (1..=8).contains(&id.get_version_num())
}

fn is_date(s: &str) -> bool {
    DATE.is_match(s) && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn is_datetime(s: &str, offset: bool, local: bool) -> bool {
    let Some(caps) = DATETIME.captures(s) else {
        return false;
    };
    if !caps.get(1).is_some_and(|date| is_date(date.as_str())) {
        return false;
    }
    match caps.get(6).map(|zone| zone.as_str()) {
        None => local,
        Some("Z") => true,
        Some(_) => offset,
    }
}

fn is_duration(s: &str) -> bool {
    s != "P" && !s.ends_with('T') && DURATION.is_match(s)
}
