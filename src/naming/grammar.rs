//! Segment grammar: lowercase snake_case, starting with a letter.

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;

static SEGMENT: OnceLock<Regex> = OnceLock::new();

fn segment_re() -> &'static Regex {
    SEGMENT.get_or_init(|| Regex::new(r"^[a-z][a-z0-9]*(_[a-z0-9]+)*$").expect("valid regex"))
}

/// Which part of a name a value was supplied for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Context,
    Domain,
    Qualifier,
    Type,
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Segment::Context => "context",
            Segment::Domain => "domain",
            Segment::Qualifier => "qualifier",
            Segment::Type => "type",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationReason {
    Empty,
    Uppercase,
    LeadingDigit,
    LeadingUnderscore,
    TrailingUnderscore,
    ConsecutiveUnderscores,
    InvalidCharacter,
    Reserved,
    UnknownType,
}

impl ViolationReason {
    pub fn describe(&self) -> &'static str {
        match self {
            ViolationReason::Empty => "must not be empty",
            ViolationReason::Uppercase => "must be lowercase",
            ViolationReason::LeadingDigit => "must start with a letter",
            ViolationReason::LeadingUnderscore => "must not start with '_'",
            ViolationReason::TrailingUnderscore => "must not end with '_'",
            ViolationReason::ConsecutiveUnderscores => "must not contain '__'",
            ViolationReason::InvalidCharacter => "may only contain a-z, 0-9 and '_'",
            ViolationReason::Reserved => "is a reserved word",
            ViolationReason::UnknownType => "must be one of api, bot, worker, data_api",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentViolation {
    pub segment: Segment,
    pub value: String,
    pub reason: ViolationReason,
}

impl std::fmt::Display for SegmentViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} '{}' {}",
            self.segment,
            self.value,
            self.reason.describe()
        )
    }
}

pub fn is_valid_segment(value: &str) -> bool {
    segment_re().is_match(value)
}

/// First rule `value` breaks, or `None` when it is a usable segment.
pub fn diagnose_segment(
    segment: Segment,
    value: &str,
    reserved: &HashSet<String>,
) -> Option<SegmentViolation> {
    let reason = if is_valid_segment(value) {
        if reserved.contains(value) {
            ViolationReason::Reserved
        } else {
            return None;
        }
    } else {
        classify_failure(value)
    };

    Some(SegmentViolation {
        segment,
        value: value.to_string(),
        reason,
    })
}

fn classify_failure(value: &str) -> ViolationReason {
    if value.is_empty() {
        ViolationReason::Empty
    } else if value.chars().any(|c| c.is_ascii_uppercase()) {
        ViolationReason::Uppercase
    } else if value
        .chars()
        .any(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'))
    {
        ViolationReason::InvalidCharacter
    } else if value.starts_with(|c: char| c.is_ascii_digit()) {
        ViolationReason::LeadingDigit
    } else if value.starts_with('_') {
        ViolationReason::LeadingUnderscore
    } else if value.contains("__") {
        ViolationReason::ConsecutiveUnderscores
    } else if value.ends_with('_') {
        ViolationReason::TrailingUnderscore
    } else {
        // remaining failure: a segment part starting with a digit is fine, so
        // anything else here is a character problem
        ViolationReason::InvalidCharacter
    }
}
