// crates/core/src/error.rs
use chrono::NaiveDate;
use thiserror::Error;

use crate::types::RecurrenceInterval;

/// Errors raised while validating or expanding a session template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template end date {end} precedes start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("definition {index}: end offset {end} does not follow start offset {start}")]
    OffsetOrder { index: usize, start: i64, end: i64 },

    #[error("definition {index}: offset {offset} is out of range for a {interval} template")]
    OffsetOutOfRange {
        index: usize,
        offset: i64,
        interval: &'static str,
    },

    #[error("session {session_id} does not belong to template {template_id}")]
    ForeignSession {
        session_id: String,
        template_id: String,
    },

    #[error("session {session_id} is still running and cannot be encoded as an offset")]
    OpenEnded { session_id: String },

    #[error("session {session_id} spans more than one {interval} cycle")]
    SpanExceedsCycle {
        session_id: String,
        interval: &'static str,
    },
}

impl TemplateError {
    pub fn offset_out_of_range(index: usize, offset: i64, interval: RecurrenceInterval) -> Self {
        Self::OffsetOutOfRange {
            index,
            offset,
            interval: interval.as_str(),
        }
    }
}

/// Errors raised while compiling a filter precursor into the canonical filter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("field {field}: sentinel and value selection are mutually exclusive")]
    SentinelConflict { field: &'static str },
}

/// Errors raised while validating a migration request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MigrationError {
    #[error("migration requires exactly one of target_id or remove")]
    MissingTarget,

    #[error("migration cannot both retarget to {target_id} and remove")]
    TargetAndRemove { target_id: String },

    #[error("source and target are both {id}; nothing to migrate")]
    SourceEqualsTarget { id: String },
}
