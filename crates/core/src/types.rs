// crates/core/src/types.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// How a session's end is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    /// Both endpoints are known; `end_time` is always set.
    Fixed,
    /// Running stopwatch; `end_time` stays unset until the session is stopped.
    Stopwatch,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Fixed => "fixed",
            SessionType::Stopwatch => "stopwatch",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fixed" => Some(SessionType::Fixed),
            "stopwatch" => Some(SessionType::Stopwatch),
            _ => None,
        }
    }
}

/// A single tracked block of time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    /// `None` means the session is still running (stopwatch).
    pub end_time: Option<DateTime<Utc>>,
    pub session_type: SessionType,
    /// Template occurrence that generated this session, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

impl Session {
    /// A fixed session with both endpoints known.
    pub fn fixed(
        user_id: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            category_id: None,
            tag_ids: Vec::new(),
            description: None,
            start_time,
            end_time: Some(end_time),
            session_type: SessionType::Fixed,
            template_id: None,
        }
    }

    /// A running stopwatch session.
    pub fn stopwatch(user_id: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            category_id: None,
            tag_ids: Vec::new(),
            description: None,
            start_time,
            end_time: None,
            session_type: SessionType::Stopwatch,
            template_id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_tags(mut self, tag_ids: Vec<String>) -> Self {
        self.tag_ids = tag_ids;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    /// Whole minutes between start and end, `None` while still running.
    pub fn duration_minutes(&self) -> Option<i64> {
        self.end_time.map(|end| (end - self.start_time).num_minutes())
    }

    pub fn is_running(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.tag_ids.iter().any(|t| t == tag_id)
    }
}

/// A category; at most one per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// A tag; zero or more per session. `category_ids` optionally restricts the
/// tag to sessions of those categories (empty = unrestricted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub label: String,
    pub color: String,
    #[serde(default)]
    pub category_ids: Vec<String>,
}

/// Cycle length of a recurring template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceInterval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceInterval::Daily => "daily",
            RecurrenceInterval::Weekly => "weekly",
            RecurrenceInterval::Monthly => "monthly",
            RecurrenceInterval::Yearly => "yearly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(RecurrenceInterval::Daily),
            "weekly" => Some(RecurrenceInterval::Weekly),
            "monthly" => Some(RecurrenceInterval::Monthly),
            "yearly" => Some(RecurrenceInterval::Yearly),
            _ => None,
        }
    }
}

/// One recurring slot inside a template.
///
/// Offsets are minutes relative to the cycle anchor and encode a
/// day-of-cycle plus time-of-day; see `calendar::resolve_offset` for the
/// per-interval encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringSessionDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_minute_offset: i64,
    pub end_minute_offset: i64,
}

/// A recurring-pattern definition that expands into concrete sessions.
///
/// Templates are immutable once created except for full replacement; their
/// generated sessions cascade-delete with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTemplate {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub interval: RecurrenceInterval,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub sessions: Vec<RecurringSessionDefinition>,
}
