// crates/db/src/queries/row_types.rs
// Internal row types decoded from SQLite before hydration into core types.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Row;

use timeloom_core::{RecurrenceInterval, Session, SessionTemplate, SessionType};

pub(crate) fn instant_from_secs(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

pub(crate) fn date_from_text(text: &str) -> NaiveDate {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap_or_default()
}

// Internal row type for reading sessions from SQLite.
#[derive(Debug)]
pub(crate) struct SessionRow {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) category_id: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) start_time: i64,
    pub(crate) end_time: Option<i64>,
    pub(crate) session_type: String,
    pub(crate) template_id: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for SessionRow {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            category_id: row.try_get("category_id")?,
            description: row.try_get("description")?,
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
            session_type: row.try_get("session_type")?,
            template_id: row.try_get("template_id")?,
        })
    }
}

impl SessionRow {
    pub(crate) fn into_session(self, tag_ids: Vec<String>) -> Session {
        Session {
            id: self.id,
            user_id: self.user_id,
            category_id: self.category_id,
            tag_ids,
            description: self.description,
            start_time: instant_from_secs(self.start_time),
            end_time: self.end_time.map(instant_from_secs),
            session_type: SessionType::parse(&self.session_type)
                .unwrap_or(SessionType::Fixed),
            template_id: self.template_id,
        }
    }
}

// Internal row type for the templates table; definitions load separately.
#[derive(Debug)]
pub(crate) struct TemplateRow {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) name: String,
    pub(crate) interval: String,
    pub(crate) start_date: String,
    pub(crate) end_date: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for TemplateRow {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            interval: row.try_get("interval")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
        })
    }
}

impl TemplateRow {
    pub(crate) fn into_template(
        self,
        sessions: Vec<timeloom_core::RecurringSessionDefinition>,
    ) -> SessionTemplate {
        SessionTemplate {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            interval: RecurrenceInterval::parse(&self.interval)
                .unwrap_or(RecurrenceInterval::Daily),
            start_date: date_from_text(&self.start_date),
            end_date: date_from_text(&self.end_date),
            sessions,
        }
    }
}
