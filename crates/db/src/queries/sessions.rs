// crates/db/src/queries/sessions.rs
// Session CRUD and filtered listing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use timeloom_core::{
    FilterSession, IdPredicate, Session, TagPredicate, TemplatePredicate,
};

use super::row_types::SessionRow;
use crate::{Database, DbError, DbResult};

/// Appends the WHERE clauses for a [`FilterSession`] to a QueryBuilder.
///
/// The generated SQL agrees with `FilterSession::matches`: predicates on
/// `category_id` and `end_time` never match NULL columns, and duration is
/// whole minutes of `end_time - start_time`.
pub(crate) fn append_filters<'args>(
    qb: &mut sqlx::QueryBuilder<'args, sqlx::Sqlite>,
    filter: &'args FilterSession,
) {
    qb.push(" WHERE 1=1");

    fn push_id_clause<'args>(
        qb: &mut sqlx::QueryBuilder<'args, sqlx::Sqlite>,
        column: &str,
        pred: &'args IdPredicate,
    ) {
        match pred {
            IdPredicate::One(id) => {
                qb.push(format!(" AND {column} = "));
                qb.push_bind(id.as_str());
            }
            IdPredicate::AnyOf(ids) if ids.is_empty() => {
                qb.push(" AND 1=0");
            }
            IdPredicate::AnyOf(ids) => {
                qb.push(format!(" AND {column} IN ("));
                let mut sep = qb.separated(", ");
                for id in ids {
                    sep.push_bind(id.as_str());
                }
                sep.push_unseparated(")");
            }
        }
    }

    if let Some(user) = &filter.user {
        push_id_clause(qb, "s.user_id", user);
    }
    if let Some(category) = &filter.category {
        push_id_clause(qb, "s.category_id", category);
    }

    match &filter.template {
        None => {}
        Some(TemplatePredicate::NoTemplate) => {
            qb.push(" AND s.template_id IS NULL");
        }
        Some(TemplatePredicate::One(id)) => {
            qb.push(" AND s.template_id = ");
            qb.push_bind(id.as_str());
        }
        Some(TemplatePredicate::AnyOf(ids)) if ids.is_empty() => {
            qb.push(" AND 1=0");
        }
        Some(TemplatePredicate::AnyOf(ids)) => {
            qb.push(" AND s.template_id IN (");
            let mut sep = qb.separated(", ");
            for id in ids {
                sep.push_bind(id.as_str());
            }
            sep.push_unseparated(")");
        }
    }

    match &filter.tag {
        None => {}
        Some(TagPredicate::NoTag) => {
            qb.push(
                " AND NOT EXISTS (SELECT 1 FROM session_tags st WHERE st.session_id = s.id)",
            );
        }
        Some(TagPredicate::One(id)) => {
            qb.push(
                " AND EXISTS (SELECT 1 FROM session_tags st WHERE st.session_id = s.id AND st.tag_id = ",
            );
            qb.push_bind(id.as_str());
            qb.push(")");
        }
        Some(TagPredicate::AnyOf(ids)) if ids.is_empty() => {
            qb.push(" AND 1=0");
        }
        Some(TagPredicate::AnyOf(ids)) => {
            qb.push(
                " AND EXISTS (SELECT 1 FROM session_tags st WHERE st.session_id = s.id AND st.tag_id IN (",
            );
            let mut sep = qb.separated(", ");
            for id in ids {
                sep.push_bind(id.as_str());
            }
            sep.push_unseparated("))");
        }
        // Every selected tag must be present; the empty set is vacuously
        // satisfied, so no clause.
        Some(TagPredicate::AllOf(ids)) if ids.is_empty() => {}
        Some(TagPredicate::AllOf(ids)) => {
            qb.push(
                " AND (SELECT COUNT(DISTINCT st.tag_id) FROM session_tags st WHERE st.session_id = s.id AND st.tag_id IN (",
            );
            let mut sep = qb.separated(", ");
            for id in ids {
                sep.push_bind(id.as_str());
            }
            sep.push_unseparated(")) = ");
            qb.push_bind(ids.len() as i64);
        }
    }

    if let Some(cmp) = &filter.start_time {
        qb.push(format!(" AND s.start_time {} ", cmp.sql_op()));
        qb.push_bind(cmp.bound().timestamp());
    }
    if let Some(cmp) = &filter.end_time {
        qb.push(format!(
            " AND s.end_time IS NOT NULL AND s.end_time {} ",
            cmp.sql_op()
        ));
        qb.push_bind(cmp.bound().timestamp());
    }
    if let Some(cmp) = &filter.duration {
        qb.push(format!(
            " AND s.end_time IS NOT NULL AND (s.end_time - s.start_time) / 60 {} ",
            cmp.sql_op()
        ));
        qb.push_bind(*cmp.bound());
    }
}

/// Insert or replace a session (and its tag links) within an existing
/// transaction.
pub(crate) async fn upsert_session_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    session: &Session,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sessions
            (id, user_id, category_id, description, start_time, end_time, session_type, template_id)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(id) DO UPDATE SET
            user_id = excluded.user_id,
            category_id = excluded.category_id,
            description = excluded.description,
            start_time = excluded.start_time,
            end_time = excluded.end_time,
            session_type = excluded.session_type,
            template_id = excluded.template_id
        "#,
    )
    .bind(&session.id)
    .bind(&session.user_id)
    .bind(&session.category_id)
    .bind(&session.description)
    .bind(session.start_time.timestamp())
    .bind(session.end_time.map(|t| t.timestamp()))
    .bind(session.session_type.as_str())
    .bind(&session.template_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query("DELETE FROM session_tags WHERE session_id = ?")
        .bind(&session.id)
        .execute(&mut **tx)
        .await?;
    for tag_id in &session.tag_ids {
        sqlx::query("INSERT INTO session_tags (session_id, tag_id) VALUES (?1, ?2)")
            .bind(&session.id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

/// Batch-load tag ids for the given sessions, in insertion order.
async fn load_tag_map<'e, E>(
    executor: E,
    session_ids: &[&str],
) -> DbResult<HashMap<String, Vec<String>>>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    if session_ids.is_empty() {
        return Ok(map);
    }

    let mut qb = sqlx::QueryBuilder::new(
        "SELECT session_id, tag_id FROM session_tags WHERE session_id IN (",
    );
    let mut sep = qb.separated(", ");
    for id in session_ids {
        sep.push_bind(*id);
    }
    sep.push_unseparated(") ORDER BY rowid");

    let rows: Vec<(String, String)> = qb.build_query_as().fetch_all(executor).await?;
    for (session_id, tag_id) in rows {
        map.entry(session_id).or_default().push(tag_id);
    }
    Ok(map)
}

/// List sessions matching a filter within an existing transaction, ordered
/// by start time then id. Callers that pair a read with a rewrite go
/// through this so both see one snapshot.
pub(crate) async fn list_sessions_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    filter: &FilterSession,
) -> DbResult<Vec<Session>> {
    let mut qb = sqlx::QueryBuilder::new(
        r#"
        SELECT s.id, s.user_id, s.category_id, s.description,
               s.start_time, s.end_time, s.session_type, s.template_id
        FROM sessions s
        "#,
    );
    append_filters(&mut qb, filter);
    qb.push(" ORDER BY s.start_time, s.id");

    let rows: Vec<SessionRow> = qb.build_query_as().fetch_all(&mut **tx).await?;

    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    let mut tag_map = load_tag_map(&mut **tx, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let tags = tag_map.remove(&row.id).unwrap_or_default();
            row.into_session(tags)
        })
        .collect())
}

impl Database {
    /// Insert or replace a session, including its tag links.
    pub async fn upsert_session(&self, session: &Session) -> DbResult<()> {
        let mut tx = self.pool().begin().await?;
        upsert_session_tx(&mut tx, session).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Fetch one session by id.
    pub async fn get_session(&self, id: &str) -> DbResult<Session> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, category_id, description,
                   start_time, end_time, session_type, template_id
            FROM sessions s WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        let row = row.ok_or_else(|| DbError::NotFound {
            kind: "session",
            id: id.to_string(),
        })?;
        let mut tags = load_tag_map(self.pool(), &[id]).await?;
        Ok(row.into_session(tags.remove(id).unwrap_or_default()))
    }

    /// Delete a session (tag links cascade).
    pub async fn delete_session(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                kind: "session",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Set the end time of a running stopwatch session and return it.
    /// A stopped session has both endpoints, so it becomes a fixed session.
    pub async fn stop_session(&self, id: &str, end_time: DateTime<Utc>) -> DbResult<Session> {
        let result = sqlx::query(
            "UPDATE sessions SET end_time = ?2, session_type = 'fixed' \
             WHERE id = ?1 AND end_time IS NULL",
        )
        .bind(id)
        .bind(end_time.timestamp())
        .execute(self.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                kind: "running session",
                id: id.to_string(),
            });
        }
        self.get_session(id).await
    }

    /// List sessions matching a filter, ordered by start time then id.
    pub async fn list_sessions(&self, filter: &FilterSession) -> DbResult<Vec<Session>> {
        let mut tx = self.pool().begin().await?;
        let sessions = list_sessions_tx(&mut tx, filter).await?;
        tx.commit().await?;
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[tokio::test]
    async fn list_sessions_tx_reads_the_transaction_snapshot() {
        let db = Database::new_in_memory().await.unwrap();
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap();
        let session =
            Session::fixed("alice", start, start + Duration::minutes(30)).with_id("s-1");

        // An uncommitted write is visible to a listing in the same
        // transaction and gone again after rollback.
        let mut tx = db.pool().begin().await.unwrap();
        upsert_session_tx(&mut tx, &session).await.unwrap();
        let listed = list_sessions_tx(&mut tx, &FilterSession::default())
            .await
            .unwrap();
        assert_eq!(listed, vec![session]);
        tx.rollback().await.unwrap();

        let after = db.list_sessions(&FilterSession::default()).await.unwrap();
        assert!(after.is_empty());
    }
}
