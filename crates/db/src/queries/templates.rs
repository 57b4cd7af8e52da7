// crates/db/src/queries/templates.rs
// Template persistence and materialization.

use tracing::info;

use timeloom_core::{template, RecurringSessionDefinition, Session, SessionTemplate};

use super::row_types::TemplateRow;
use super::sessions::upsert_session_tx;
use crate::{Database, DbError, DbResult};

async fn load_definitions(
    pool: &sqlx::SqlitePool,
    template_id: &str,
) -> DbResult<Vec<RecurringSessionDefinition>> {
    let rows: Vec<(i64, Option<String>, Option<String>, i64, i64)> = sqlx::query_as(
        r#"
        SELECT position, category_id, description, start_minute_offset, end_minute_offset
        FROM template_definitions WHERE template_id = ? ORDER BY position
        "#,
    )
    .bind(template_id)
    .fetch_all(pool)
    .await?;

    let mut defs = Vec::with_capacity(rows.len());
    for (position, category_id, description, start_minute_offset, end_minute_offset) in rows {
        let tags: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT tag_id FROM template_definition_tags
            WHERE template_id = ?1 AND position = ?2 ORDER BY rowid
            "#,
        )
        .bind(template_id)
        .bind(position)
        .fetch_all(pool)
        .await?;
        defs.push(RecurringSessionDefinition {
            category_id,
            tag_ids: tags.into_iter().map(|(t,)| t).collect(),
            description,
            start_minute_offset,
            end_minute_offset,
        });
    }
    Ok(defs)
}

impl Database {
    /// Validate, persist, and materialize a template in one transaction.
    ///
    /// Saving an existing id replaces its definitions and regenerates every
    /// session the previous version produced. Returns the materialized
    /// sessions.
    pub async fn save_template(&self, tpl: &SessionTemplate) -> DbResult<Vec<Session>> {
        let sessions = template::expand(tpl)?;

        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO templates (id, user_id, name, interval, start_date, end_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                user_id = excluded.user_id,
                name = excluded.name,
                interval = excluded.interval,
                start_date = excluded.start_date,
                end_date = excluded.end_date
            "#,
        )
        .bind(&tpl.id)
        .bind(&tpl.user_id)
        .bind(&tpl.name)
        .bind(tpl.interval.as_str())
        .bind(tpl.start_date.format("%Y-%m-%d").to_string())
        .bind(tpl.end_date.format("%Y-%m-%d").to_string())
        .execute(&mut *tx)
        .await?;

        // Old definitions and previously generated sessions go away before
        // the new expansion lands.
        sqlx::query("DELETE FROM template_definitions WHERE template_id = ?")
            .bind(&tpl.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sessions WHERE template_id = ?")
            .bind(&tpl.id)
            .execute(&mut *tx)
            .await?;

        for (position, def) in tpl.sessions.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO template_definitions
                    (template_id, position, category_id, description,
                     start_minute_offset, end_minute_offset)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&tpl.id)
            .bind(position as i64)
            .bind(&def.category_id)
            .bind(&def.description)
            .bind(def.start_minute_offset)
            .bind(def.end_minute_offset)
            .execute(&mut *tx)
            .await?;
            for tag_id in &def.tag_ids {
                sqlx::query(
                    r#"
                    INSERT INTO template_definition_tags (template_id, position, tag_id)
                    VALUES (?1, ?2, ?3)
                    "#,
                )
                .bind(&tpl.id)
                .bind(position as i64)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        for session in &sessions {
            upsert_session_tx(&mut tx, session).await?;
        }

        tx.commit().await?;

        info!(
            template = %tpl.id,
            sessions = sessions.len(),
            "saved and materialized template"
        );
        Ok(sessions)
    }

    pub async fn get_template(&self, id: &str) -> DbResult<SessionTemplate> {
        let row: Option<TemplateRow> = sqlx::query_as(
            "SELECT id, user_id, name, interval, start_date, end_date FROM templates WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        let row = row.ok_or_else(|| DbError::NotFound {
            kind: "template",
            id: id.to_string(),
        })?;
        let defs = load_definitions(self.pool(), id).await?;
        Ok(row.into_template(defs))
    }

    /// List all templates, ordered by name.
    pub async fn list_templates(&self) -> DbResult<Vec<SessionTemplate>> {
        let rows: Vec<TemplateRow> = sqlx::query_as(
            "SELECT id, user_id, name, interval, start_date, end_date FROM templates ORDER BY name, id",
        )
        .fetch_all(self.pool())
        .await?;

        let mut templates = Vec::with_capacity(rows.len());
        for row in rows {
            let defs = load_definitions(self.pool(), &row.id).await?;
            templates.push(row.into_template(defs));
        }
        Ok(templates)
    }

    /// Delete a template; its definitions and generated sessions cascade.
    pub async fn delete_template(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM templates WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                kind: "template",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
