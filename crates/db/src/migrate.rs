// crates/db/src/migrate.rs
// Transactional application of bulk category/tag migrations. The rules
// (validation, matching, per-session rewrite) live in timeloom-core; this
// module resolves the affected set against the store and applies the
// rewrite atomically.

use tracing::info;

use timeloom_core::{MigrationKind, MigrationSpec, Session};

use crate::queries::sessions::list_sessions_tx;
use crate::{Database, DbResult};

/// Max sessions echoed back in a preview.
pub const PREVIEW_SAMPLE_LIMIT: usize = 20;

/// Dry-run result: how many sessions a migration would rewrite, plus a
/// bounded sample of them as they currently stand.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MigrationPreview {
    pub affected_count: usize,
    pub sample: Vec<Session>,
}

/// Sessions the migration would touch, ordered by start time. Runs inside
/// the caller's transaction so a following rewrite sees the same snapshot.
async fn matching_sessions_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    spec: &MigrationSpec,
) -> DbResult<Vec<Session>> {
    let sessions = list_sessions_tx(tx, &spec.filter).await?;
    Ok(sessions.into_iter().filter(|s| spec.matches(s)).collect())
}

impl Database {
    /// Reject malformed specs and specs referencing unknown catalog ids
    /// before anything is read or rewritten.
    async fn check_migration_spec(&self, spec: &MigrationSpec) -> DbResult<()> {
        spec.validate()?;

        match spec.kind {
            MigrationKind::Category => {
                self.get_category(&spec.from_id).await?;
                if let Some(target) = &spec.target_id {
                    self.get_category(target).await?;
                }
            }
            MigrationKind::Tag => {
                self.get_tag(&spec.from_id).await?;
                if let Some(target) = &spec.target_id {
                    self.get_tag(target).await?;
                }
            }
        }
        Ok(())
    }

    /// Dry run: report the affected set without touching any rows.
    ///
    /// The preview is recomputed from the live store each call, so results
    /// reflect edits made since an earlier preview.
    pub async fn preview_migration(&self, spec: &MigrationSpec) -> DbResult<MigrationPreview> {
        self.check_migration_spec(spec).await?;

        let mut tx = self.pool().begin().await?;
        let matched = matching_sessions_tx(&mut tx, spec).await?;
        tx.commit().await?;

        let affected_count = matched.len();
        let sample = matched.into_iter().take(PREVIEW_SAMPLE_LIMIT).collect();
        Ok(MigrationPreview {
            affected_count,
            sample,
        })
    }

    /// Apply a migration to every matching session in one transaction.
    /// Returns the number of sessions rewritten.
    pub async fn execute_migration(&self, spec: &MigrationSpec) -> DbResult<usize> {
        self.check_migration_spec(spec).await?;

        // Match inside the same transaction as the rewrite. A writer
        // committing between a separate match and the rewrite could
        // otherwise leave the target tag on a session that no longer
        // carries the source.
        let mut tx = self.pool().begin().await?;
        let matched = matching_sessions_tx(&mut tx, spec).await?;
        for session in &matched {
            let next = spec.apply(session);
            match spec.kind {
                MigrationKind::Category => {
                    sqlx::query("UPDATE sessions SET category_id = ?2 WHERE id = ?1")
                        .bind(&next.id)
                        .bind(&next.category_id)
                        .execute(&mut *tx)
                        .await?;
                }
                MigrationKind::Tag => {
                    sqlx::query(
                        "DELETE FROM session_tags WHERE session_id = ?1 AND tag_id = ?2",
                    )
                    .bind(&next.id)
                    .bind(&spec.from_id)
                    .execute(&mut *tx)
                    .await?;
                    if let Some(target) = &spec.target_id {
                        sqlx::query(
                            r#"
                            INSERT OR IGNORE INTO session_tags (session_id, tag_id)
                            VALUES (?1, ?2)
                            "#,
                        )
                        .bind(&next.id)
                        .bind(target)
                        .execute(&mut *tx)
                        .await?;
                    }
                }
            }
        }
        tx.commit().await?;

        info!(
            from = %spec.from_id,
            target = spec.target_id.as_deref().unwrap_or("(removed)"),
            affected = matched.len(),
            "executed migration"
        );
        Ok(matched.len())
    }
}
