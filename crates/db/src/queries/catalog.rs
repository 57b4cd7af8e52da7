// crates/db/src/queries/catalog.rs
// Category and tag catalogs.

use timeloom_core::{Category, Tag};

use crate::{Database, DbError, DbResult};

impl Database {
    /// Insert or replace a category.
    pub async fn upsert_category(&self, category: &Category) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, color) VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name, color = excluded.color
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.color)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn get_category(&self, id: &str) -> DbResult<Category> {
        let row: Option<(String, String, String)> =
            sqlx::query_as("SELECT id, name, color FROM categories WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        let (id, name, color) = row.ok_or_else(|| DbError::NotFound {
            kind: "category",
            id: id.to_string(),
        })?;
        Ok(Category { id, name, color })
    }

    /// List all categories, ordered by name.
    pub async fn list_categories(&self) -> DbResult<Vec<Category>> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT id, name, color FROM categories ORDER BY name, id")
                .fetch_all(self.pool())
                .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name, color)| Category { id, name, color })
            .collect())
    }

    /// Delete a category. Sessions referencing it fall back to no category.
    pub async fn delete_category(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                kind: "category",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Insert or replace a tag, including its category restrictions.
    pub async fn upsert_tag(&self, tag: &Tag) -> DbResult<()> {
        let mut tx = self.pool().begin().await?;
        sqlx::query(
            r#"
            INSERT INTO tags (id, label, color) VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET label = excluded.label, color = excluded.color
            "#,
        )
        .bind(&tag.id)
        .bind(&tag.label)
        .bind(&tag.color)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM tag_categories WHERE tag_id = ?")
            .bind(&tag.id)
            .execute(&mut *tx)
            .await?;
        for category_id in &tag.category_ids {
            sqlx::query("INSERT INTO tag_categories (tag_id, category_id) VALUES (?1, ?2)")
                .bind(&tag.id)
                .bind(category_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_tag(&self, id: &str) -> DbResult<Tag> {
        let row: Option<(String, String, String)> =
            sqlx::query_as("SELECT id, label, color FROM tags WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        let (id, label, color) = row.ok_or_else(|| DbError::NotFound {
            kind: "tag",
            id: id.to_string(),
        })?;
        let category_ids: Vec<(String,)> = sqlx::query_as(
            "SELECT category_id FROM tag_categories WHERE tag_id = ? ORDER BY rowid",
        )
        .bind(&id)
        .fetch_all(self.pool())
        .await?;
        Ok(Tag {
            id,
            label,
            color,
            category_ids: category_ids.into_iter().map(|(c,)| c).collect(),
        })
    }

    /// List all tags, ordered by label.
    pub async fn list_tags(&self) -> DbResult<Vec<Tag>> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT id, label, color FROM tags ORDER BY label, id")
                .fetch_all(self.pool())
                .await?;
        let links: Vec<(String, String)> =
            sqlx::query_as("SELECT tag_id, category_id FROM tag_categories ORDER BY rowid")
                .fetch_all(self.pool())
                .await?;

        let mut tags: Vec<Tag> = rows
            .into_iter()
            .map(|(id, label, color)| Tag {
                id,
                label,
                color,
                category_ids: Vec::new(),
            })
            .collect();
        for (tag_id, category_id) in links {
            if let Some(tag) = tags.iter_mut().find(|t| t.id == tag_id) {
                tag.category_ids.push(category_id);
            }
        }
        Ok(tags)
    }

    /// Delete a tag. Session and category links cascade.
    pub async fn delete_tag(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                kind: "tag",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
