//! Team repository

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::TeamRow;

pub async fn replace_all(pool: &SqlitePool, rows: &[TeamRow]) -> Result<usize, SqliteError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM teams").execute(&mut *tx).await?;
    for row in rows {
        sqlx::query(
            "INSERT INTO teams (id, slug, name, description, privacy, permission)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(row.id)
        .bind(&row.slug)
        .bind(&row.name)
        .bind(&row.description)
        .bind(&row.privacy)
        .bind(&row.permission)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(rows.len())
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<TeamRow>, SqliteError> {
    let rows = sqlx::query_as::<_, TeamRow>("SELECT * FROM teams ORDER BY slug")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<TeamRow>, SqliteError> {
    let row = sqlx::query_as::<_, TeamRow>("SELECT * FROM teams WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Cached team slugs, used as the parent-key list for aggregate member
/// syncs.
pub async fn list_slugs(pool: &SqlitePool) -> Result<Vec<String>, SqliteError> {
    let slugs = sqlx::query_scalar::<_, String>("SELECT slug FROM teams ORDER BY slug")
        .fetch_all(pool)
        .await?;
    Ok(slugs)
}
