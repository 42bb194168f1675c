//! Repository (git repo) repository

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::RepoRow;

pub async fn replace_all(pool: &SqlitePool, rows: &[RepoRow]) -> Result<usize, SqliteError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM repositories")
        .execute(&mut *tx)
        .await?;
    for row in rows {
        sqlx::query(
            "INSERT INTO repositories
             (id, name, full_name, description, private, language, size,
              stargazers, watchers, forks, remote_created_at, remote_updated_at, remote_pushed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.full_name)
        .bind(&row.description)
        .bind(row.private)
        .bind(&row.language)
        .bind(row.size)
        .bind(row.stargazers)
        .bind(row.watchers)
        .bind(row.forks)
        .bind(row.remote_created_at)
        .bind(row.remote_updated_at)
        .bind(row.remote_pushed_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(rows.len())
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<RepoRow>, SqliteError> {
    let rows = sqlx::query_as::<_, RepoRow>("SELECT * FROM repositories ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get_by_name(pool: &SqlitePool, name: &str) -> Result<Option<RepoRow>, SqliteError> {
    let row = sqlx::query_as::<_, RepoRow>("SELECT * FROM repositories WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Cached repository names, used as the parent-key list for aggregate
/// collaborator and team-grant syncs.
pub async fn list_names(pool: &SqlitePool) -> Result<Vec<String>, SqliteError> {
    let names = sqlx::query_scalar::<_, String>("SELECT name FROM repositories ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(names)
}
