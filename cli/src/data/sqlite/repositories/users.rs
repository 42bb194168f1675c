//! User and outside-collaborator repositories

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::{OutsideCollaboratorRow, UserRow};

/// Replace the whole user collection with a fresh snapshot.
pub async fn replace_all(pool: &SqlitePool, rows: &[UserRow]) -> Result<usize, SqliteError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM users").execute(&mut *tx).await?;
    for row in rows {
        sqlx::query(
            "INSERT INTO users (id, login, name, email, company, location, remote_created_at, remote_updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(row.id)
        .bind(&row.login)
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.company)
        .bind(&row.location)
        .bind(row.remote_created_at)
        .bind(row.remote_updated_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(rows.len())
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<UserRow>, SqliteError> {
    let rows = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY login")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get_by_login(pool: &SqlitePool, login: &str) -> Result<Option<UserRow>, SqliteError> {
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE login = ?")
        .bind(login)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Replace the org-level outside collaborator listing.
pub async fn replace_outside(
    pool: &SqlitePool,
    rows: &[OutsideCollaboratorRow],
) -> Result<usize, SqliteError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM outside_collaborators")
        .execute(&mut *tx)
        .await?;
    for row in rows {
        sqlx::query("INSERT INTO outside_collaborators (id, login) VALUES (?, ?)")
            .bind(row.id)
            .bind(&row.login)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(rows.len())
}

pub async fn list_outside(pool: &SqlitePool) -> Result<Vec<OutsideCollaboratorRow>, SqliteError> {
    let rows = sqlx::query_as::<_, OutsideCollaboratorRow>(
        "SELECT * FROM outside_collaborators ORDER BY login",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
