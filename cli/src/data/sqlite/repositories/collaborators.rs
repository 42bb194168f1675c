//! Repository collaborator and team-grant repositories
//!
//! Both link tables are replaced per repository and reconciled
//! independently of each other.

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::{RepoCollaboratorRow, RepoTeamGrantRow};

pub async fn replace_collaborators_for_repo(
    pool: &SqlitePool,
    repo: &str,
    rows: &[RepoCollaboratorRow],
) -> Result<usize, SqliteError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM repo_collaborators WHERE repo_name = ?")
        .bind(repo)
        .execute(&mut *tx)
        .await?;
    for row in rows {
        sqlx::query(
            "INSERT INTO repo_collaborators (repo_name, user_login, permission) VALUES (?, ?, ?)",
        )
        .bind(&row.repo_name)
        .bind(&row.user_login)
        .bind(&row.permission)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(rows.len())
}

pub async fn list_collaborators_for_repo(
    pool: &SqlitePool,
    repo: &str,
) -> Result<Vec<RepoCollaboratorRow>, SqliteError> {
    let rows = sqlx::query_as::<_, RepoCollaboratorRow>(
        "SELECT * FROM repo_collaborators WHERE repo_name = ? ORDER BY user_login",
    )
    .bind(repo)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn replace_grants_for_repo(
    pool: &SqlitePool,
    repo: &str,
    rows: &[RepoTeamGrantRow],
) -> Result<usize, SqliteError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM repo_team_grants WHERE repo_name = ?")
        .bind(repo)
        .execute(&mut *tx)
        .await?;
    for row in rows {
        sqlx::query(
            "INSERT INTO repo_team_grants (repo_name, team_slug, permission) VALUES (?, ?, ?)",
        )
        .bind(&row.repo_name)
        .bind(&row.team_slug)
        .bind(&row.permission)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(rows.len())
}

pub async fn list_grants_for_repo(
    pool: &SqlitePool,
    repo: &str,
) -> Result<Vec<RepoTeamGrantRow>, SqliteError> {
    let rows = sqlx::query_as::<_, RepoTeamGrantRow>(
        "SELECT * FROM repo_team_grants WHERE repo_name = ? ORDER BY team_slug",
    )
    .bind(repo)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
