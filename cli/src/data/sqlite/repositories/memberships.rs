//! Team membership repository
//!
//! Memberships are replaced per team slug: syncing one team's members
//! must never delete another team's rows.

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::TeamMembershipRow;

/// Replace one team's membership rows with a fresh snapshot. The delete
/// is scoped to `slug`; rows for other teams are untouched.
pub async fn replace_for_team(
    pool: &SqlitePool,
    slug: &str,
    rows: &[TeamMembershipRow],
) -> Result<usize, SqliteError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM team_memberships WHERE team_slug = ?")
        .bind(slug)
        .execute(&mut *tx)
        .await?;
    for row in rows {
        sqlx::query(
            "INSERT INTO team_memberships
             (team_id, user_id, team_slug, user_login, role, remote_created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(row.team_id)
        .bind(row.user_id)
        .bind(&row.team_slug)
        .bind(&row.user_login)
        .bind(&row.role)
        .bind(row.remote_created_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(rows.len())
}

pub async fn list_for_team(
    pool: &SqlitePool,
    slug: &str,
) -> Result<Vec<TeamMembershipRow>, SqliteError> {
    let rows = sqlx::query_as::<_, TeamMembershipRow>(
        "SELECT * FROM team_memberships WHERE team_slug = ? ORDER BY user_login",
    )
    .bind(slug)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
