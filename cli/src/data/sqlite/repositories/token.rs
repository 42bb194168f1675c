//! Token permission snapshot repository
//!
//! At most one logical "current" row is retained.

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::TokenPermissionRow;

pub async fn replace(pool: &SqlitePool, row: &TokenPermissionRow) -> Result<(), SqliteError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM token_permissions")
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        "INSERT INTO token_permissions (id, login, scopes, rate_limit, rate_remaining, rate_reset, fetched_at)
         VALUES (1, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&row.login)
    .bind(&row.scopes)
    .bind(row.rate_limit)
    .bind(row.rate_remaining)
    .bind(row.rate_reset)
    .bind(row.fetched_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn current(pool: &SqlitePool) -> Result<Option<TokenPermissionRow>, SqliteError> {
    let row = sqlx::query_as::<_, TokenPermissionRow>(
        "SELECT login, scopes, rate_limit, rate_remaining, rate_reset, fetched_at
         FROM token_permissions WHERE id = 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::test_pool;

    fn snapshot(login: &str, remaining: i64) -> TokenPermissionRow {
        TokenPermissionRow {
            login: login.to_string(),
            scopes: "admin:org,repo".to_string(),
            rate_limit: 5000,
            rate_remaining: remaining,
            rate_reset: 1700000000,
            fetched_at: 1700000000,
        }
    }

    #[tokio::test]
    async fn test_single_current_row() {
        let pool = test_pool().await;
        replace(&pool, &snapshot("octocat", 4999)).await.unwrap();
        replace(&pool, &snapshot("octocat", 4000)).await.unwrap();

        let current = current(&pool).await.unwrap().unwrap();
        assert_eq!(current.rate_remaining, 4000);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM token_permissions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_empty_cache_has_no_snapshot() {
        let pool = test_pool().await;
        assert!(current(&pool).await.unwrap().is_none());
    }
}
