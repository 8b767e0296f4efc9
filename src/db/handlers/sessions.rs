//! Database repository for session records.
//!
//! Expiry interpretation lives in [`crate::auth::session`]; this layer only
//! stores, fetches, renews and deletes rows.

use crate::db::{errors::Result, models::sessions::SessionRecord};
use crate::types::{UnixMillis, UserId, abbrev_token, abbrev_uuid};
use sqlx::SqliteConnection;
use tracing::instrument;

pub struct Sessions<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Sessions<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip_all, fields(session = %abbrev_token(id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn create(
        &mut self,
        id: &str,
        user_id: UserId,
        active_expires: UnixMillis,
        idle_expires: UnixMillis,
    ) -> Result<SessionRecord> {
        let session = sqlx::query_as::<_, SessionRecord>(
            r#"
            INSERT INTO user_sessions (id, user_id, active_expires, idle_expires)
            VALUES (?, ?, ?, ?)
            RETURNING id, user_id, active_expires, idle_expires
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(active_expires)
        .bind(idle_expires)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(session)
    }

    #[instrument(skip_all, fields(session = %abbrev_token(id)), err)]
    pub async fn get(&mut self, id: &str) -> Result<Option<SessionRecord>> {
        let session = sqlx::query_as::<_, SessionRecord>(
            "SELECT id, user_id, active_expires, idle_expires FROM user_sessions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(session)
    }

    /// Extends a session's expiry windows in one statement. The `idle_expires
    /// > ?` guard makes renewal a no-op when the session has already fully
    /// expired or been deleted, so concurrent renewals never resurrect it.
    #[instrument(skip_all, fields(session = %abbrev_token(id)), err)]
    pub async fn renew(
        &mut self,
        id: &str,
        now: UnixMillis,
        active_expires: UnixMillis,
        idle_expires: UnixMillis,
    ) -> Result<Option<SessionRecord>> {
        let session = sqlx::query_as::<_, SessionRecord>(
            r#"
            UPDATE user_sessions
            SET active_expires = ?, idle_expires = ?
            WHERE id = ? AND idle_expires > ?
            RETURNING id, user_id, active_expires, idle_expires
            "#,
        )
        .bind(active_expires)
        .bind(idle_expires)
        .bind(id)
        .bind(now)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(session)
    }

    #[instrument(skip_all, fields(session = %abbrev_token(id)), err)]
    pub async fn delete(&mut self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revokes every session of a user, e.g. after a password change.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn delete_all_for_user(&mut self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::repository::Repository;
    use crate::db::handlers::users::Users;
    use crate::db::models::users::UserCreateDBRequest;
    use sqlx::SqlitePool;

    async fn seed_user(conn: &mut SqliteConnection) -> UserId {
        Users::new(conn)
            .create(&UserCreateDBRequest {
                email: "sessions@example.com".to_string(),
                display_name: None,
                avatar_url: None,
            })
            .await
            .unwrap()
            .id
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;

        let mut repo = Sessions::new(&mut conn);
        let created = repo.create("token-a", user_id, 1_000, 2_000).await.unwrap();
        assert_eq!(created.active_expires, 1_000);
        assert_eq!(created.idle_expires, 2_000);

        let fetched = repo.get("token-a").await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(repo.get("token-b").await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_renew_extends_windows(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;

        let mut repo = Sessions::new(&mut conn);
        repo.create("token", user_id, 1_000, 2_000).await.unwrap();

        let renewed = repo.renew("token", 1_500, 3_000, 4_000).await.unwrap().unwrap();
        assert_eq!(renewed.active_expires, 3_000);
        assert_eq!(renewed.idle_expires, 4_000);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_renew_refuses_fully_expired(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;

        let mut repo = Sessions::new(&mut conn);
        repo.create("token", user_id, 1_000, 2_000).await.unwrap();

        assert!(repo.renew("token", 2_000, 5_000, 6_000).await.unwrap().is_none());
        assert!(repo.renew("missing", 0, 5_000, 6_000).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_is_idempotent(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;

        let mut repo = Sessions::new(&mut conn);
        repo.create("token", user_id, 1_000, 2_000).await.unwrap();

        assert!(repo.delete("token").await.unwrap());
        assert!(!repo.delete("token").await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_all_for_user(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;

        let mut repo = Sessions::new(&mut conn);
        repo.create("one", user_id, 1_000, 2_000).await.unwrap();
        repo.create("two", user_id, 1_000, 2_000).await.unwrap();

        assert_eq!(repo.delete_all_for_user(user_id).await.unwrap(), 2);
        assert!(repo.get("one").await.unwrap().is_none());
    }
}
