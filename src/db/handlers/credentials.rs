//! Database repository for login credentials.

use crate::db::{
    errors::Result,
    models::credentials::{CredentialCreateDBRequest, CredentialDBResponse},
};
use crate::types::{UserId, abbrev_uuid};
use sqlx::SqliteConnection;
use tracing::instrument;

pub struct Credentials<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Credentials<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Registers a new identity. Fails with a unique violation if the
    /// `(provider, provider_user_id)` pair is already taken.
    #[instrument(skip(self, request), fields(provider = %request.provider, user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn create(&mut self, request: &CredentialCreateDBRequest) -> Result<CredentialDBResponse> {
        let credential = sqlx::query_as::<_, CredentialDBResponse>(
            r#"
            INSERT INTO user_credentials (provider, provider_user_id, user_id, password_hash)
            VALUES (?, ?, ?, ?)
            RETURNING provider, provider_user_id, user_id, password_hash
            "#,
        )
        .bind(&request.provider)
        .bind(&request.provider_user_id)
        .bind(request.user_id)
        .bind(&request.password_hash)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(credential)
    }

    #[instrument(skip(self, provider_user_id), fields(provider = %provider), err)]
    pub async fn get(&mut self, provider: &str, provider_user_id: &str) -> Result<Option<CredentialDBResponse>> {
        let credential = sqlx::query_as::<_, CredentialDBResponse>(
            "SELECT provider, provider_user_id, user_id, password_hash FROM user_credentials WHERE provider = ? AND provider_user_id = ?",
        )
        .bind(provider)
        .bind(provider_user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(credential)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn delete_all_for_user(&mut self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_credentials WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use crate::db::handlers::repository::Repository;
    use crate::db::handlers::users::Users;
    use crate::db::models::credentials::EMAIL_PROVIDER;
    use crate::db::models::users::UserCreateDBRequest;
    use sqlx::SqlitePool;
    use uuid::Uuid;

    async fn seed_user(conn: &mut SqliteConnection, email: &str) -> UserId {
        Users::new(conn)
            .create(&UserCreateDBRequest {
                email: email.to_string(),
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
        let user_id = seed_user(&mut conn, "cred@example.com").await;

        let mut repo = Credentials::new(&mut conn);
        repo.create(&CredentialCreateDBRequest {
            provider: EMAIL_PROVIDER.to_string(),
            provider_user_id: "cred@example.com".to_string(),
            user_id,
            password_hash: Some("$argon2id$fake".to_string()),
        })
        .await
        .unwrap();

        let found = repo.get(EMAIL_PROVIDER, "cred@example.com").await.unwrap().unwrap();
        assert_eq!(found.user_id, user_id);
        assert_eq!(found.password_hash.as_deref(), Some("$argon2id$fake"));

        assert!(repo.get(EMAIL_PROVIDER, "other@example.com").await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_identity_rejected(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn, "dup@example.com").await;

        let mut repo = Credentials::new(&mut conn);
        let request = CredentialCreateDBRequest {
            provider: EMAIL_PROVIDER.to_string(),
            provider_user_id: "dup@example.com".to_string(),
            user_id,
            password_hash: None,
        };
        repo.create(&request).await.unwrap();

        let err = repo.create(&request).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_user_rejected(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Credentials::new(&mut conn);

        let err = repo
            .create(&CredentialCreateDBRequest {
                provider: EMAIL_PROVIDER.to_string(),
                provider_user_id: "ghost@example.com".to_string(),
                user_id: Uuid::new_v4(),
                password_hash: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_all_for_user(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn, "wipe@example.com").await;

        let mut repo = Credentials::new(&mut conn);
        repo.create(&CredentialCreateDBRequest {
            provider: EMAIL_PROVIDER.to_string(),
            provider_user_id: "wipe@example.com".to_string(),
            user_id,
            password_hash: None,
        })
        .await
        .unwrap();

        assert_eq!(repo.delete_all_for_user(user_id).await.unwrap(), 1);
        assert!(repo.get(EMAIL_PROVIDER, "wipe@example.com").await.unwrap().is_none());
    }
}
