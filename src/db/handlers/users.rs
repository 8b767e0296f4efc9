//! Database repository for users.

use crate::types::{UserId, abbrev_uuid};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub skip: i64,
    pub limit: i64,
}

impl UserFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

pub struct Users<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            "SELECT id, email, display_name, avatar_url, created_at, updated_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(user)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (id, email, display_name, avatar_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, email, display_name, avatar_url, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.email)
        .bind(&request.display_name)
        .bind(&request.avatar_url)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            "SELECT id, email, display_name, avatar_url, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let users = sqlx::query_as::<_, UserDBResponse>(
            "SELECT id, email, display_name, avatar_url, created_at, updated_at FROM users ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(users)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            UPDATE users SET
                display_name = COALESCE(?, display_name),
                avatar_url = COALESCE(?, avatar_url),
                updated_at = ?
            WHERE id = ?
            RETURNING id, email, display_name, avatar_url, created_at, updated_at
            "#,
        )
        .bind(&request.display_name)
        .bind(&request.avatar_url)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(user)
    }
}
