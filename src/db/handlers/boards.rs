//! Database repositories for boards, lists and cards.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::boards::{
        BoardCreateDBRequest, BoardDBResponse, BoardUpdateDBRequest, CardCreateDBRequest, CardDBResponse,
        CardUpdateDBRequest, ListCreateDBRequest, ListDBResponse, ListUpdateDBRequest,
    },
};
use crate::types::{BoardId, CardId, ListId, OrganizationId, abbrev_uuid};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;
use uuid::Uuid;

/// Boards are always listed within one organization.
#[derive(Debug, Clone)]
pub struct BoardFilter {
    pub organization_id: OrganizationId,
}

#[derive(Debug, Clone)]
pub struct ListFilter {
    pub board_id: BoardId,
}

#[derive(Debug, Clone)]
pub struct CardFilter {
    pub list_id: ListId,
}

pub struct Boards<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Boards<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Boards<'c> {
    type CreateRequest = BoardCreateDBRequest;
    type UpdateRequest = BoardUpdateDBRequest;
    type Response = BoardDBResponse;
    type Id = BoardId;
    type Filter = BoardFilter;

    #[instrument(skip(self, request), fields(organization_id = %abbrev_uuid(&request.organization_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let now = Utc::now();
        let board = sqlx::query_as::<_, BoardDBResponse>(
            r#"
            INSERT INTO boards (id, name, banner_image_url, organization_id, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, name, banner_image_url, organization_id, created_by, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.banner_image_url)
        .bind(request.organization_id)
        .bind(request.created_by)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(board)
    }

    #[instrument(skip(self), fields(board_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let board = sqlx::query_as::<_, BoardDBResponse>(
            "SELECT id, name, banner_image_url, organization_id, created_by, created_at, updated_at FROM boards WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(board)
    }

    #[instrument(skip(self, filter), fields(organization_id = %abbrev_uuid(&filter.organization_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let boards = sqlx::query_as::<_, BoardDBResponse>(
            "SELECT id, name, banner_image_url, organization_id, created_by, created_at, updated_at FROM boards WHERE organization_id = ? ORDER BY created_at DESC",
        )
        .bind(filter.organization_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(boards)
    }

    #[instrument(skip(self), fields(board_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM boards WHERE id = ?").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(board_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let board = sqlx::query_as::<_, BoardDBResponse>(
            r#"
            UPDATE boards SET
                name = COALESCE(?, name),
                banner_image_url = COALESCE(?, banner_image_url),
                updated_at = ?
            WHERE id = ?
            RETURNING id, name, banner_image_url, organization_id, created_by, created_at, updated_at
            "#,
        )
        .bind(&request.name)
        .bind(&request.banner_image_url)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(board)
    }
}

pub struct Lists<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Lists<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// The organization a list belongs to, via its board.
    #[instrument(skip(self), fields(list_id = %abbrev_uuid(&id)), err)]
    pub async fn organization_of(&mut self, id: ListId) -> Result<Option<OrganizationId>> {
        let organization_id = sqlx::query_scalar::<_, OrganizationId>(
            "SELECT b.organization_id FROM board_lists l JOIN boards b ON b.id = l.board_id WHERE l.id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(organization_id)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Lists<'c> {
    type CreateRequest = ListCreateDBRequest;
    type UpdateRequest = ListUpdateDBRequest;
    type Response = ListDBResponse;
    type Id = ListId;
    type Filter = ListFilter;

    #[instrument(skip(self, request), fields(board_id = %abbrev_uuid(&request.board_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let now = Utc::now();
        let list = sqlx::query_as::<_, ListDBResponse>(
            r#"
            INSERT INTO board_lists (id, name, position, board_id, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, name, position, board_id, created_by, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(request.position)
        .bind(request.board_id)
        .bind(request.created_by)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(list)
    }

    #[instrument(skip(self), fields(list_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let list = sqlx::query_as::<_, ListDBResponse>(
            "SELECT id, name, position, board_id, created_by, created_at, updated_at FROM board_lists WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(list)
    }

    #[instrument(skip(self, filter), fields(board_id = %abbrev_uuid(&filter.board_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let lists = sqlx::query_as::<_, ListDBResponse>(
            "SELECT id, name, position, board_id, created_by, created_at, updated_at FROM board_lists WHERE board_id = ? ORDER BY position ASC",
        )
        .bind(filter.board_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(lists)
    }

    #[instrument(skip(self), fields(list_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM board_lists WHERE id = ?").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(list_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let list = sqlx::query_as::<_, ListDBResponse>(
            r#"
            UPDATE board_lists SET
                name = COALESCE(?, name),
                position = COALESCE(?, position),
                updated_at = ?
            WHERE id = ?
            RETURNING id, name, position, board_id, created_by, created_at, updated_at
            "#,
        )
        .bind(&request.name)
        .bind(request.position)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(list)
    }
}

pub struct Cards<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Cards<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// The organization a card belongs to, via its list and board.
    #[instrument(skip(self), fields(card_id = %abbrev_uuid(&id)), err)]
    pub async fn organization_of(&mut self, id: CardId) -> Result<Option<OrganizationId>> {
        let organization_id = sqlx::query_scalar::<_, OrganizationId>(
            r#"
            SELECT b.organization_id
            FROM list_cards c
            JOIN board_lists l ON l.id = c.list_id
            JOIN boards b ON b.id = l.board_id
            WHERE c.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(organization_id)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Cards<'c> {
    type CreateRequest = CardCreateDBRequest;
    type UpdateRequest = CardUpdateDBRequest;
    type Response = CardDBResponse;
    type Id = CardId;
    type Filter = CardFilter;

    #[instrument(skip(self, request), fields(list_id = %abbrev_uuid(&request.list_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let now = Utc::now();
        let card = sqlx::query_as::<_, CardDBResponse>(
            r#"
            INSERT INTO list_cards (id, name, position, description, list_id, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, name, position, description, list_id, created_by, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(request.position)
        .bind(&request.description)
        .bind(request.list_id)
        .bind(request.created_by)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(card)
    }

    #[instrument(skip(self), fields(card_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let card = sqlx::query_as::<_, CardDBResponse>(
            "SELECT id, name, position, description, list_id, created_by, created_at, updated_at FROM list_cards WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(card)
    }

    #[instrument(skip(self, filter), fields(list_id = %abbrev_uuid(&filter.list_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let cards = sqlx::query_as::<_, CardDBResponse>(
            "SELECT id, name, position, description, list_id, created_by, created_at, updated_at FROM list_cards WHERE list_id = ? ORDER BY position ASC",
        )
        .bind(filter.list_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(cards)
    }

    #[instrument(skip(self), fields(card_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM list_cards WHERE id = ?").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(card_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let card = sqlx::query_as::<_, CardDBResponse>(
            r#"
            UPDATE list_cards SET
                name = COALESCE(?, name),
                position = COALESCE(?, position),
                description = COALESCE(?, description),
                list_id = COALESCE(?, list_id),
                updated_at = ?
            WHERE id = ?
            RETURNING id, name, position, description, list_id, created_by, created_at, updated_at
            "#,
        )
        .bind(&request.name)
        .bind(request.position)
        .bind(&request.description)
        .bind(request.list_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(card)
    }
}
