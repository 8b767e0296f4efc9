//! Database request/response models for boards, lists and cards.

use crate::types::{BoardId, CardId, ListId, OrganizationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct BoardCreateDBRequest {
    pub name: String,
    pub banner_image_url: Option<String>,
    pub organization_id: OrganizationId,
    pub created_by: UserId,
}

#[derive(Debug, Clone, Default)]
pub struct BoardUpdateDBRequest {
    pub name: Option<String>,
    pub banner_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BoardDBResponse {
    pub id: BoardId,
    pub name: String,
    pub banner_image_url: Option<String>,
    pub organization_id: OrganizationId,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ListCreateDBRequest {
    pub name: String,
    pub position: i64,
    pub board_id: BoardId,
    pub created_by: UserId,
}

#[derive(Debug, Clone, Default)]
pub struct ListUpdateDBRequest {
    pub name: Option<String>,
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ListDBResponse {
    pub id: ListId,
    pub name: String,
    pub position: i64,
    pub board_id: BoardId,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CardCreateDBRequest {
    pub name: String,
    pub position: i64,
    pub description: Option<String>,
    pub list_id: ListId,
    pub created_by: UserId,
}

/// `list_id` moves a card between lists on the same board.
#[derive(Debug, Clone, Default)]
pub struct CardUpdateDBRequest {
    pub name: Option<String>,
    pub position: Option<i64>,
    pub description: Option<String>,
    pub list_id: Option<ListId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CardDBResponse {
    pub id: CardId,
    pub name: String,
    pub position: i64,
    pub description: Option<String>,
    pub list_id: ListId,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
