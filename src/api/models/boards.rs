//! API models for boards, lists and cards.

use crate::db::models::boards::{BoardDBResponse, CardDBResponse, ListDBResponse};
use crate::errors::{Error, FieldError, Result};
use crate::types::{BoardId, CardId, ListId, OrganizationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            errors: vec![FieldError {
                field: "name".to_string(),
                message: "Name is required".to_string(),
            }],
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BoardCreateRequest {
    pub name: String,
    #[serde(default)]
    pub banner_image_url: Option<String>,
}

impl BoardCreateRequest {
    pub fn validate(&self) -> Result<()> {
        require_name(&self.name)
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BoardUpdateRequest {
    pub name: Option<String>,
    pub banner_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BoardResponse {
    #[schema(value_type = uuid::Uuid)]
    pub id: BoardId,
    pub name: String,
    pub banner_image_url: Option<String>,
    #[schema(value_type = uuid::Uuid)]
    pub organization_id: OrganizationId,
    #[schema(value_type = uuid::Uuid)]
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BoardDBResponse> for BoardResponse {
    fn from(board: BoardDBResponse) -> Self {
        Self {
            id: board.id,
            name: board.name,
            banner_image_url: board.banner_image_url,
            organization_id: board.organization_id,
            created_by: board.created_by,
            created_at: board.created_at,
            updated_at: board.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ListCreateRequest {
    pub name: String,
    pub position: i64,
}

impl ListCreateRequest {
    pub fn validate(&self) -> Result<()> {
        require_name(&self.name)
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ListUpdateRequest {
    pub name: Option<String>,
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListResponse {
    #[schema(value_type = uuid::Uuid)]
    pub id: ListId,
    pub name: String,
    pub position: i64,
    #[schema(value_type = uuid::Uuid)]
    pub board_id: BoardId,
    #[schema(value_type = uuid::Uuid)]
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ListDBResponse> for ListResponse {
    fn from(list: ListDBResponse) -> Self {
        Self {
            id: list.id,
            name: list.name,
            position: list.position,
            board_id: list.board_id,
            created_by: list.created_by,
            created_at: list.created_at,
            updated_at: list.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CardCreateRequest {
    pub name: String,
    pub position: i64,
    #[serde(default)]
    pub description: Option<String>,
}

impl CardCreateRequest {
    pub fn validate(&self) -> Result<()> {
        require_name(&self.name)
    }
}

/// `list_id` moves a card to another list.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CardUpdateRequest {
    pub name: Option<String>,
    pub position: Option<i64>,
    pub description: Option<String>,
    #[schema(value_type = uuid::Uuid)]
    pub list_id: Option<ListId>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CardResponse {
    #[schema(value_type = uuid::Uuid)]
    pub id: CardId,
    pub name: String,
    pub position: i64,
    pub description: Option<String>,
    #[schema(value_type = uuid::Uuid)]
    pub list_id: ListId,
    #[schema(value_type = uuid::Uuid)]
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CardDBResponse> for CardResponse {
    fn from(card: CardDBResponse) -> Self {
        Self {
            id: card.id,
            name: card.name,
            position: card.position,
            description: card.description,
            list_id: card.list_id,
            created_by: card.created_by,
            created_at: card.created_at,
            updated_at: card.updated_at,
        }
    }
}
