use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sqlx::SqliteConnection;

use crate::{
    AppState,
    api::models::{
        boards::{
            BoardCreateRequest, BoardResponse, BoardUpdateRequest, CardCreateRequest, CardResponse, CardUpdateRequest,
            ListCreateRequest, ListResponse, ListUpdateRequest,
        },
        organizations::OrgRole,
        users::CurrentUser,
    },
    auth::permissions::require_org_role,
    db::{
        errors::DbError,
        handlers::{
            boards::{BoardFilter, Boards, CardFilter, Cards, ListFilter, Lists},
            repository::Repository,
        },
        models::boards::{
            BoardCreateDBRequest, BoardUpdateDBRequest, CardCreateDBRequest, CardUpdateDBRequest, ListCreateDBRequest,
            ListUpdateDBRequest,
        },
    },
    errors::{Error, Result},
    types::{BoardId, CardId, ListId, OrganizationId, UserId},
};

fn not_found(resource: &str, id: impl ToString) -> Error {
    Error::NotFound {
        resource: resource.to_string(),
        id: id.to_string(),
    }
}

/// Membership gate for a board, via its organization.
async fn require_board_access(db: &mut SqliteConnection, board_id: BoardId, user_id: UserId) -> Result<OrganizationId> {
    let board = Boards::new(db).get_by_id(board_id).await?.ok_or_else(|| not_found("board", board_id))?;
    require_org_role(db, board.organization_id, user_id, OrgRole::Member).await?;
    Ok(board.organization_id)
}

async fn require_list_access(db: &mut SqliteConnection, list_id: ListId, user_id: UserId) -> Result<()> {
    let organization_id = Lists::new(db)
        .organization_of(list_id)
        .await?
        .ok_or_else(|| not_found("list", list_id))?;
    require_org_role(db, organization_id, user_id, OrgRole::Member).await?;
    Ok(())
}

async fn require_card_access(db: &mut SqliteConnection, card_id: CardId, user_id: UserId) -> Result<()> {
    let organization_id = Cards::new(db)
        .organization_of(card_id)
        .await?
        .ok_or_else(|| not_found("card", card_id))?;
    require_org_role(db, organization_id, user_id, OrgRole::Member).await?;
    Ok(())
}

/// Boards of an organization
#[utoipa::path(
    get,
    path = "/organizations/{id}/boards",
    tag = "boards",
    params(("id" = uuid::Uuid, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Boards in the organization", body = Vec<BoardResponse>),
        (status = 403, description = "Not a member"),
    )
)]
#[tracing::instrument(skip_all, fields(organization_id = %id))]
pub async fn list_boards(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<OrganizationId>,
) -> Result<Json<Vec<BoardResponse>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    require_org_role(&mut conn, id, user.id, OrgRole::Member).await?;

    let boards = Boards::new(&mut conn).list(&BoardFilter { organization_id: id }).await?;
    Ok(Json(boards.into_iter().map(Into::into).collect()))
}

/// Create a board
#[utoipa::path(
    post,
    path = "/organizations/{id}/boards",
    request_body = BoardCreateRequest,
    tag = "boards",
    params(("id" = uuid::Uuid, Path, description = "Organization id")),
    responses(
        (status = 201, description = "Created board", body = BoardResponse),
        (status = 403, description = "Not a member"),
    )
)]
#[tracing::instrument(skip_all, fields(organization_id = %id))]
pub async fn create_board(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<OrganizationId>,
    Json(request): Json<BoardCreateRequest>,
) -> Result<(StatusCode, Json<BoardResponse>)> {
    request.validate()?;
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    require_org_role(&mut conn, id, user.id, OrgRole::Member).await?;

    let board = Boards::new(&mut conn)
        .create(&BoardCreateDBRequest {
            name: request.name.trim().to_string(),
            banner_image_url: request.banner_image_url,
            organization_id: id,
            created_by: user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(BoardResponse::from(board))))
}

/// Fetch one board
#[utoipa::path(
    get,
    path = "/boards/{id}",
    tag = "boards",
    params(("id" = uuid::Uuid, Path, description = "Board id")),
    responses(
        (status = 200, description = "The board", body = BoardResponse),
        (status = 403, description = "Not a member"),
        (status = 404, description = "No such board"),
    )
)]
#[tracing::instrument(skip_all, fields(board_id = %id))]
pub async fn get_board(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<BoardId>,
) -> Result<Json<BoardResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    require_board_access(&mut conn, id, user.id).await?;

    let board = Boards::new(&mut conn).get_by_id(id).await?.ok_or_else(|| not_found("board", id))?;
    Ok(Json(BoardResponse::from(board)))
}

/// Update a board
#[utoipa::path(
    patch,
    path = "/boards/{id}",
    request_body = BoardUpdateRequest,
    tag = "boards",
    params(("id" = uuid::Uuid, Path, description = "Board id")),
    responses(
        (status = 200, description = "Updated board", body = BoardResponse),
        (status = 403, description = "Not a member"),
    )
)]
#[tracing::instrument(skip_all, fields(board_id = %id))]
pub async fn update_board(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<BoardId>,
    Json(request): Json<BoardUpdateRequest>,
) -> Result<Json<BoardResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    require_board_access(&mut conn, id, user.id).await?;

    let board = Boards::new(&mut conn)
        .update(
            id,
            &BoardUpdateDBRequest {
                name: request.name,
                banner_image_url: request.banner_image_url,
            },
        )
        .await?;

    Ok(Json(BoardResponse::from(board)))
}

/// Delete a board
#[utoipa::path(
    delete,
    path = "/boards/{id}",
    tag = "boards",
    params(("id" = uuid::Uuid, Path, description = "Board id")),
    responses(
        (status = 204, description = "Board deleted"),
        (status = 403, description = "Not a member"),
    )
)]
#[tracing::instrument(skip_all, fields(board_id = %id))]
pub async fn delete_board(State(state): State<AppState>, user: CurrentUser, Path(id): Path<BoardId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    require_board_access(&mut conn, id, user.id).await?;

    Boards::new(&mut conn).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Lists of a board, in position order
#[utoipa::path(
    get,
    path = "/boards/{id}/lists",
    tag = "boards",
    params(("id" = uuid::Uuid, Path, description = "Board id")),
    responses(
        (status = 200, description = "Lists on the board", body = Vec<ListResponse>),
        (status = 403, description = "Not a member"),
    )
)]
#[tracing::instrument(skip_all, fields(board_id = %id))]
pub async fn list_lists(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<BoardId>,
) -> Result<Json<Vec<ListResponse>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    require_board_access(&mut conn, id, user.id).await?;

    let lists = Lists::new(&mut conn).list(&ListFilter { board_id: id }).await?;
    Ok(Json(lists.into_iter().map(Into::into).collect()))
}

/// Create a list on a board
#[utoipa::path(
    post,
    path = "/boards/{id}/lists",
    request_body = ListCreateRequest,
    tag = "boards",
    params(("id" = uuid::Uuid, Path, description = "Board id")),
    responses(
        (status = 201, description = "Created list", body = ListResponse),
        (status = 403, description = "Not a member"),
    )
)]
#[tracing::instrument(skip_all, fields(board_id = %id))]
pub async fn create_list(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<BoardId>,
    Json(request): Json<ListCreateRequest>,
) -> Result<(StatusCode, Json<ListResponse>)> {
    request.validate()?;
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    require_board_access(&mut conn, id, user.id).await?;

    let list = Lists::new(&mut conn)
        .create(&ListCreateDBRequest {
            name: request.name.trim().to_string(),
            position: request.position,
            board_id: id,
            created_by: user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ListResponse::from(list))))
}

/// Update a list
#[utoipa::path(
    patch,
    path = "/lists/{id}",
    request_body = ListUpdateRequest,
    tag = "boards",
    params(("id" = uuid::Uuid, Path, description = "List id")),
    responses(
        (status = 200, description = "Updated list", body = ListResponse),
        (status = 403, description = "Not a member"),
    )
)]
#[tracing::instrument(skip_all, fields(list_id = %id))]
pub async fn update_list(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ListId>,
    Json(request): Json<ListUpdateRequest>,
) -> Result<Json<ListResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    require_list_access(&mut conn, id, user.id).await?;

    let list = Lists::new(&mut conn)
        .update(
            id,
            &ListUpdateDBRequest {
                name: request.name,
                position: request.position,
            },
        )
        .await?;

    Ok(Json(ListResponse::from(list)))
}

/// Delete a list
#[utoipa::path(
    delete,
    path = "/lists/{id}",
    tag = "boards",
    params(("id" = uuid::Uuid, Path, description = "List id")),
    responses(
        (status = 204, description = "List deleted"),
        (status = 403, description = "Not a member"),
    )
)]
#[tracing::instrument(skip_all, fields(list_id = %id))]
pub async fn delete_list(State(state): State<AppState>, user: CurrentUser, Path(id): Path<ListId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    require_list_access(&mut conn, id, user.id).await?;

    Lists::new(&mut conn).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cards of a list, in position order
#[utoipa::path(
    get,
    path = "/lists/{id}/cards",
    tag = "boards",
    params(("id" = uuid::Uuid, Path, description = "List id")),
    responses(
        (status = 200, description = "Cards in the list", body = Vec<CardResponse>),
        (status = 403, description = "Not a member"),
    )
)]
#[tracing::instrument(skip_all, fields(list_id = %id))]
pub async fn list_cards(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ListId>,
) -> Result<Json<Vec<CardResponse>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    require_list_access(&mut conn, id, user.id).await?;

    let cards = Cards::new(&mut conn).list(&CardFilter { list_id: id }).await?;
    Ok(Json(cards.into_iter().map(Into::into).collect()))
}

/// Create a card in a list
#[utoipa::path(
    post,
    path = "/lists/{id}/cards",
    request_body = CardCreateRequest,
    tag = "boards",
    params(("id" = uuid::Uuid, Path, description = "List id")),
    responses(
        (status = 201, description = "Created card", body = CardResponse),
        (status = 403, description = "Not a member"),
    )
)]
#[tracing::instrument(skip_all, fields(list_id = %id))]
pub async fn create_card(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ListId>,
    Json(request): Json<CardCreateRequest>,
) -> Result<(StatusCode, Json<CardResponse>)> {
    request.validate()?;
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    require_list_access(&mut conn, id, user.id).await?;

    let card = Cards::new(&mut conn)
        .create(&CardCreateDBRequest {
            name: request.name.trim().to_string(),
            position: request.position,
            description: request.description,
            list_id: id,
            created_by: user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CardResponse::from(card))))
}

/// Update a card; `list_id` moves it to another list
#[utoipa::path(
    patch,
    path = "/cards/{id}",
    request_body = CardUpdateRequest,
    tag = "boards",
    params(("id" = uuid::Uuid, Path, description = "Card id")),
    responses(
        (status = 200, description = "Updated card", body = CardResponse),
        (status = 403, description = "Not a member"),
    )
)]
#[tracing::instrument(skip_all, fields(card_id = %id))]
pub async fn update_card(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<CardId>,
    Json(request): Json<CardUpdateRequest>,
) -> Result<Json<CardResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    require_card_access(&mut conn, id, user.id).await?;

    // A move target must sit in an organization the user can already see.
    if let Some(target_list) = request.list_id {
        require_list_access(&mut conn, target_list, user.id).await?;
    }

    let card = Cards::new(&mut conn)
        .update(
            id,
            &CardUpdateDBRequest {
                name: request.name,
                position: request.position,
                description: request.description,
                list_id: request.list_id,
            },
        )
        .await?;

    Ok(Json(CardResponse::from(card)))
}

/// Delete a card
#[utoipa::path(
    delete,
    path = "/cards/{id}",
    tag = "boards",
    params(("id" = uuid::Uuid, Path, description = "Card id")),
    responses(
        (status = 204, description = "Card deleted"),
        (status = 403, description = "Not a member"),
    )
)]
#[tracing::instrument(skip_all, fields(card_id = %id))]
pub async fn delete_card(State(state): State<AppState>, user: CurrentUser, Path(id): Path<CardId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    require_card_access(&mut conn, id, user.id).await?;

    Cards::new(&mut conn).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
