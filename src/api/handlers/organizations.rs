use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        organizations::{
            MemberAddRequest, MembershipResponse, OrgRole, OrganizationCreateRequest, OrganizationResponse,
            OrganizationUpdateRequest, OrganizationWithRoleResponse,
        },
        users::CurrentUser,
    },
    auth::permissions::require_org_role,
    db::{
        errors::DbError,
        handlers::{organizations::Organizations, repository::Repository, users::Users},
        models::organizations::{MemberAddDBRequest, OrganizationCreateDBRequest, OrganizationUpdateDBRequest},
    },
    errors::Error,
    types::OrganizationId,
};

/// Organizations visible to the signed-in user
#[utoipa::path(
    get,
    path = "/organizations",
    tag = "organizations",
    responses(
        (status = 200, description = "Organizations with the caller's role", body = Vec<OrganizationWithRoleResponse>),
        (status = 401, description = "Not signed in"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_organizations(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<OrganizationWithRoleResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    let organizations = Organizations::new(&mut conn).list_for_user(user.id).await?;
    Ok(Json(organizations.into_iter().map(Into::into).collect()))
}

/// Create an organization
#[utoipa::path(
    post,
    path = "/organizations",
    request_body = OrganizationCreateRequest,
    tag = "organizations",
    responses(
        (status = 201, description = "Created organization", body = OrganizationResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Slug already taken"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_organization(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<OrganizationCreateRequest>,
) -> Result<(StatusCode, Json<OrganizationResponse>), Error> {
    request.validate()?;

    let mut tx = state.db.begin().await.map_err(DbError::from)?;

    let organization = Organizations::new(tx.as_mut())
        .create_with_owner(&OrganizationCreateDBRequest {
            name: request.name.trim().to_string(),
            slug: request.effective_slug(),
            logo_url: request.logo_url,
            owner_id: user.id,
        })
        .await?;

    tx.commit().await.map_err(DbError::from)?;

    Ok((StatusCode::CREATED, Json(OrganizationResponse::from(organization))))
}

/// Fetch one organization
#[utoipa::path(
    get,
    path = "/organizations/{id}",
    tag = "organizations",
    params(("id" = uuid::Uuid, Path, description = "Organization id")),
    responses(
        (status = 200, description = "The organization", body = OrganizationResponse),
        (status = 403, description = "Not a member"),
        (status = 404, description = "No such organization"),
    )
)]
#[tracing::instrument(skip_all, fields(organization_id = %id))]
pub async fn get_organization(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<OrganizationId>,
) -> Result<Json<OrganizationResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    require_org_role(&mut conn, id, user.id, OrgRole::Member).await?;

    let organization = Organizations::new(&mut conn).get_by_id(id).await?.ok_or(Error::NotFound {
        resource: "organization".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(OrganizationResponse::from(organization)))
}

/// Update organization settings
#[utoipa::path(
    patch,
    path = "/organizations/{id}",
    request_body = OrganizationUpdateRequest,
    tag = "organizations",
    params(("id" = uuid::Uuid, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Updated organization", body = OrganizationResponse),
        (status = 403, description = "Requires the ADMIN role"),
    )
)]
#[tracing::instrument(skip_all, fields(organization_id = %id))]
pub async fn update_organization(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<OrganizationId>,
    Json(request): Json<OrganizationUpdateRequest>,
) -> Result<Json<OrganizationResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    require_org_role(&mut conn, id, user.id, OrgRole::Admin).await?;

    let organization = Organizations::new(&mut conn)
        .update(
            id,
            &OrganizationUpdateDBRequest {
                name: request.name,
                logo_url: request.logo_url,
            },
        )
        .await?;

    Ok(Json(OrganizationResponse::from(organization)))
}

/// Delete an organization
#[utoipa::path(
    delete,
    path = "/organizations/{id}",
    tag = "organizations",
    params(("id" = uuid::Uuid, Path, description = "Organization id")),
    responses(
        (status = 204, description = "Organization deleted"),
        (status = 403, description = "Requires the ADMIN role"),
    )
)]
#[tracing::instrument(skip_all, fields(organization_id = %id))]
pub async fn delete_organization(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<OrganizationId>,
) -> Result<StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    require_org_role(&mut conn, id, user.id, OrgRole::Admin).await?;

    Organizations::new(&mut conn).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a member by email
#[utoipa::path(
    post,
    path = "/organizations/{id}/members",
    request_body = MemberAddRequest,
    tag = "organizations",
    params(("id" = uuid::Uuid, Path, description = "Organization id")),
    responses(
        (status = 201, description = "Membership created", body = MembershipResponse),
        (status = 403, description = "Requires the ADMIN role"),
        (status = 404, description = "No account with that email"),
        (status = 409, description = "Already a member"),
    )
)]
#[tracing::instrument(skip_all, fields(organization_id = %id))]
pub async fn add_member(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<OrganizationId>,
    Json(request): Json<MemberAddRequest>,
) -> Result<(StatusCode, Json<MembershipResponse>), Error> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    require_org_role(&mut conn, id, user.id, OrgRole::Admin).await?;

    let email = request.email.trim().to_lowercase();
    let member = Users::new(&mut conn).get_by_email(&email).await?.ok_or(Error::NotFound {
        resource: "user".to_string(),
        id: email.clone(),
    })?;

    let membership = Organizations::new(&mut conn)
        .add_member(&MemberAddDBRequest {
            organization_id: id,
            member_id: member.id,
            role: request.role,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MembershipResponse {
            id: membership.id,
            organization_id: membership.organization_id,
            member_id: membership.member_id,
            member_role_id: membership.member_role_id,
        }),
    ))
}
