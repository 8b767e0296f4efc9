//! Database request/response models for organizations, roles and memberships.

use crate::api::models::organizations::OrgRole;
use crate::types::{MembershipId, OrganizationId, RoleId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct OrganizationCreateDBRequest {
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub owner_id: UserId,
}

/// Fields are applied only when `Some`.
#[derive(Debug, Clone, Default)]
pub struct OrganizationUpdateDBRequest {
    pub name: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrganizationDBResponse {
    pub id: OrganizationId,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An organization joined with the caller's role in it, the shape the
/// rendering layer consumes as its `(user, organization[])` view model.
#[derive(Debug, Clone, FromRow)]
pub struct OrganizationWithRoleDBResponse {
    pub id: OrganizationId,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub owner_id: UserId,
    pub role_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct OrganizationRoleDBResponse {
    pub id: RoleId,
    pub name: String,
    pub organization_id: OrganizationId,
}

#[derive(Debug, Clone)]
pub struct MemberAddDBRequest {
    pub organization_id: OrganizationId,
    pub member_id: UserId,
    pub role: OrgRole,
}

#[derive(Debug, Clone, FromRow)]
pub struct MembershipDBResponse {
    pub id: MembershipId,
    pub organization_id: OrganizationId,
    pub member_id: UserId,
    pub member_role_id: RoleId,
}
