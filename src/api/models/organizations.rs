//! API models for organizations, roles and memberships.

use crate::db::models::organizations::{OrganizationDBResponse, OrganizationWithRoleDBResponse};
use crate::errors::{Error, FieldError, Result};
use crate::types::{MembershipId, OrganizationId, RoleId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An organization-scoped role. Ordered by privilege, so comparisons like
/// `role >= OrgRole::Admin` read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrgRole {
    Member,
    Admin,
}

impl OrgRole {
    /// The role name as stored in `organization_roles`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Member => "MEMBER",
            OrgRole::Admin => "ADMIN",
        }
    }

    /// Parse a stored role name. Unknown names return `None`; callers decide
    /// what level of access those grant.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "MEMBER" => Some(OrgRole::Member),
            "ADMIN" => Some(OrgRole::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrgRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrganizationCreateRequest {
    pub name: String,
    /// URL-safe identifier; derived from the name when absent.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// Turn a display name into a URL-safe slug.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

impl OrganizationCreateRequest {
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError {
                field: "name".to_string(),
                message: "Name is required".to_string(),
            });
        }
        let slug = self.effective_slug();
        if slug.is_empty() {
            errors.push(FieldError {
                field: "slug".to_string(),
                message: "Slug must contain at least one letter or digit".to_string(),
            });
        }
        if errors.is_empty() { Ok(()) } else { Err(Error::Validation { errors }) }
    }

    pub fn effective_slug(&self) -> String {
        match &self.slug {
            Some(slug) => slugify(slug),
            None => slugify(&self.name),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct OrganizationUpdateRequest {
    pub name: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrganizationResponse {
    #[schema(value_type = uuid::Uuid)]
    pub id: OrganizationId,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    #[schema(value_type = uuid::Uuid)]
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrganizationDBResponse> for OrganizationResponse {
    fn from(org: OrganizationDBResponse) -> Self {
        Self {
            id: org.id,
            name: org.name,
            slug: org.slug,
            logo_url: org.logo_url,
            owner_id: org.owner_id,
            created_at: org.created_at,
            updated_at: org.updated_at,
        }
    }
}

/// An organization together with the caller's role in it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrganizationWithRoleResponse {
    #[schema(value_type = uuid::Uuid)]
    pub id: OrganizationId,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    #[schema(value_type = uuid::Uuid)]
    pub owner_id: UserId,
    pub role: String,
}

impl From<OrganizationWithRoleDBResponse> for OrganizationWithRoleResponse {
    fn from(org: OrganizationWithRoleDBResponse) -> Self {
        Self {
            id: org.id,
            name: org.name,
            slug: org.slug,
            logo_url: org.logo_url,
            owner_id: org.owner_id,
            role: org.role_name,
        }
    }
}

/// Add a user to an organization by email.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MemberAddRequest {
    pub email: String,
    pub role: OrgRole,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MembershipResponse {
    #[schema(value_type = uuid::Uuid)]
    pub id: MembershipId,
    #[schema(value_type = uuid::Uuid)]
    pub organization_id: OrganizationId,
    #[schema(value_type = uuid::Uuid)]
    pub member_id: UserId,
    #[schema(value_type = uuid::Uuid)]
    pub member_role_id: RoleId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(OrgRole::Admin > OrgRole::Member);
        assert_eq!(OrgRole::from_name("ADMIN"), Some(OrgRole::Admin));
        assert_eq!(OrgRole::from_name("MEMBER"), Some(OrgRole::Member));
        assert_eq!(OrgRole::from_name("viewer"), None);
    }

    #[test]
    fn test_role_serde_names() {
        assert_eq!(serde_json::to_string(&OrgRole::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(serde_json::from_str::<OrgRole>("\"MEMBER\"").unwrap(), OrgRole::Member);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Acme Corp"), "acme-corp");
        assert_eq!(slugify("  Already--slugged!  "), "already-slugged");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_create_request_validation() {
        let request = OrganizationCreateRequest {
            name: "Acme Corp".to_string(),
            slug: None,
            logo_url: None,
        };
        assert!(request.validate().is_ok());
        assert_eq!(request.effective_slug(), "acme-corp");

        let bad = OrganizationCreateRequest {
            name: "  ".to_string(),
            slug: None,
            logo_url: None,
        };
        assert!(bad.validate().is_err());
    }
}
