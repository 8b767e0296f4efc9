//! Database repository for organizations, their roles and memberships.

use crate::api::models::organizations::OrgRole;
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::organizations::{
        MemberAddDBRequest, MembershipDBResponse, OrganizationCreateDBRequest, OrganizationDBResponse,
        OrganizationRoleDBResponse, OrganizationUpdateDBRequest, OrganizationWithRoleDBResponse,
    },
};
use crate::types::{OrganizationId, UserId, abbrev_uuid};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct OrganizationFilter {
    pub skip: i64,
    pub limit: i64,
}

impl OrganizationFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

pub struct Organizations<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Organizations<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Creates an organization together with its ADMIN and MEMBER roles and
    /// an ADMIN membership for the owner.
    ///
    /// Run this on a transaction connection: if any of the four inserts
    /// fails, the caller's rollback must discard the earlier ones.
    #[instrument(skip(self, request), fields(slug = %request.slug, owner_id = %abbrev_uuid(&request.owner_id)), err)]
    pub async fn create_with_owner(
        &mut self,
        request: &OrganizationCreateDBRequest,
    ) -> Result<OrganizationDBResponse> {
        let organization = self.create(request).await?;

        let admin_role = self.create_role(organization.id, OrgRole::Admin.as_str()).await?;
        self.create_role(organization.id, OrgRole::Member.as_str()).await?;

        let now = Utc::now();
        sqlx::query(
            "INSERT INTO organization_members (id, organization_id, member_id, member_role_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(organization.id)
        .bind(request.owner_id)
        .bind(admin_role.id)
        .bind(now)
        .bind(now)
        .execute(&mut *self.db)
        .await?;

        Ok(organization)
    }

    async fn create_role(&mut self, organization_id: OrganizationId, name: &str) -> Result<OrganizationRoleDBResponse> {
        let now = Utc::now();
        let role = sqlx::query_as::<_, OrganizationRoleDBResponse>(
            r#"
            INSERT INTO organization_roles (id, name, organization_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, name, organization_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(organization_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(role)
    }

    #[instrument(skip(self, slug), fields(slug = %slug), err)]
    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Option<OrganizationDBResponse>> {
        let organization = sqlx::query_as::<_, OrganizationDBResponse>(
            "SELECT id, name, slug, logo_url, owner_id, created_at, updated_at FROM organizations WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(organization)
    }

    /// Every organization the user can see, each paired with their role name.
    /// Owners without a membership row still appear, as ADMIN.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_for_user(&mut self, user_id: UserId) -> Result<Vec<OrganizationWithRoleDBResponse>> {
        let organizations = sqlx::query_as::<_, OrganizationWithRoleDBResponse>(
            r#"
            SELECT o.id, o.name, o.slug, o.logo_url, o.owner_id, r.name AS role_name, o.created_at
            FROM organizations o
            JOIN organization_members m ON m.organization_id = o.id
            JOIN organization_roles r ON r.id = m.member_role_id
            WHERE m.member_id = ?
            UNION
            SELECT o.id, o.name, o.slug, o.logo_url, o.owner_id, 'ADMIN' AS role_name, o.created_at
            FROM organizations o
            WHERE o.owner_id = ?
              AND NOT EXISTS (
                  SELECT 1 FROM organization_members m
                  WHERE m.organization_id = o.id AND m.member_id = ?
              )
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(organizations)
    }

    /// Resolves the user's effective role in an organization.
    ///
    /// The owner is ADMIN regardless of membership rows. Otherwise the most
    /// privileged membership role wins; role names that are neither ADMIN
    /// nor MEMBER count as member-level access.
    #[instrument(skip(self), fields(organization_id = %abbrev_uuid(&organization_id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn resolve_role(
        &mut self,
        organization_id: OrganizationId,
        user_id: UserId,
    ) -> Result<Option<OrgRole>> {
        let owner_id = sqlx::query_scalar::<_, UserId>("SELECT owner_id FROM organizations WHERE id = ?")
            .bind(organization_id)
            .fetch_optional(&mut *self.db)
            .await?;

        let Some(owner_id) = owner_id else {
            return Err(DbError::NotFound);
        };
        if owner_id == user_id {
            return Ok(Some(OrgRole::Admin));
        }

        let role_names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT r.name
            FROM organization_members m
            JOIN organization_roles r ON r.id = m.member_role_id
            WHERE m.organization_id = ? AND m.member_id = ?
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(role_names
            .iter()
            .map(|name| OrgRole::from_name(name).unwrap_or(OrgRole::Member))
            .max())
    }

    /// Adds a user to an organization under a named role. Duplicate
    /// memberships surface as unique violations.
    #[instrument(skip(self, request), fields(organization_id = %abbrev_uuid(&request.organization_id), member_id = %abbrev_uuid(&request.member_id)), err)]
    pub async fn add_member(&mut self, request: &MemberAddDBRequest) -> Result<MembershipDBResponse> {
        let role = sqlx::query_as::<_, OrganizationRoleDBResponse>(
            "SELECT id, name, organization_id FROM organization_roles WHERE organization_id = ? AND name = ?",
        )
        .bind(request.organization_id)
        .bind(request.role.as_str())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        let now = Utc::now();
        let membership = sqlx::query_as::<_, MembershipDBResponse>(
            r#"
            INSERT INTO organization_members (id, organization_id, member_id, member_role_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, organization_id, member_id, member_role_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.organization_id)
        .bind(request.member_id)
        .bind(role.id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(membership)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Organizations<'c> {
    type CreateRequest = OrganizationCreateDBRequest;
    type UpdateRequest = OrganizationUpdateDBRequest;
    type Response = OrganizationDBResponse;
    type Id = OrganizationId;
    type Filter = OrganizationFilter;

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let now = Utc::now();
        let organization = sqlx::query_as::<_, OrganizationDBResponse>(
            r#"
            INSERT INTO organizations (id, name, slug, logo_url, owner_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, name, slug, logo_url, owner_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.slug)
        .bind(&request.logo_url)
        .bind(request.owner_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(organization)
    }

    #[instrument(skip(self), fields(organization_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let organization = sqlx::query_as::<_, OrganizationDBResponse>(
            "SELECT id, name, slug, logo_url, owner_id, created_at, updated_at FROM organizations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(organization)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let organizations = sqlx::query_as::<_, OrganizationDBResponse>(
            "SELECT id, name, slug, logo_url, owner_id, created_at, updated_at FROM organizations ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(organizations)
    }

    #[instrument(skip(self), fields(organization_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(organization_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let organization = sqlx::query_as::<_, OrganizationDBResponse>(
            r#"
            UPDATE organizations SET
                name = COALESCE(?, name),
                logo_url = COALESCE(?, logo_url),
                updated_at = ?
            WHERE id = ?
            RETURNING id, name, slug, logo_url, owner_id, created_at, updated_at
            "#,
        )
        .bind(&request.name)
        .bind(&request.logo_url)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(organization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::users::Users;
    use crate::db::models::users::UserCreateDBRequest;
    use sqlx::SqlitePool;

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

    fn org_request(slug: &str, owner_id: UserId) -> OrganizationCreateDBRequest {
        OrganizationCreateDBRequest {
            name: slug.to_string(),
            slug: slug.to_string(),
            logo_url: None,
            owner_id,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_with_owner_seeds_roles_and_membership(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let owner = seed_user(&mut conn, "owner@example.com").await;

        let org = Organizations::new(&mut conn)
            .create_with_owner(&org_request("acme", owner))
            .await
            .unwrap();

        let role_names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM organization_roles WHERE organization_id = ? ORDER BY name",
        )
        .bind(org.id)
        .fetch_all(&mut *conn)
        .await
        .unwrap();
        assert_eq!(role_names, vec!["ADMIN".to_string(), "MEMBER".to_string()]);

        let role = Organizations::new(&mut conn).resolve_role(org.id, owner).await.unwrap();
        assert_eq!(role, Some(OrgRole::Admin));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_with_owner_rolls_back_on_failure(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let owner = seed_user(&mut conn, "owner@example.com").await;

        let mut tx = pool.begin().await.unwrap();
        Organizations::new(tx.as_mut())
            .create_with_owner(&org_request("acme", owner))
            .await
            .unwrap();
        // Dropping without commit rolls back: the org, both roles and the
        // owner membership must all vanish together.
        drop(tx);

        let mut repo = Organizations::new(&mut conn);
        assert!(repo.get_by_slug("acme").await.unwrap().is_none());
        let roles = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM organization_roles")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(roles, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_slug_rejected(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let owner = seed_user(&mut conn, "owner@example.com").await;

        let mut repo = Organizations::new(&mut conn);
        repo.create_with_owner(&org_request("taken", owner)).await.unwrap();
        let err = repo.create_with_owner(&org_request("taken", owner)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_resolve_role_prefers_most_privileged(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let owner = seed_user(&mut conn, "owner@example.com").await;
        let member = seed_user(&mut conn, "member@example.com").await;

        let mut repo = Organizations::new(&mut conn);
        let org = repo.create_with_owner(&org_request("acme", owner)).await.unwrap();

        assert_eq!(repo.resolve_role(org.id, member).await.unwrap(), None);

        repo.add_member(&MemberAddDBRequest {
            organization_id: org.id,
            member_id: member,
            role: OrgRole::Member,
        })
        .await
        .unwrap();
        assert_eq!(repo.resolve_role(org.id, member).await.unwrap(), Some(OrgRole::Member));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_owner_without_membership_is_admin(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let owner = seed_user(&mut conn, "owner@example.com").await;

        let mut repo = Organizations::new(&mut conn);
        let org = repo.create_with_owner(&org_request("acme", owner)).await.unwrap();

        sqlx::query("DELETE FROM organization_members WHERE organization_id = ?")
            .bind(org.id)
            .execute(&mut *conn)
            .await
            .unwrap();

        let mut repo = Organizations::new(&mut conn);
        assert_eq!(repo.resolve_role(org.id, owner).await.unwrap(), Some(OrgRole::Admin));

        let listed = repo.list_for_user(owner).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].role_name, "ADMIN");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_membership_rejected(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let owner = seed_user(&mut conn, "owner@example.com").await;
        let member = seed_user(&mut conn, "member@example.com").await;

        let mut repo = Organizations::new(&mut conn);
        let org = repo.create_with_owner(&org_request("acme", owner)).await.unwrap();

        let request = MemberAddDBRequest {
            organization_id: org.id,
            member_id: member,
            role: OrgRole::Member,
        };
        repo.add_member(&request).await.unwrap();
        let err = repo.add_member(&request).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_for_user_membership_and_ownership(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let alice = seed_user(&mut conn, "alice@example.com").await;
        let bob = seed_user(&mut conn, "bob@example.com").await;

        let mut repo = Organizations::new(&mut conn);
        let owned = repo.create_with_owner(&org_request("alice-org", alice)).await.unwrap();
        let joined = repo.create_with_owner(&org_request("bob-org", bob)).await.unwrap();
        repo.add_member(&MemberAddDBRequest {
            organization_id: joined.id,
            member_id: alice,
            role: OrgRole::Member,
        })
        .await
        .unwrap();

        let listed = repo.list_for_user(alice).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|o| o.id == owned.id && o.role_name == "ADMIN"));
        assert!(listed.iter().any(|o| o.id == joined.id && o.role_name == "MEMBER"));
    }
}
