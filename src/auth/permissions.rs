//! Organization role checks.

use crate::{
    api::models::organizations::OrgRole,
    db::handlers::organizations::Organizations,
    errors::{Error, Result},
    types::{OrganizationId, UserId},
};
use sqlx::SqliteConnection;
use tracing::instrument;

/// Require the user to hold at least `required` in the organization.
///
/// Returns the user's effective role so handlers can branch on it. A user
/// with no role at all gets the same error as one whose role is too low, so
/// outsiders cannot probe which organizations exist.
#[instrument(skip(db), err)]
pub async fn require_org_role(
    db: &mut SqliteConnection,
    organization_id: OrganizationId,
    user_id: UserId,
    required: OrgRole,
) -> Result<OrgRole> {
    let role = Organizations::new(db).resolve_role(organization_id, user_id).await?;

    match role {
        Some(role) if role >= required => Ok(role),
        _ => Err(Error::InsufficientRole {
            required,
            organization: organization_id.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::repository::Repository;
    use crate::db::handlers::users::Users;
    use crate::db::models::organizations::{MemberAddDBRequest, OrganizationCreateDBRequest};
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

    #[sqlx::test]
    #[test_log::test]
    async fn test_member_blocked_from_admin_actions(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let owner = seed_user(&mut conn, "owner@example.com").await;
        let member = seed_user(&mut conn, "member@example.com").await;

        let org = Organizations::new(&mut conn)
            .create_with_owner(&OrganizationCreateDBRequest {
                name: "Acme".to_string(),
                slug: "acme".to_string(),
                logo_url: None,
                owner_id: owner,
            })
            .await
            .unwrap();
        Organizations::new(&mut conn)
            .add_member(&MemberAddDBRequest {
                organization_id: org.id,
                member_id: member,
                role: OrgRole::Member,
            })
            .await
            .unwrap();

        assert_eq!(
            require_org_role(&mut conn, org.id, member, OrgRole::Member).await.unwrap(),
            OrgRole::Member
        );
        let err = require_org_role(&mut conn, org.id, member, OrgRole::Admin).await.unwrap_err();
        assert_eq!(err.status_code().as_u16(), 403);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_outsider_and_low_role_get_same_error(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let owner = seed_user(&mut conn, "owner@example.com").await;
        let outsider = seed_user(&mut conn, "outsider@example.com").await;

        let org = Organizations::new(&mut conn)
            .create_with_owner(&OrganizationCreateDBRequest {
                name: "Acme".to_string(),
                slug: "acme".to_string(),
                logo_url: None,
                owner_id: owner,
            })
            .await
            .unwrap();

        let err = require_org_role(&mut conn, org.id, outsider, OrgRole::Member).await.unwrap_err();
        assert_eq!(err.status_code().as_u16(), 403);

        assert_eq!(
            require_org_role(&mut conn, org.id, owner, OrgRole::Admin).await.unwrap(),
            OrgRole::Admin
        );
    }
}
