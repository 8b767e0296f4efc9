//! OpenAPI documentation configuration.
//!
//! One document covers the whole API surface; it is served with Scalar at
//! `/docs`.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Corkboard API",
        description = "Multi-tenant project boards: organizations, boards, lists and cards,\n\
            with cookie-session authentication and per-organization roles.",
    ),
    paths(
        api::handlers::auth::sign_up,
        api::handlers::auth::sign_in,
        api::handlers::auth::sign_out,
        api::handlers::auth::me,
        api::handlers::auth::csrf_token,
        api::handlers::account::get_account,
        api::handlers::account::update_account,
        api::handlers::account::delete_account,
        api::handlers::organizations::list_organizations,
        api::handlers::organizations::create_organization,
        api::handlers::organizations::get_organization,
        api::handlers::organizations::update_organization,
        api::handlers::organizations::delete_organization,
        api::handlers::organizations::add_member,
        api::handlers::boards::list_boards,
        api::handlers::boards::create_board,
        api::handlers::boards::get_board,
        api::handlers::boards::update_board,
        api::handlers::boards::delete_board,
        api::handlers::boards::list_lists,
        api::handlers::boards::create_list,
        api::handlers::boards::update_list,
        api::handlers::boards::delete_list,
        api::handlers::boards::list_cards,
        api::handlers::boards::create_card,
        api::handlers::boards::update_card,
        api::handlers::boards::delete_card,
    ),
    components(schemas(
        api::models::auth::SignUpRequest,
        api::models::auth::SignInRequest,
        api::models::auth::AuthResponse,
        api::models::auth::AuthSuccessResponse,
        api::models::auth::CsrfTokenResponse,
        api::models::users::CurrentUser,
        api::models::users::UserResponse,
        api::models::users::AccountUpdateRequest,
        api::models::organizations::OrgRole,
        api::models::organizations::OrganizationCreateRequest,
        api::models::organizations::OrganizationUpdateRequest,
        api::models::organizations::OrganizationResponse,
        api::models::organizations::OrganizationWithRoleResponse,
        api::models::organizations::MemberAddRequest,
        api::models::organizations::MembershipResponse,
        api::models::boards::BoardCreateRequest,
        api::models::boards::BoardUpdateRequest,
        api::models::boards::BoardResponse,
        api::models::boards::ListCreateRequest,
        api::models::boards::ListUpdateRequest,
        api::models::boards::ListResponse,
        api::models::boards::CardCreateRequest,
        api::models::boards::CardUpdateRequest,
        api::models::boards::CardResponse,
    )),
    tags(
        (name = "authentication", description = "Sign-up, sign-in, sign-out and anti-forgery tokens"),
        (name = "account", description = "The signed-in user's profile"),
        (name = "organizations", description = "Organizations and memberships"),
        (name = "boards", description = "Boards, lists and cards"),
    )
)]
pub struct ApiDoc;
