//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Authentication** (`/authentication/*`): sign-up, sign-in, sign-out,
//!   the current user and anti-forgery tokens
//! - **Account** (`/account`): the signed-in user's profile
//! - **Organizations** (`/organizations/*`): organizations, memberships and
//!   their boards
//! - **Boards** (`/boards/*`, `/lists/*`, `/cards/*`): boards, lists and
//!   cards
//!
//! # OpenAPI Documentation
//!
//! All endpoints carry OpenAPI annotations via `utoipa`; the rendered
//! documentation is served at `/docs`.

pub mod handlers;
pub mod models;
