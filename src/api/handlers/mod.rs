//! HTTP request handlers for all API endpoints.
//!
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication and authorization checks
//! - Business logic execution via database repositories
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`auth`]: Sign-up, sign-in, sign-out and anti-forgery tokens
//! - [`account`]: The signed-in user's own profile
//! - [`organizations`]: Organization CRUD and memberships
//! - [`boards`]: Boards, lists and cards
//!
//! # Authentication
//!
//! Most handlers require a session; the [`crate::auth::middleware`] module
//! validates the cookie and extractors in [`crate::auth::current_user`] give
//! handlers the authenticated user.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to the right
//! HTTP status code and a JSON error body.

pub mod account;
pub mod auth;
pub mod boards;
pub mod organizations;
