//! Authentication and authorization.
//!
//! # Authentication
//!
//! Browser-based authentication with opaque server-side sessions:
//! - Users sign in via `/authentication/sign-in` with email/password
//! - The session token is stored in a secure, HTTP-only cookie
//! - Session records live in the database with a two-tier expiry: an active
//!   window that needs no writes, and an idle window during which the next
//!   request renews the session in place
//! - Expired sessions are deleted lazily on their next presentation
//!
//! Mutating requests additionally carry an anti-forgery token pair (signed
//! cookie plus request header); see [`csrf`].
//!
//! # Authorization
//!
//! Access control is organization-scoped:
//! - **Roles**: per-organization ADMIN and MEMBER roles
//! - **Ownership**: the organization owner always counts as ADMIN
//!
//! See [`permissions`] for the role gate used by handlers.
//!
//! # Modules
//!
//! - [`current_user`]: Extractors for the authenticated user in handlers
//! - [`middleware`]: Per-request session validation and cookie renewal
//! - [`password`]: Password hashing and verification using Argon2
//! - [`permissions`]: Organization role checks
//! - [`session`]: The session state machine and cookie plumbing
//! - [`csrf`]: Signed double-submit anti-forgery tokens

pub mod csrf;
pub mod current_user;
pub mod middleware;
pub mod password;
pub mod permissions;
pub mod session;
