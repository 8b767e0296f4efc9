//! Common type definitions.
//!
//! All entity IDs are UUIDs wrapped in type aliases. Session ids are the one
//! exception: they are opaque random strings handed to browsers, so they stay
//! `String` end to end.

use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type OrganizationId = Uuid;
pub type RoleId = Uuid;
pub type MembershipId = Uuid;
pub type BoardId = Uuid;
pub type ListId = Uuid;
pub type CardId = Uuid;

/// Unix-epoch milliseconds, the unit session expiries are stored in.
pub type UnixMillis = i64;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Abbreviate an opaque session id for logging without leaking the token.
pub fn abbrev_token(token: &str) -> String {
    token.chars().take(8).collect()
}
