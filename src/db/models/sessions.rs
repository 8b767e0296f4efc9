//! Database model for session records.

use crate::types::{UnixMillis, UserId};
use sqlx::FromRow;

/// One row of `user_sessions`.
///
/// `active_expires` and `idle_expires` are unix-epoch milliseconds. The
/// schema enforces `idle_expires >= active_expires`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: UserId,
    pub active_expires: UnixMillis,
    pub idle_expires: UnixMillis,
}
