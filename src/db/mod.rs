//! Database layer: repositories over SQLite plus the error taxonomy they
//! surface.
//!
//! Repositories are thin structs borrowing a `&mut SqliteConnection`, so a
//! caller decides whether operations share a transaction. Multi-table writes
//! (organization creation, sign-up) always run inside one transaction owned
//! by the caller or the repository itself.

pub mod errors;
pub mod handlers;
pub mod models;
