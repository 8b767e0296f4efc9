//! Database entity request/response models.

pub mod boards;
pub mod credentials;
pub mod organizations;
pub mod sessions;
pub mod users;
