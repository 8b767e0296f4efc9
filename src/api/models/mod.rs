pub mod auth;
pub mod boards;
pub mod organizations;
pub mod users;
