pub mod boards;
pub mod credentials;
pub mod organizations;
pub mod repository;
pub mod sessions;
pub mod users;
