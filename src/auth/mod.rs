pub(crate) mod dto;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;

pub use handlers::handle;
