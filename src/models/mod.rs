// Domain models - validated value objects shared by every storage backend

pub mod film;
pub mod user;

pub use film::{Film, Genre, Mpa};
pub use user::User;

/// Identifier type for films, users and reference entities
pub type EntityId = i64;
