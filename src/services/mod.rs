// Service layer - orchestrates existence checks, validation and the
// relation stores; the only place inbound operations are allowed to enter
// the core.

pub mod film_service;
pub mod user_service;

pub use film_service::FilmService;
pub use user_service::UserService;
