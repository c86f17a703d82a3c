// Persistence-backed store implementations. Same contracts as the
// in-memory variants in `core`; failures from the pool surface unchanged.

pub mod postgres;

pub use postgres::{
    init_schema, PostgresFilmStore, PostgresFriendshipStore, PostgresLikeStore, PostgresUserStore,
};
