use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use crate::{
    config::Config,
    core::{
        FilmStore, FriendshipStore, InMemoryFilmStore, InMemoryFriendshipStore, InMemoryLikeStore,
        InMemoryUserStore, LikeStore, ReferenceCatalog, SequentialIdAllocator, UserStore,
    },
    services::{FilmService, UserService},
    storage,
};

#[derive(Clone)]
pub struct AppState {
    pub film_service: Arc<FilmService>,
    pub user_service: Arc<UserService>,
    pub catalog: Arc<ReferenceCatalog>,
}

impl AppState {
    /// Wire the services against either the in-memory stores or the
    /// Postgres-backed ones, depending on configuration. The services
    /// never know which backend they got.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let catalog = Arc::new(ReferenceCatalog::with_defaults());

        let (films, users, likes, friendships): (
            Arc<dyn FilmStore>,
            Arc<dyn UserStore>,
            Arc<dyn LikeStore>,
            Arc<dyn FriendshipStore>,
        ) = match &config.database.url {
            Some(url) => {
                let pool = PgPoolOptions::new().max_connections(8).connect(url).await?;
                storage::init_schema(&pool).await?;
                (
                    Arc::new(storage::PostgresFilmStore::new(pool.clone())),
                    Arc::new(storage::PostgresUserStore::new(pool.clone())),
                    Arc::new(storage::PostgresLikeStore::new(pool.clone())),
                    Arc::new(storage::PostgresFriendshipStore::new(pool)),
                )
            }
            None => {
                // One allocator shared by both entity stores; ids stay
                // monotonic per store either way
                let allocator = Arc::new(SequentialIdAllocator::new());
                (
                    Arc::new(InMemoryFilmStore::new(allocator.clone())),
                    Arc::new(InMemoryUserStore::new(allocator)),
                    Arc::new(InMemoryLikeStore::new()),
                    Arc::new(InMemoryFriendshipStore::new()),
                )
            }
        };

        let film_service = Arc::new(FilmService::new(
            films,
            users.clone(),
            likes,
            catalog.clone(),
        ));
        let user_service = Arc::new(UserService::new(users, friendships));

        Ok(Self {
            film_service,
            user_service,
            catalog,
        })
    }
}
