use std::sync::Arc;

use tracing::info;

use crate::core::{ranking, FilmStore, LikeStore, ReferenceCatalog, UserStore};
use crate::error::{AppError, AppResult};
use crate::models::{EntityId, Film};

/// Film catalogue operations plus the like relation and popularity view.
///
/// Control flow per operation: resolve existence through the entity
/// stores, validate the value object, then mutate exactly one relation
/// store. Validation never happens after a mutation has been applied.
pub struct FilmService {
    films: Arc<dyn FilmStore>,
    users: Arc<dyn UserStore>,
    likes: Arc<dyn LikeStore>,
    catalog: Arc<ReferenceCatalog>,
}

impl FilmService {
    pub fn new(
        films: Arc<dyn FilmStore>,
        users: Arc<dyn UserStore>,
        likes: Arc<dyn LikeStore>,
        catalog: Arc<ReferenceCatalog>,
    ) -> Self {
        Self {
            films,
            users,
            likes,
            catalog,
        }
    }

    pub async fn create_film(&self, mut film: Film) -> AppResult<Film> {
        film.validate()?;
        self.catalog.resolve_film_refs(&mut film)?;
        let created = self.films.create(film).await?;
        info!("created film {} ({})", created.id, created.name);
        Ok(created)
    }

    pub async fn update_film(&self, mut film: Film) -> AppResult<Film> {
        film.validate()?;
        self.catalog.resolve_film_refs(&mut film)?;
        let updated = self.films.update(film).await?;
        info!("updated film {}", updated.id);
        Ok(updated)
    }

    pub async fn get_film(&self, id: EntityId) -> AppResult<Film> {
        self.films.get(id).await
    }

    pub async fn list_films(&self) -> AppResult<Vec<Film>> {
        self.films.list().await
    }

    pub async fn like(&self, film_id: EntityId, user_id: EntityId) -> AppResult<()> {
        self.ensure_film_exists(film_id).await?;
        self.ensure_user_exists(user_id).await?;
        self.likes.like(film_id, user_id).await?;
        info!("user {} liked film {}", user_id, film_id);
        Ok(())
    }

    pub async fn unlike(&self, film_id: EntityId, user_id: EntityId) -> AppResult<()> {
        self.ensure_film_exists(film_id).await?;
        self.ensure_user_exists(user_id).await?;
        self.likes.unlike(film_id, user_id).await?;
        info!("user {} removed like from film {}", user_id, film_id);
        Ok(())
    }

    pub async fn count_likes(&self, film_id: EntityId) -> AppResult<u64> {
        self.ensure_film_exists(film_id).await?;
        self.likes.count_likes(film_id).await
    }

    /// Most-liked films, recomputed from the current edge set on every
    /// call.
    pub async fn top_films(&self, count: i64) -> AppResult<Vec<Film>> {
        let films = self.films.list().await?;
        let counts = self.likes.all_counts().await?;
        Ok(ranking::top_films(films, &counts, count))
    }

    async fn ensure_film_exists(&self, film_id: EntityId) -> AppResult<()> {
        if !self.films.exists(film_id).await? {
            return Err(AppError::NotFound(format!(
                "film with id {} does not exist",
                film_id
            )));
        }
        Ok(())
    }

    async fn ensure_user_exists(&self, user_id: EntityId) -> AppResult<()> {
        if !self.users.exists(user_id).await? {
            return Err(AppError::NotFound(format!(
                "user with id {} does not exist",
                user_id
            )));
        }
        Ok(())
    }
}
