use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::id_allocator::IdAllocator;
use crate::error::{AppError, AppResult};
use crate::models::{EntityId, Film, User};

/// Storage contract for films. Both the in-memory store and the
/// sqlx-backed store implement this, so the service layer never knows
/// which backend it is talking to.
#[async_trait]
pub trait FilmStore: Send + Sync {
    /// Insert a new film, assigning an id when the incoming record does
    /// not already carry one that is present in the store.
    async fn create(&self, film: Film) -> AppResult<Film>;
    /// Replace an existing film in place.
    async fn update(&self, film: Film) -> AppResult<Film>;
    /// Fetch an owned copy; callers can never corrupt store state
    /// through the returned record.
    async fn get(&self, id: EntityId) -> AppResult<Film>;
    /// All films in insertion order (primary-key order for persisted
    /// backends).
    async fn list(&self) -> AppResult<Vec<Film>>;
    async fn exists(&self, id: EntityId) -> AppResult<bool>;
    /// Bulk reset used by tests. Allocated ids are not reused.
    async fn clear(&self) -> AppResult<()>;
}

/// Storage contract for users, mirroring [`FilmStore`].
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: User) -> AppResult<User>;
    async fn update(&self, user: User) -> AppResult<User>;
    async fn get(&self, id: EntityId) -> AppResult<User>;
    async fn list(&self) -> AppResult<Vec<User>>;
    async fn exists(&self, id: EntityId) -> AppResult<bool>;
    async fn clear(&self) -> AppResult<()>;
}

// Ids are allocated monotonically, so BTreeMap key order and insertion
// order coincide and `list` comes out in creation order for free.

pub struct InMemoryFilmStore {
    films: RwLock<BTreeMap<EntityId, Film>>,
    allocator: Arc<dyn IdAllocator>,
}

impl InMemoryFilmStore {
    pub fn new(allocator: Arc<dyn IdAllocator>) -> Self {
        Self {
            films: RwLock::new(BTreeMap::new()),
            allocator,
        }
    }
}

#[async_trait]
impl FilmStore for InMemoryFilmStore {
    async fn create(&self, mut film: Film) -> AppResult<Film> {
        // Check-then-insert under one write lock
        let mut films = self.films.write().await;
        if film.id > 0 && films.contains_key(&film.id) {
            return Err(AppError::AlreadyExists(format!(
                "film with id {} already exists",
                film.id
            )));
        }
        film.id = self.allocator.next_id();
        films.insert(film.id, film.clone());
        Ok(film)
    }

    async fn update(&self, film: Film) -> AppResult<Film> {
        let mut films = self.films.write().await;
        if !films.contains_key(&film.id) {
            return Err(AppError::NotFound(format!(
                "film with id {} does not exist",
                film.id
            )));
        }
        films.insert(film.id, film.clone());
        Ok(film)
    }

    async fn get(&self, id: EntityId) -> AppResult<Film> {
        self.films
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("film with id {} does not exist", id)))
    }

    async fn list(&self) -> AppResult<Vec<Film>> {
        Ok(self.films.read().await.values().cloned().collect())
    }

    async fn exists(&self, id: EntityId) -> AppResult<bool> {
        Ok(self.films.read().await.contains_key(&id))
    }

    async fn clear(&self) -> AppResult<()> {
        self.films.write().await.clear();
        Ok(())
    }
}

pub struct InMemoryUserStore {
    users: RwLock<BTreeMap<EntityId, User>>,
    allocator: Arc<dyn IdAllocator>,
}

impl InMemoryUserStore {
    pub fn new(allocator: Arc<dyn IdAllocator>) -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            allocator,
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, mut user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if user.id > 0 && users.contains_key(&user.id) {
            return Err(AppError::AlreadyExists(format!(
                "user with id {} already exists",
                user.id
            )));
        }
        user.id = self.allocator.next_id();
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(AppError::NotFound(format!(
                "user with id {} does not exist",
                user.id
            )));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get(&self, id: EntityId) -> AppResult<User> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("user with id {} does not exist", id)))
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn exists(&self, id: EntityId) -> AppResult<bool> {
        Ok(self.users.read().await.contains_key(&id))
    }

    async fn clear(&self) -> AppResult<()> {
        self.users.write().await.clear();
        Ok(())
    }
}
