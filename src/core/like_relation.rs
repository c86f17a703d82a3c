use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::EntityId;

/// Bipartite film/user like relation. Membership only - a user likes a
/// film at most once, and the edge set never touches the Film or User
/// records themselves.
///
/// Callers resolve film/user existence through the entity stores before
/// mutating the relation; the relation itself only guards edge
/// uniqueness.
#[async_trait]
pub trait LikeStore: Send + Sync {
    /// Insert the (film, user) edge. A duplicate like is rejected with
    /// `AlreadyExists` rather than silently ignored, so the caller knows
    /// the request had no effect.
    async fn like(&self, film_id: EntityId, user_id: EntityId) -> AppResult<()>;
    /// Remove the edge; `NotFound` when it was never there.
    async fn unlike(&self, film_id: EntityId, user_id: EntityId) -> AppResult<()>;
    /// Distinct users who like the film; zero when unknown.
    async fn count_likes(&self, film_id: EntityId) -> AppResult<u64>;
    /// Snapshot of film id -> like count, consumed by the ranking engine.
    async fn all_counts(&self) -> AppResult<HashMap<EntityId, u64>>;
    async fn clear(&self) -> AppResult<()>;
}

pub struct InMemoryLikeStore {
    likes_by_film: RwLock<HashMap<EntityId, HashSet<EntityId>>>,
}

impl InMemoryLikeStore {
    pub fn new() -> Self {
        Self {
            likes_by_film: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryLikeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LikeStore for InMemoryLikeStore {
    async fn like(&self, film_id: EntityId, user_id: EntityId) -> AppResult<()> {
        // Check-then-insert under one write lock so concurrent identical
        // requests cannot both succeed
        let mut likes = self.likes_by_film.write().await;
        let users = likes.entry(film_id).or_default();
        if !users.insert(user_id) {
            return Err(AppError::AlreadyExists(format!(
                "user {} already likes film {}",
                user_id, film_id
            )));
        }
        Ok(())
    }

    async fn unlike(&self, film_id: EntityId, user_id: EntityId) -> AppResult<()> {
        let mut likes = self.likes_by_film.write().await;
        let removed = likes
            .get_mut(&film_id)
            .map(|users| users.remove(&user_id))
            .unwrap_or(false);
        if !removed {
            return Err(AppError::NotFound(format!(
                "user {} has no like on film {}",
                user_id, film_id
            )));
        }
        Ok(())
    }

    async fn count_likes(&self, film_id: EntityId) -> AppResult<u64> {
        Ok(self
            .likes_by_film
            .read()
            .await
            .get(&film_id)
            .map(|users| users.len() as u64)
            .unwrap_or(0))
    }

    async fn all_counts(&self) -> AppResult<HashMap<EntityId, u64>> {
        Ok(self
            .likes_by_film
            .read()
            .await
            .iter()
            .map(|(film_id, users)| (*film_id, users.len() as u64))
            .collect())
    }

    async fn clear(&self) -> AppResult<()> {
        self.likes_by_film.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_like_is_rejected() {
        let store = InMemoryLikeStore::new();
        store.like(1, 10).await.unwrap();
        assert!(matches!(
            store.like(1, 10).await.unwrap_err(),
            AppError::AlreadyExists(_)
        ));
        assert_eq!(store.count_likes(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unlike_without_prior_like_is_not_found() {
        let store = InMemoryLikeStore::new();
        assert!(matches!(
            store.unlike(1, 10).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn count_tracks_successful_likes_and_unlikes() {
        let store = InMemoryLikeStore::new();
        store.like(1, 10).await.unwrap();
        store.like(1, 11).await.unwrap();
        store.like(1, 12).await.unwrap();
        store.unlike(1, 11).await.unwrap();
        assert_eq!(store.count_likes(1).await.unwrap(), 2);
        assert_eq!(store.count_likes(99).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_identical_likes_admit_exactly_one_edge() {
        let store = std::sync::Arc::new(InMemoryLikeStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.like(1, 10).await }));
        }

        let mut ok = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(AppError::AlreadyExists(_)) => duplicates += 1,
                Err(other) => panic!("unexpected error: {}", other),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(duplicates, 15);
        assert_eq!(store.count_likes(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn counts_are_per_film() {
        let store = InMemoryLikeStore::new();
        store.like(1, 10).await.unwrap();
        store.like(2, 10).await.unwrap();
        store.like(2, 11).await.unwrap();
        let counts = store.all_counts().await.unwrap();
        assert_eq!(counts.get(&1), Some(&1));
        assert_eq!(counts.get(&2), Some(&2));
    }
}
