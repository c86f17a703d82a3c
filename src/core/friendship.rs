use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::EntityId;

/// A directed follow edge. `reciprocated` is true exactly when the
/// inverse edge also exists; it is recomputed eagerly on every mutation,
/// never lazily at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendshipEdge {
    pub follower_id: EntityId,
    pub followee_id: EntityId,
    pub reciprocated: bool,
}

/// Directed user-to-user friendship relation. Adding A -> B does not add
/// B -> A; the pair only counts as mutual once both sides have added each
/// other. Removal deletes the one directed edge and downgrades the
/// surviving inverse edge to non-reciprocated.
///
/// User existence and the self-reference rule are enforced by the service
/// layer before the store mutates; the store still refuses self-edges so
/// the invariant holds no matter who calls it.
#[async_trait]
pub trait FriendshipStore: Send + Sync {
    async fn add_friend(&self, user_id: EntityId, friend_id: EntityId) -> AppResult<()>;
    async fn remove_friend(&self, user_id: EntityId, friend_id: EntityId) -> AppResult<()>;
    /// Followee ids in edge-insertion order.
    async fn friends_of(&self, user_id: EntityId) -> AppResult<Vec<EntityId>>;
    /// The directed edge user -> friend, if present.
    async fn edge(&self, user_id: EntityId, friend_id: EntityId)
        -> AppResult<Option<FriendshipEdge>>;
    async fn clear(&self) -> AppResult<()>;
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    followee_id: EntityId,
    reciprocated: bool,
}

pub struct InMemoryFriendshipStore {
    // Vec per follower keeps edge-insertion order for friends_of
    edges: RwLock<HashMap<EntityId, Vec<Edge>>>,
}

impl InMemoryFriendshipStore {
    pub fn new() -> Self {
        Self {
            edges: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryFriendshipStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FriendshipStore for InMemoryFriendshipStore {
    async fn add_friend(&self, user_id: EntityId, friend_id: EntityId) -> AppResult<()> {
        if user_id == friend_id {
            return Err(AppError::SelfReference(format!(
                "user {} cannot befriend themselves",
                user_id
            )));
        }

        let mut edges = self.edges.write().await;
        let duplicate = edges
            .get(&user_id)
            .is_some_and(|list| list.iter().any(|e| e.followee_id == friend_id));
        if duplicate {
            return Err(AppError::AlreadyExists(format!(
                "user {} already follows user {}",
                user_id, friend_id
            )));
        }

        // Reciprocation is recomputed for both directions while the lock
        // is still held
        let inverse = match edges
            .get_mut(&friend_id)
            .and_then(|list| list.iter_mut().find(|e| e.followee_id == user_id))
        {
            Some(edge) => {
                edge.reciprocated = true;
                true
            }
            None => false,
        };
        edges.entry(user_id).or_default().push(Edge {
            followee_id: friend_id,
            reciprocated: inverse,
        });
        Ok(())
    }

    async fn remove_friend(&self, user_id: EntityId, friend_id: EntityId) -> AppResult<()> {
        let mut edges = self.edges.write().await;
        let removed = edges.get_mut(&user_id).and_then(|list| {
            list.iter()
                .position(|e| e.followee_id == friend_id)
                .map(|pos| list.remove(pos))
        });
        if removed.is_none() {
            return Err(AppError::NotFriends(format!(
                "user {} does not follow user {}",
                user_id, friend_id
            )));
        }

        // The inverse edge, if any, survives but is no longer mutual
        if let Some(edge) = edges
            .get_mut(&friend_id)
            .and_then(|list| list.iter_mut().find(|e| e.followee_id == user_id))
        {
            edge.reciprocated = false;
        }
        Ok(())
    }

    async fn friends_of(&self, user_id: EntityId) -> AppResult<Vec<EntityId>> {
        Ok(self
            .edges
            .read()
            .await
            .get(&user_id)
            .map(|list| list.iter().map(|e| e.followee_id).collect())
            .unwrap_or_default())
    }

    async fn edge(
        &self,
        user_id: EntityId,
        friend_id: EntityId,
    ) -> AppResult<Option<FriendshipEdge>> {
        Ok(self.edges.read().await.get(&user_id).and_then(|list| {
            list.iter()
                .find(|e| e.followee_id == friend_id)
                .map(|e| FriendshipEdge {
                    follower_id: user_id,
                    followee_id: friend_id,
                    reciprocated: e.reciprocated,
                })
        }))
    }

    async fn clear(&self) -> AppResult<()> {
        self.edges.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn follow_is_one_way() {
        let store = InMemoryFriendshipStore::new();
        store.add_friend(1, 2).await.unwrap();
        assert_eq!(store.friends_of(1).await.unwrap(), vec![2]);
        assert!(store.friends_of(2).await.unwrap().is_empty());
        assert!(!store.edge(1, 2).await.unwrap().unwrap().reciprocated);
    }

    #[tokio::test]
    async fn mutual_add_reciprocates_both_edges() {
        let store = InMemoryFriendshipStore::new();
        store.add_friend(1, 2).await.unwrap();
        store.add_friend(2, 1).await.unwrap();
        assert!(store.edge(1, 2).await.unwrap().unwrap().reciprocated);
        assert!(store.edge(2, 1).await.unwrap().unwrap().reciprocated);
    }

    #[tokio::test]
    async fn removal_deletes_one_direction_only() {
        let store = InMemoryFriendshipStore::new();
        store.add_friend(1, 2).await.unwrap();
        store.add_friend(2, 1).await.unwrap();
        store.remove_friend(1, 2).await.unwrap();

        assert!(store.edge(1, 2).await.unwrap().is_none());
        let surviving = store.edge(2, 1).await.unwrap().unwrap();
        assert!(!surviving.reciprocated);
    }

    #[tokio::test]
    async fn duplicate_add_is_rejected() {
        let store = InMemoryFriendshipStore::new();
        store.add_friend(1, 2).await.unwrap();
        assert!(matches!(
            store.add_friend(1, 2).await.unwrap_err(),
            AppError::AlreadyExists(_)
        ));
    }

    #[tokio::test]
    async fn self_edge_is_forbidden() {
        let store = InMemoryFriendshipStore::new();
        assert!(matches!(
            store.add_friend(1, 1).await.unwrap_err(),
            AppError::SelfReference(_)
        ));
    }

    #[tokio::test]
    async fn removing_missing_edge_is_not_friends() {
        let store = InMemoryFriendshipStore::new();
        store.add_friend(1, 2).await.unwrap();
        store.remove_friend(1, 2).await.unwrap();
        assert!(matches!(
            store.remove_friend(1, 2).await.unwrap_err(),
            AppError::NotFriends(_)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_identical_adds_admit_exactly_one_edge() {
        let store = std::sync::Arc::new(InMemoryFriendshipStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.add_friend(1, 2).await }));
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
        assert_eq!(store.friends_of(1).await.unwrap(), vec![2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reciprocal_adds_end_up_mutual() {
        let store = std::sync::Arc::new(InMemoryFriendshipStore::new());
        let forward = {
            let store = std::sync::Arc::clone(&store);
            tokio::spawn(async move { store.add_friend(1, 2).await })
        };
        let backward = {
            let store = std::sync::Arc::clone(&store);
            tokio::spawn(async move { store.add_friend(2, 1).await })
        };
        forward.await.unwrap().unwrap();
        backward.await.unwrap().unwrap();

        assert!(store.edge(1, 2).await.unwrap().unwrap().reciprocated);
        assert!(store.edge(2, 1).await.unwrap().unwrap().reciprocated);
    }

    #[tokio::test]
    async fn friends_keep_insertion_order() {
        let store = InMemoryFriendshipStore::new();
        store.add_friend(1, 5).await.unwrap();
        store.add_friend(1, 3).await.unwrap();
        store.add_friend(1, 9).await.unwrap();
        assert_eq!(store.friends_of(1).await.unwrap(), vec![5, 3, 9]);
    }
}
