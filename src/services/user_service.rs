use std::sync::Arc;

use tracing::info;

use crate::core::{FriendshipEdge, FriendshipStore, UserStore};
use crate::error::{AppError, AppResult};
use crate::models::{EntityId, User};

/// User registry operations plus the directed friendship relation and its
/// derived mutual-friend view.
pub struct UserService {
    users: Arc<dyn UserStore>,
    friendships: Arc<dyn FriendshipStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, friendships: Arc<dyn FriendshipStore>) -> Self {
        Self { users, friendships }
    }

    pub async fn create_user(&self, mut user: User) -> AppResult<User> {
        user.validate()?;
        user.normalize();
        let created = self.users.create(user).await?;
        info!("created user {} ({})", created.id, created.login);
        Ok(created)
    }

    pub async fn update_user(&self, mut user: User) -> AppResult<User> {
        user.validate()?;
        user.normalize();
        let updated = self.users.update(user).await?;
        info!("updated user {}", updated.id);
        Ok(updated)
    }

    pub async fn get_user(&self, id: EntityId) -> AppResult<User> {
        self.users.get(id).await
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.users.list().await
    }

    pub async fn add_friend(&self, user_id: EntityId, friend_id: EntityId) -> AppResult<()> {
        self.ensure_exists(user_id).await?;
        self.ensure_exists(friend_id).await?;
        if user_id == friend_id {
            return Err(AppError::SelfReference(format!(
                "user {} cannot befriend themselves",
                user_id
            )));
        }
        self.friendships.add_friend(user_id, friend_id).await?;
        info!("user {} added friend {}", user_id, friend_id);
        Ok(())
    }

    pub async fn remove_friend(&self, user_id: EntityId, friend_id: EntityId) -> AppResult<()> {
        self.ensure_exists(user_id).await?;
        self.ensure_exists(friend_id).await?;
        if user_id == friend_id {
            return Err(AppError::SelfReference(format!(
                "user {} cannot unfriend themselves",
                user_id
            )));
        }
        self.friendships.remove_friend(user_id, friend_id).await?;
        info!("user {} removed friend {}", user_id, friend_id);
        Ok(())
    }

    /// Followees of the user, resolved to full records, in edge-insertion
    /// order.
    pub async fn friends_of(&self, user_id: EntityId) -> AppResult<Vec<User>> {
        self.ensure_exists(user_id).await?;
        let friend_ids = self.friendships.friends_of(user_id).await?;
        self.resolve(friend_ids).await
    }

    /// Intersection of both users' followee lists, ordered by the first
    /// user's edges. An empty intersection is an empty vec, not an error.
    pub async fn mutual_friends(
        &self,
        user_id: EntityId,
        other_id: EntityId,
    ) -> AppResult<Vec<User>> {
        self.ensure_exists(user_id).await?;
        self.ensure_exists(other_id).await?;
        if user_id == other_id {
            return Err(AppError::SelfReference(format!(
                "mutual friends of user {} with themselves is not defined",
                user_id
            )));
        }

        let friends = self.friendships.friends_of(user_id).await?;
        let other_friends = self.friendships.friends_of(other_id).await?;
        let shared: Vec<EntityId> = friends
            .into_iter()
            .filter(|id| other_friends.contains(id))
            .collect();
        self.resolve(shared).await
    }

    /// Directed edge inspection, mainly for reciprocation queries.
    pub async fn friendship(
        &self,
        user_id: EntityId,
        friend_id: EntityId,
    ) -> AppResult<Option<FriendshipEdge>> {
        self.friendships.edge(user_id, friend_id).await
    }

    async fn resolve(&self, ids: Vec<EntityId>) -> AppResult<Vec<User>> {
        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            users.push(self.users.get(id).await?);
        }
        Ok(users)
    }

    async fn ensure_exists(&self, user_id: EntityId) -> AppResult<()> {
        if !self.users.exists(user_id).await? {
            return Err(AppError::NotFound(format!(
                "user with id {} does not exist",
                user_id
            )));
        }
        Ok(())
    }
}
