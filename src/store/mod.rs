//! Persistence boundary.
//!
//! Services only see the traits below and receive an implementation at construction.
//! [`PgStore`] talks to PostgreSQL; [`MemoryStore`] keeps everything in process and
//! backs the test suite.
//!
//! Every task operation takes the owner's id and filters on it, so a task belonging
//! to someone else is indistinguishable from one that does not exist.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    NewRefreshToken, NewTask, NewUser, RefreshToken, Task, TaskChanges, TaskFilter, User,
    UserRecord,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn insert_user(&self, user: NewUser) -> AppResult<User>;

    /// `email` must already be normalised.
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Returns the requested page, newest first, and the total number of matches.
    async fn list_tasks(&self, user_id: Uuid, filter: &TaskFilter) -> AppResult<(Vec<Task>, i64)>;

    async fn find_task(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<Task>>;

    async fn insert_task(&self, task: NewTask) -> AppResult<Task>;

    /// Returns `None` when no task with this id is owned by `user_id`.
    async fn update_task(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: &TaskChanges,
    ) -> AppResult<Option<Task>>;

    /// Returns whether a task was removed.
    async fn delete_task(&self, user_id: Uuid, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_refresh_token(&self, token: NewRefreshToken) -> AppResult<RefreshToken>;

    async fn find_refresh_token(&self, token_hash: &str) -> AppResult<Option<RefreshToken>>;

    /// Revokes `old_id` and stores `replacement` atomically. Returns `None`, and stores
    /// nothing, if `old_id` had already been revoked.
    async fn rotate_refresh_token(
        &self,
        old_id: Uuid,
        replacement: NewRefreshToken,
    ) -> AppResult<Option<RefreshToken>>;

    /// Marks the token revoked. Unknown or already revoked tokens are left alone.
    async fn revoke_refresh_token(&self, token_hash: &str) -> AppResult<()>;

    /// Deletes the user's revoked tokens and those expired at `now`. Returns how many
    /// were removed.
    async fn purge_refresh_tokens(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64>;
}
