use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    NewRefreshToken, NewTask, NewUser, RefreshToken, Task, TaskChanges, TaskFilter, User,
    UserRecord,
};
use crate::store::{SessionStore, TaskStore, UserStore};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserRecord>,
    /// Tasks with their insertion sequence, used to order tasks created within the
    /// same clock tick.
    tasks: HashMap<Uuid, (u64, Task)>,
    refresh_tokens: HashMap<String, RefreshToken>,
    next_seq: u64,
}

/// In-process store with the same observable behaviour as [`super::PgStore`].
///
/// Each call holds the lock for its whole duration, which gives the same per-operation
/// atomicity the database provides.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::InternalServerError("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.lock()?;
        let taken = tables
            .users
            .values()
            .any(|record| record.user.email.eq_ignore_ascii_case(&user.email));
        if taken {
            return Err(AppError::Conflict(
                "User with this email already exists".into(),
            ));
        }

        let now = Utc::now();
        let record = UserRecord {
            user: User {
                id: user.id,
                email: user.email,
                name: user.name,
                created_at: now,
                updated_at: now,
            },
            password_hash: user.password_hash,
        };
        let created = record.user.clone();
        tables.users.insert(created.id, record);
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let tables = self.lock()?;
        Ok(tables
            .users
            .values()
            .find(|record| record.user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let tables = self.lock()?;
        Ok(tables.users.get(&id).map(|record| record.user.clone()))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_tasks(&self, user_id: Uuid, filter: &TaskFilter) -> AppResult<(Vec<Task>, i64)> {
        let tables = self.lock()?;
        let mut matching: Vec<&(u64, Task)> = tables
            .tasks
            .values()
            .filter(|(_, task)| task.user_id == user_id && filter.matches(task))
            .collect();
        matching.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| seq_b.cmp(seq_a))
        });

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .map(|(_, task)| task.clone())
            .collect();
        Ok((page, total))
    }

    async fn find_task(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<Task>> {
        let tables = self.lock()?;
        Ok(tables
            .tasks
            .get(&id)
            .filter(|(_, task)| task.user_id == user_id)
            .map(|(_, task)| task.clone()))
    }

    async fn insert_task(&self, task: NewTask) -> AppResult<Task> {
        let mut tables = self.lock()?;
        let task = task.into_task(Utc::now());
        let seq = tables.next_seq;
        tables.next_seq += 1;
        tables.tasks.insert(task.id, (seq, task.clone()));
        Ok(task)
    }

    async fn update_task(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: &TaskChanges,
    ) -> AppResult<Option<Task>> {
        let mut tables = self.lock()?;
        match tables.tasks.get_mut(&id) {
            Some((_, task)) if task.user_id == user_id => {
                task.apply(changes);
                Ok(Some(task.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_task(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let mut tables = self.lock()?;
        let owned = matches!(tables.tasks.get(&id), Some((_, task)) if task.user_id == user_id);
        if owned {
            tables.tasks.remove(&id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_refresh_token(&self, token: NewRefreshToken) -> AppResult<RefreshToken> {
        let mut tables = self.lock()?;
        let token = RefreshToken::from(token);
        tables
            .refresh_tokens
            .insert(token.token_hash.clone(), token.clone());
        Ok(token)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        let tables = self.lock()?;
        Ok(tables.refresh_tokens.get(token_hash).cloned())
    }

    async fn rotate_refresh_token(
        &self,
        old_id: Uuid,
        replacement: NewRefreshToken,
    ) -> AppResult<Option<RefreshToken>> {
        let mut tables = self.lock()?;
        let old = tables
            .refresh_tokens
            .values_mut()
            .find(|token| token.id == old_id && token.revoked_at.is_none());
        match old {
            Some(old) => old.revoked_at = Some(Utc::now()),
            None => return Ok(None),
        }

        let token = RefreshToken::from(replacement);
        tables
            .refresh_tokens
            .insert(token.token_hash.clone(), token.clone());
        Ok(Some(token))
    }

    async fn revoke_refresh_token(&self, token_hash: &str) -> AppResult<()> {
        let mut tables = self.lock()?;
        if let Some(token) = tables.refresh_tokens.get_mut(token_hash) {
            if token.revoked_at.is_none() {
                token.revoked_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn purge_refresh_tokens(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let mut tables = self.lock()?;
        let before = tables.refresh_tokens.len();
        tables
            .refresh_tokens
            .retain(|_, token| token.user_id != user_id || token.is_active(now));
        Ok((before - tables.refresh_tokens.len()) as u64)
    }
}
