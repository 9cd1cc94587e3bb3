use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    NewRefreshToken, NewTask, NewUser, RefreshToken, Task, TaskChanges, TaskFilter, User,
    UserRecord,
};
use crate::store::{SessionStore, TaskStore, UserStore};

const USER_COLUMNS: &str = "id, email, name, created_at, updated_at";
const TASK_COLUMNS: &str = "id, title, description, status, user_id, created_at, updated_at";
const TOKEN_COLUMNS: &str = "id, user_id, token_hash, issued_at, expires_at, revoked_at";

/// PostgreSQL-backed store. Cloning is cheap; the pool is shared.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escapes `ILIKE` wildcards so the search term is matched literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_task_filters(builder: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, filter: &TaskFilter) {
    builder.push(" WHERE user_id = ").push_bind(user_id);
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(search) = &filter.search {
        builder
            .push(" AND title ILIKE ")
            .push_bind(like_pattern(search));
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let sql = format!(
            "INSERT INTO users (id, email, password_hash, name) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        // A duplicate email surfaces as a unique violation, mapped to Conflict.
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let sql = format!(
            "SELECT {}, password_hash FROM users WHERE lower(email) = lower($1)",
            USER_COLUMNS
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn list_tasks(&self, user_id: Uuid, filter: &TaskFilter) -> AppResult<(Vec<Task>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks");
        push_task_filters(&mut count, user_id, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM tasks", TASK_COLUMNS));
        push_task_filters(&mut select, user_id, filter);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(filter.limit))
            .push(" OFFSET ")
            .push_bind(filter.offset() as i64);
        let tasks = select
            .build_query_as::<Task>()
            .fetch_all(&self.pool)
            .await?;

        Ok((tasks, total))
    }

    async fn find_task(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn insert_task(&self, task: NewTask) -> AppResult<Task> {
        let sql = format!(
            "INSERT INTO tasks (id, title, description, status, user_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(task.title)
            .bind(task.description)
            .bind(task.status)
            .bind(task.user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(task)
    }

    async fn update_task(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: &TaskChanges,
    ) -> AppResult<Option<Task>> {
        // `description` needs an explicit flag: NULL is a legitimate new value.
        let sql = format!(
            "UPDATE tasks
             SET title = COALESCE($1, title),
                 description = CASE WHEN $2 THEN $3 ELSE description END,
                 status = COALESCE($4, status),
                 updated_at = now()
             WHERE id = $5 AND user_id = $6
             RETURNING {}",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(&changes.title)
            .bind(changes.description.is_some())
            .bind(changes.description.clone().flatten())
            .bind(changes.status)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn delete_task(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn insert_refresh_token(&self, token: NewRefreshToken) -> AppResult<RefreshToken> {
        let sql = format!(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, issued_at, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            TOKEN_COLUMNS
        );
        let token = sqlx::query_as::<_, RefreshToken>(&sql)
            .bind(token.id)
            .bind(token.user_id)
            .bind(token.token_hash)
            .bind(token.issued_at)
            .bind(token.expires_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(token)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        let sql = format!(
            "SELECT {} FROM refresh_tokens WHERE token_hash = $1",
            TOKEN_COLUMNS
        );
        let token = sqlx::query_as::<_, RefreshToken>(&sql)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(token)
    }

    async fn rotate_refresh_token(
        &self,
        old_id: Uuid,
        replacement: NewRefreshToken,
    ) -> AppResult<Option<RefreshToken>> {
        let mut tx = self.pool.begin().await?;

        let revoked = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $1 WHERE id = $2 AND revoked_at IS NULL",
        )
        .bind(Utc::now())
        .bind(old_id)
        .execute(&mut *tx)
        .await?;

        if revoked.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let sql = format!(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, issued_at, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            TOKEN_COLUMNS
        );
        let token = sqlx::query_as::<_, RefreshToken>(&sql)
            .bind(replacement.id)
            .bind(replacement.user_id)
            .bind(replacement.token_hash)
            .bind(replacement.issued_at)
            .bind(replacement.expires_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(token))
    }

    async fn revoke_refresh_token(&self, token_hash: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $1 WHERE token_hash = $2 AND revoked_at IS NULL",
        )
        .bind(Utc::now())
        .bind(token_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn purge_refresh_tokens(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM refresh_tokens
             WHERE user_id = $1 AND (revoked_at IS NOT NULL OR expires_at <= $2)",
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("milk"), "%milk%");
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_list_query_shape() {
        let filter = TaskFilter {
            status: Some(TaskStatus::Completed),
            search: Some("report".to_string()),
            ..TaskFilter::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks");
        push_task_filters(&mut builder, Uuid::new_v4(), &filter);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM tasks WHERE user_id = $1 AND status = $2 AND title ILIKE $3"
        );
    }
}
