//! Ownership-scoped task operations.
//!
//! Every method takes the caller's id. A task owned by someone else is reported
//! exactly like a missing one.

use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    CreateTaskRequest, Pagination, Task, TaskChanges, TaskListQuery, TaskPage, UpdateTaskRequest,
};
use crate::store::TaskStore;

fn not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, user_id: Uuid, query: TaskListQuery) -> AppResult<TaskPage> {
        let filter = query.into_filter()?;
        let (tasks, total) = self.store.list_tasks(user_id, &filter).await?;
        Ok(TaskPage {
            tasks,
            pagination: Pagination::new(filter.page, filter.limit, total),
        })
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> AppResult<Task> {
        self.store
            .find_task(user_id, id)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn create(&self, user_id: Uuid, request: CreateTaskRequest) -> AppResult<Task> {
        let new_task = request.into_new_task(user_id)?;
        let task = self.store.insert_task(new_task).await?;
        log::info!("User {} created task {}", user_id, task.id);
        Ok(task)
    }

    /// Applies only the fields present in `request`.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        request: UpdateTaskRequest,
    ) -> AppResult<Task> {
        let changes = request.into_changes()?;
        self.get(user_id, id).await?;
        self.write(user_id, id, &changes).await
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        if !self.store.delete_task(user_id, id).await? {
            return Err(not_found());
        }
        log::info!("User {} deleted task {}", user_id, id);
        Ok(())
    }

    /// COMPLETED goes back to PENDING; PENDING and IN_PROGRESS become COMPLETED.
    pub async fn toggle(&self, user_id: Uuid, id: Uuid) -> AppResult<Task> {
        let current = self.get(user_id, id).await?;
        let changes = TaskChanges::status(current.status.toggled());
        let task = self.write(user_id, id, &changes).await?;
        log::info!(
            "User {} toggled task {} from {} to {}",
            user_id,
            id,
            current.status,
            task.status
        );
        Ok(task)
    }

    async fn write(&self, user_id: Uuid, id: Uuid, changes: &TaskChanges) -> AppResult<Task> {
        // Deleted between the ownership check and the write.
        self.store
            .update_task(user_id, id, changes)
            .await?
            .ok_or_else(not_found)
    }
}
