use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult, FieldViolation};
use crate::models::Field;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    Pending,
    /// Task is currently being worked on.
    InProgress,
    /// Task is completed.
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }

    /// The status `toggle` moves a task to. Anything that is not completed becomes
    /// completed; a completed task goes back to pending.
    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Completed => TaskStatus::Pending,
            TaskStatus::Pending | TaskStatus::InProgress => TaskStatus::Completed,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TaskStatus::Pending),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "COMPLETED" => Ok(TaskStatus::Completed),
            _ => Err(AppError::invalid(
                "status",
                "Status must be one of PENDING, IN_PROGRESS, COMPLETED",
            )),
        }
    }
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    /// The title of the task.
    pub title: String,
    /// An optional description for the task.
    pub description: Option<String>,
    /// The current status of the task.
    pub status: TaskStatus,
    /// Identifier of the user who owns the task.
    pub user_id: Uuid,
    /// Timestamp of when the task was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update to the task.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Applies a validated change set in place and bumps `updated_at`.
    pub fn apply(&mut self, changes: &TaskChanges) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(description) = &changes.description {
            self.description = description.clone();
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
    }
}

/// Body of `POST /tasks`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Required; surrounding whitespace is dropped before validation.
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title is required and must be at most 200 characters"
    ))]
    pub title: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    /// Defaults to `PENDING`.
    pub status: Option<TaskStatus>,
}

impl CreateTaskRequest {
    /// Trims the free-text fields and validates the result.
    pub fn into_new_task(self, user_id: Uuid) -> AppResult<NewTask> {
        let normalized = CreateTaskRequest {
            title: self.title.trim().to_string(),
            description: self.description.map(|d| d.trim().to_string()),
            status: self.status,
        };
        normalized.validate()?;

        Ok(NewTask {
            id: Uuid::new_v4(),
            user_id,
            title: normalized.title,
            description: normalized.description,
            status: normalized.status.unwrap_or_default(),
        })
    }
}

/// A validated task ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
}

impl NewTask {
    pub fn into_task(self, now: DateTime<Utc>) -> Task {
        Task {
            id: self.id,
            title: self.title,
            description: self.description,
            status: self.status,
            user_id: self.user_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of `PATCH /tasks/{id}`. Every key is optional and absence is tracked
/// separately from `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Field<String>,
    #[serde(default)]
    pub description: Field<String>,
    #[serde(default)]
    pub status: Field<TaskStatus>,
}

impl UpdateTaskRequest {
    /// Validates the payload and resolves it into the set of columns to write.
    pub fn into_changes(self) -> AppResult<TaskChanges> {
        let mut violations = Vec::new();

        let title = match self.title.map(|t| t.trim().to_string()) {
            Field::Missing => None,
            Field::Present(title) if !title.is_empty() && title.chars().count() <= 200 => {
                Some(title)
            }
            Field::Present(title) if !title.is_empty() => {
                violations.push(FieldViolation::new(
                    "title",
                    "Title must be at most 200 characters",
                ));
                None
            }
            Field::Present(_) | Field::Null => {
                violations.push(FieldViolation::new("title", "Title cannot be empty"));
                None
            }
        };

        let description = match self.description.map(|d| d.trim().to_string()) {
            Field::Missing => None,
            Field::Null => Some(None),
            Field::Present(description) if description.chars().count() > 1000 => {
                violations.push(FieldViolation::new(
                    "description",
                    "Description must be at most 1000 characters",
                ));
                None
            }
            Field::Present(description) => Some(Some(description)),
        };

        let status = match self.status {
            Field::Missing => None,
            Field::Present(status) => Some(status),
            Field::Null => {
                violations.push(FieldViolation::new(
                    "status",
                    "Status must be one of PENDING, IN_PROGRESS, COMPLETED",
                ));
                None
            }
        };

        if !violations.is_empty() {
            return Err(AppError::ValidationError(violations));
        }

        Ok(TaskChanges {
            title,
            description,
            status,
        })
    }
}

/// Columns to overwrite on update. `None` means "leave as is"; for `description`,
/// `Some(None)` clears the column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
}

impl TaskChanges {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Query string of `GET /tasks`, as received.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// An exact status, or `ALL`.
    pub status: Option<String>,
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
}

impl TaskListQuery {
    pub fn into_filter(self) -> AppResult<TaskFilter> {
        let mut violations = Vec::new();

        let page = self.page.unwrap_or(DEFAULT_PAGE);
        if page == 0 {
            violations.push(FieldViolation::new("page", "Page must be a positive integer"));
        }
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 || limit > MAX_LIMIT {
            violations.push(FieldViolation::new(
                "limit",
                format!("Limit must be between 1 and {}", MAX_LIMIT),
            ));
        }

        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("ALL") => None,
            Some(raw) => match raw.parse::<TaskStatus>() {
                Ok(status) => Some(status),
                Err(AppError::ValidationError(mut v)) => {
                    violations.append(&mut v);
                    None
                }
                Err(other) => return Err(other),
            },
        };

        if !violations.is_empty() {
            return Err(AppError::ValidationError(violations));
        }

        Ok(TaskFilter {
            page,
            limit,
            status,
            search: self.search.filter(|s| !s.is_empty()),
        })
    }
}

/// A validated listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub page: u32,
    pub limit: u32,
    pub status: Option<TaskStatus>,
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Whether `task` passes the status and search filters (ownership is not checked).
    pub fn matches(&self, task: &Task) -> bool {
        let status_ok = self.status.map_or(true, |s| task.status == s);
        let search_ok = self.search.as_ref().map_or(true, |term| {
            task.title.to_lowercase().contains(&term.to_lowercase())
        });
        status_ok && search_ok
    }
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            status: None,
            search: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let limit_i = i64::from(limit.max(1));
        Self {
            page,
            limit,
            total,
            total_pages: (total + limit_i - 1) / limit_i,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub pagination: Pagination,
}
