use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{CreateTaskRequest, TaskListQuery, UpdateTaskRequest},
    response::ApiResponse,
    tasks::TaskService,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;

/// Retrieves a page of the authenticated user's tasks.
///
/// Tasks are ordered by creation date, newest first.
///
/// ## Query Parameters:
/// - `page` (optional, default 1) and `limit` (optional, default 10, max 100).
/// - `status` (optional): `PENDING`, `IN_PROGRESS`, `COMPLETED` or `ALL`.
/// - `search` (optional): case-insensitive substring of the title.
///
/// ## Responses:
/// - `200 OK`: `{ tasks, pagination: { page, limit, total, totalPages } }`.
/// - `400 Bad Request`: non-positive page/limit or unknown status.
/// - `401 Unauthorized`: missing or invalid access token.
#[get("")]
pub async fn get_tasks(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    query_params: web::Query<TaskListQuery>,
) -> Result<impl Responder, AppError> {
    let page = tasks.list(user.0, query_params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::data(page)))
}

/// Creates a new task owned by the authenticated user.
///
/// ## Request Body:
/// - `title`: required, non-empty after trimming.
/// - `description` (optional).
/// - `status` (optional): defaults to `PENDING`.
///
/// ## Responses:
/// - `201 Created`: `{ task }`.
/// - `400 Bad Request`: missing title, unknown status or malformed body.
/// - `401 Unauthorized`: missing or invalid access token.
#[post("")]
pub async fn create_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    task_data: web::Json<CreateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let task = tasks.create(user.0, task_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        "Task created successfully",
        json!({ "task": task }),
    )))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: `{ task }`.
/// - `404 Not Found`: no such task, or it belongs to another user.
#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = tasks.get(user.0, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::data(json!({ "task": task }))))
}

/// Partially updates a task.
///
/// Only keys present in the body are written. `description: ""` stores an empty
/// description and `description: null` clears it.
///
/// ## Responses:
/// - `200 OK`: `{ task }`.
/// - `400 Bad Request`: blank title, unknown status or malformed body.
/// - `404 Not Found`: no such task, or it belongs to another user.
#[patch("/{id}")]
pub async fn update_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let task = tasks
        .update(user.0, task_id.into_inner(), task_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        "Task updated successfully",
        json!({ "task": task }),
    )))
}

/// Deletes a task permanently.
///
/// ## Responses:
/// - `200 OK`: confirmation message.
/// - `404 Not Found`: no such task, or it belongs to another user.
#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    tasks.delete(user.0, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Task deleted successfully")))
}

/// Flips a task between `COMPLETED` and `PENDING`. `IN_PROGRESS` becomes `COMPLETED`.
#[post("/{id}/toggle")]
pub async fn toggle_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = tasks.toggle(user.0, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        "Task status toggled successfully",
        json!({ "task": task }),
    )))
}
