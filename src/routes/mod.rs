pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Registers every route under `/api`, the extractor error handlers and the 404 fallback.
///
/// Expects `web::Data<AuthService>` and `web::Data<TaskService>` to be registered on
/// the `App`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(
            web::scope("/api")
                .service(health::health)
                .service(
                    web::scope("/auth")
                        .service(auth::register)
                        .service(auth::login)
                        .service(auth::refresh)
                        .service(auth::logout),
                )
                .service(
                    web::scope("/tasks")
                        .wrap(AuthMiddleware)
                        .service(tasks::get_tasks)
                        .service(tasks::create_task)
                        .service(tasks::get_task)
                        .service(tasks::update_task)
                        .service(tasks::delete_task)
                        .service(tasks::toggle_task),
                ),
        )
        .default_service(web::to(route_not_found));
}

pub async fn route_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "success": false,
        "message": "Route not found"
    }))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::invalid("body", format!("Invalid JSON body: {}", err)).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::invalid("query", format!("Invalid query string: {}", err)).into()
    })
}

/// Task ids that are not UUIDs cannot name an existing task.
fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|_err, _req| {
        AppError::NotFound("Task not found".into()).into()
    })
}
