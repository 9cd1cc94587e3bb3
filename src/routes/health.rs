use actix_web::{get, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct HealthStatus {
    success: bool,
    status: &'static str,
    message: &'static str,
    timestamp: DateTime<Utc>,
}

/// Liveness probe. Needs no authentication and touches no store.
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthStatus {
        success: true,
        status: "ok",
        message: "Task Management API is running",
        timestamp: Utc::now(),
    })
}
