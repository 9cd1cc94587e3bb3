#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{http::header, test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;

use taskboard::auth::service::AuthSettings;
use taskboard::auth::AuthService;
use taskboard::routes;
use taskboard::store::MemoryStore;
use taskboard::tasks::TaskService;

pub const PASSWORD: &str = "Password123!";

/// Services over a fresh in-memory store. A low bcrypt cost keeps the suite fast.
pub fn services() -> (web::Data<AuthService>, web::Data<TaskService>) {
    let store = Arc::new(MemoryStore::new());
    let auth = AuthService::new(
        store.clone(),
        store.clone(),
        "integration-test-secret",
        AuthSettings {
            bcrypt_cost: 4,
            ..AuthSettings::default()
        },
    );
    (web::Data::new(auth), web::Data::new(TaskService::new(store)))
}

pub async fn init_app() -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    let (auth, tasks) = services();
    test::init_service(
        App::new()
            .app_data(auth)
            .app_data(tasks)
            .configure(routes::config),
    )
    .await
}

pub struct TestUser {
    pub id: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestUser {
    pub fn bearer(&self) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", self.access_token))
    }
}

/// Sends a request and returns the status with the parsed JSON body.
pub async fn send(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    req: test::TestRequest,
) -> (actix_web::http::StatusCode, Value) {
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            panic!("non-JSON body: {}", String::from_utf8_lossy(&body))
        })
    };
    (status, json)
}

pub async fn register_and_login(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
) -> TestUser {
    let (status, body) = send(
        app,
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({ "email": email, "password": PASSWORD, "name": "Test" })),
    )
    .await;
    assert_eq!(status, 201, "registration failed: {}", body);

    let (status, body) = send(
        app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, 200, "login failed: {}", body);

    TestUser {
        id: body["data"]["user"]["id"].as_str().unwrap().to_string(),
        access_token: body["data"]["accessToken"].as_str().unwrap().to_string(),
        refresh_token: body["data"]["refreshToken"].as_str().unwrap().to_string(),
    }
}
