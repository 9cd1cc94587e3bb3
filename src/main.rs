use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use taskboard::auth::service::AuthSettings;
use taskboard::auth::AuthService;
use taskboard::config::Config;
use taskboard::routes;
use taskboard::store::PgStore;
use taskboard::tasks::TaskService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(std::io::Error::other)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(std::io::Error::other)?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(std::io::Error::other)?;
    log::info!("Database migrations applied");

    let store = Arc::new(PgStore::new(pool));
    let auth_service = web::Data::new(AuthService::new(
        store.clone(),
        store.clone(),
        &config.jwt_secret,
        AuthSettings::from_config(&config),
    ));
    let task_service = web::Data::new(TaskService::new(store));

    let frontend_url = config.frontend_url.clone();
    log::info!("Starting Taskboard server at {}", config.server_url());
    log::info!("Health check: {}/api/health", config.server_url());

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_url)
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(auth_service.clone())
            .app_data(task_service.clone())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
