#![doc = "The `taskboard` library crate."]
#![doc = ""]
#![doc = "Domain models, the persistence traits and their PostgreSQL and in-memory"]
#![doc = "implementations, the authentication and task services, the HTTP routes and"]
#![doc = "error handling for the Taskboard API. The binary (`main.rs`) wires them"]
#![doc = "together from the environment."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod response;
pub mod routes;
pub mod store;
pub mod tasks;

pub use crate::error::{AppError, AppResult};
