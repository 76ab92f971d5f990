#![doc = "The `taskgate` library crate."]
#![doc = ""]
#![doc = "Domain models, persistence, authentication and authorization, routing and"]
#![doc = "error handling for the TaskGate task API. The binary (`main.rs`) only reads"]
#![doc = "configuration, picks the storage backends and starts the server."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod validation;

pub use crate::error::AppError;
pub use crate::state::AppState;
