pub mod config;
pub mod entities;
pub mod error;
pub mod media;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod telemetry;
