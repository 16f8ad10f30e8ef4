pub mod auth;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod favorites;
pub mod geo;
pub mod lifecycle;
pub mod listings;
pub mod models;
pub mod moderation;
pub mod openapi;
pub mod repo;
pub mod reputation;
pub mod reviews;
pub mod routes;

// Re-export commonly used items for tests / external users
pub use backend::Backend;
pub use config::Settings;
pub use routes::{config, AppState};
