// Filmgraph - social film catalogue backend

// Core graph engine - stores, relations, ranking
pub mod core;

// Validated domain models
pub mod models;

// Service layer - orchestration of stores and relations
pub mod services;

// Persistence-backed store implementations
pub mod storage;

// HTTP adapter
pub mod api;

// Common utilities
pub mod app_state;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
