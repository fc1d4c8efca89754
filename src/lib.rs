//! Athenaeum College Library Management Server
//!
//! A Rust implementation of a college library management backend,
//! providing a REST JSON API for the catalog, the borrower directory,
//! the borrow/return ledger and role-gated authentication.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
