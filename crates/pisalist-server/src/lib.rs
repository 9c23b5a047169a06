//! # pisalist-server
//!
//! HTTP boundary for PisaList.
//!
//! This crate provides:
//! - **REST API** (axum) under `/api/v1` for accounts, tasks and wishes
//! - **Bearer-token extractor** that resolves every protected request to a
//!   principal before the handler runs
//! - **Error mapping** from core failures to HTTP statuses
//! - **Configuration** loaded from the environment

pub mod api;
pub mod config;
pub mod error;

pub use api::{build_router, AppState};
pub use config::ServerConfig;
pub use error::ServerError;
