//! # API Shared
//!
//! Shared utilities and definitions for postmeta APIs.
//!
//! Contains:
//! - Wire types for the REST API (`types` module)
//! - Shared services like `HealthService`
//! - Authentication utilities
//!
//! Used by `api-rest` for common functionality.

pub mod auth;
pub mod health;
pub mod types;

pub use health::HealthService;
pub use types::*;
