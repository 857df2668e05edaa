//! Shared types, errors, and configuration for Vantage.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for tenants, users, roles and modules
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and token service

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;


pub use auth::Claims;
pub use config::{AppConfig, VisibilityConfig};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
