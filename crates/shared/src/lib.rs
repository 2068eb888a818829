//! Shared errors, auth claims, and configuration for Kindred.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types with HTTP status mapping
//! - JWT claims and the token service used to resolve admin sessions
//! - Layered configuration loading

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;


pub use auth::Claims;
pub use config::{AppConfig, JwtSettings, ServerConfig, UploadSettings};
pub use error::AppError;
pub use jwt::{JwtConfig, JwtError, JwtService};
