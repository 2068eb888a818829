//! Upload pipeline logic for Kindred.
//!
//! This crate contains the pipeline with ZERO web or database dependencies.
//! HTTP handlers and the HTTP client live in their own crates and call into
//! the types defined here.
//!
//! # Modules
//!
//! - `media` - Server-side batch ingestion and removal against a provider
//! - `storage` - OpenDAL-backed provider implementation and its configuration
//! - `upload` - Client-side validation, previews, orchestration and the upload surface

pub mod media;
pub mod storage;
pub mod upload;
