//! Polypick Core Library
//!
//! Shared types, storage traits, API clients, and configuration for the
//! polypick decision pipeline.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod rate_limit;
pub mod store;
pub mod types;

pub use error::{Error, Result};
