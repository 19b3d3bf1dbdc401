//! Core types and shared functionality for wmcache.
//!
//! This crate provides:
//! - The webmention data model (`MentionRecord`, `CacheState`)
//! - A JSON file cache with atomic writes
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod mention;

pub use cache::CacheStore;
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use mention::{Author, CacheState, MentionContent, MentionRecord};
