//! # Scorecheck Common Library
//!
//! Shared code for the scorecheck workspace:
//! - Error type used across crates
//! - Bootstrap configuration and root folder resolution
//! - SQLite pool initialization and the match ranking store

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
