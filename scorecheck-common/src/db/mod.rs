//! Database models and queries

pub mod init;
pub mod match_ranking;
pub mod models;

pub use init::*;
pub use match_ranking::*;
pub use models::*;
