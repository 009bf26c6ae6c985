//! Error types for scorecheck-rc
//!
//! Structural and input failures abort a check and surface to the caller.
//! Discrepancies are not errors: they are `DataError` values in the
//! returned `ErrorList`. Tie-break store failures never appear here; they
//! degrade to zeroed stats inside the provider.

use thiserror::Error;

use crate::authority::AuthorityError;
use crate::extractor::ExtractError;

/// Failure of one check invocation
#[derive(Debug, Error)]
pub enum CheckError {
    /// Missing or malformed caller argument (team name, stage, game id)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A name lookup across the ranked teams found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Computed and authority lists disagree on cardinality or membership
    #[error("Roster mismatch: computed {computed} teams, authority {authority} teams ({detail})")]
    RosterMismatch {
        computed: usize,
        authority: usize,
        detail: String,
    },

    /// Image discovery or vision model failure
    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// Authoritative ranking fetch failure
    #[error("Authority fetch failed: {0}")]
    Authority(#[from] AuthorityError),
}

/// Result type for check operations
pub type CheckResult<T> = Result<T, CheckError>;
