//! scorecheck-rc library
//!
//! Results checker for battle-royale match screenshots: extracts per-team
//! results from end-of-match images, ranks the teams with the placement
//! points and tie-break cascade, and reports every discrepancy against the
//! authoritative ranking.

pub mod authority;
pub mod error;
pub mod extractor;
pub mod model;
pub mod pipeline;
pub mod reconciler;
pub mod scoring;
pub mod tiebreak;

pub use authority::{AuthorityError, AuthoritySource, HttpAuthorityClient, StaticAuthority};
pub use error::{CheckError, CheckResult};
pub use extractor::{ExtractError, OpenAiVisionClient, VisionExtractor};
pub use model::{
    AuthorityRecord, DataError, DataValue, ErrorList, ErrorType, GameResult, PlayerResult, TeamResult,
    TieBreakStats,
};
pub use pipeline::ResultsChecker;
pub use reconciler::Reconciler;
pub use tiebreak::{SqliteTieBreakStore, TieBreakProvider, TieBreakStore};
