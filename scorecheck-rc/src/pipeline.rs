//! Two-stage check pipeline
//!
//! Screenshots → extraction → (authority fetch) → reconciliation. Each
//! stage runs once per check; there are no retries.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::authority::AuthoritySource;
use crate::error::{CheckError, CheckResult};
use crate::extractor::{discover_images, load_images, VisionExtractor, RESULT_SCREEN_INSTRUCTION};
use crate::model::{ErrorList, GameResult};
use crate::reconciler::Reconciler;

pub struct ResultsChecker {
    extractor: Arc<dyn VisionExtractor>,
    authority: Arc<dyn AuthoritySource>,
    reconciler: Reconciler,
    images_dir: PathBuf,
}

impl ResultsChecker {
    pub fn new(
        extractor: Arc<dyn VisionExtractor>,
        authority: Arc<dyn AuthoritySource>,
        reconciler: Reconciler,
        images_dir: PathBuf,
    ) -> Self {
        Self {
            extractor,
            authority,
            reconciler,
            images_dir,
        }
    }

    /// Extract a game's screenshots into a validated `GameResult`
    pub async fn extract(&self, game_id: &str) -> CheckResult<GameResult> {
        if game_id.trim().is_empty() {
            return Err(CheckError::InvalidArgument("game id must not be empty".to_string()));
        }

        let paths = discover_images(&self.images_dir, game_id)?;
        let images = load_images(&paths).await?;
        info!(game_id, images = images.len(), "Extracting results");

        let game = self.extractor.extract(RESULT_SCREEN_INSTRUCTION, &images).await?;
        game.validate()?;

        info!(game_id, teams = game.teams.len(), "Extraction complete");
        Ok(game)
    }

    /// Full check of one game
    pub async fn check(&self, game_id: &str, stage: i64) -> CheckResult<ErrorList> {
        let mut game = self.extract(game_id).await?;

        let authority = self.authority.fetch().await?;
        info!(game_id, teams = authority.len(), "Authority ranking loaded");

        let errors = self.reconciler.reconcile(&mut game, stage, &authority).await?;
        info!(game_id, stage, errors = errors.len(), "Check complete");
        Ok(errors)
    }
}
