//! Results-screen extraction boundary
//!
//! Locates a game's screenshots by naming convention
//! (`{game_id}_rank_{n}.{jpg|jpeg|png}`), loads them in lexical file-name
//! order, and hands them with a fixed instruction to a `VisionExtractor`.
//! The model call itself lives behind that trait.

pub mod openai;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::GameResult;

pub use openai::OpenAiVisionClient;

/// Instruction sent with every set of results-screen images
pub const RESULT_SCREEN_INSTRUCTION: &str = "\
The images are end-of-match results screens from a battle-royale game. \
Extract the settlement block of every team.
Layout of the screen:
1. The top three teams show their placement as \"1ST\", \"2ND\", \"3RD\" at the far left.
2. The number in the colored square at the top-left corner of each team block is the \
team number. It is NOT the placement.
3. For every other team the placement is a plain grey number with no background, \
printed directly above the top-left corner of the team block.
4. Inside a team block the left column lists player names and the right column lists \
each player's eliminations.
Rules:
1. Cover every team in every image.
2. Never invent data.
3. Use only the rule in layout item 3 to tell placement apart from the team number.
4. When finished, re-check every team against these rules before answering.";

/// Accepted screenshot extensions
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Extraction errors
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No screenshots match the game identifier
    #[error("No images found for game '{game_id}' in {dir}")]
    NoImages { game_id: String, dir: String },

    /// Reading screenshots failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network communication error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Vision endpoint returned a non-success status
    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    /// Model output is not a results document
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Model output parsed but is structurally unusable
    #[error("Invalid result document: {0}")]
    Invalid(String),
}

/// One screenshot ready for submission
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Image set + instruction → structured results
#[async_trait]
pub trait VisionExtractor: Send + Sync {
    async fn extract(&self, instruction: &str, images: &[ImagePayload]) -> Result<GameResult, ExtractError>;
}

/// MIME type for an accepted extension (case-insensitive)
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

/// Screenshots for `game_id` in `dir`, sorted by file name
///
/// # Errors
/// `ExtractError::NoImages` when nothing matches.
pub fn discover_images(dir: &Path, game_id: &str) -> Result<Vec<PathBuf>, ExtractError> {
    let prefix = format!("{}_rank_", game_id);
    let no_images = || ExtractError::NoImages {
        game_id: game_id.to_string(),
        dir: dir.display().to_string(),
    };

    if !dir.is_dir() {
        return Err(no_images());
    }

    let mut matches: Vec<(String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let accepted = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);

        if accepted && stem.starts_with(&prefix) {
            matches.push((file_name, path));
        }
    }

    if matches.is_empty() {
        return Err(no_images());
    }

    matches.sort_by(|a, b| a.0.cmp(&b.0));
    tracing::debug!(game_id, count = matches.len(), "Discovered result images");
    Ok(matches.into_iter().map(|(_, path)| path).collect())
}

/// Read discovered screenshots, preserving order
pub async fn load_images(paths: &[PathBuf]) -> Result<Vec<ImagePayload>, ExtractError> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        images.push(ImagePayload {
            file_name,
            mime_type: mime_type_for(path).unwrap_or("image/jpeg"),
            bytes,
        });
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"img").unwrap();
    }

    #[test]
    fn test_discovery_filters_and_sorts_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "g7_rank_2.png",
            "g7_rank_1.jpg",
            "g7_rank_10.JPEG",
            "g7_rank_3.gif",
            "g70_rank_1.png",
            "g8_rank_1.png",
            "notes.txt",
        ] {
            touch(dir.path(), name);
        }

        let found = discover_images(dir.path(), "g7").unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        // Lexical, so rank_10 sorts before rank_2
        assert_eq!(names, vec!["g7_rank_1.jpg", "g7_rank_10.JPEG", "g7_rank_2.png"]);
    }

    #[test]
    fn test_discovery_without_matches_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "other_rank_1.png");

        let result = discover_images(dir.path(), "g7");
        assert!(matches!(result, Err(ExtractError::NoImages { .. })));
    }

    #[test]
    fn test_discovery_missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = discover_images(&dir.path().join("absent"), "g7");
        assert!(matches!(result, Err(ExtractError::NoImages { .. })));
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for(Path::new("a.JPG")), Some("image/jpeg"));
        assert_eq!(mime_type_for(Path::new("a.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_type_for(Path::new("a.png")), Some("image/png"));
        assert_eq!(mime_type_for(Path::new("a.webp")), None);
    }

    #[tokio::test]
    async fn test_load_images_keeps_order_and_type() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("g1_rank_1.png"), b"first").unwrap();
        std::fs::write(dir.path().join("g1_rank_2.jpg"), b"second").unwrap();

        let paths = discover_images(dir.path(), "g1").unwrap();
        let images = load_images(&paths).await.unwrap();

        assert_eq!(images.len(), 2);
        assert_eq!(images[0].mime_type, "image/png");
        assert_eq!(images[0].bytes, b"first");
        assert_eq!(images[1].file_name, "g1_rank_2.jpg");
    }
}
