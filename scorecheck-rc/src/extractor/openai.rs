//! OpenAI-compatible vision client
//!
//! Sends the instruction and base64 data-URL images to
//! `{base_url}/chat/completions` with a JSON-schema response format and
//! parses the first choice into a `GameResult`.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{ExtractError, ImagePayload, VisionExtractor};
use crate::model::GameResult;

const USER_AGENT: &str = concat!("scorecheck-rc/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Vision model client
pub struct OpenAiVisionClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiVisionClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ExtractError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// JSON schema the model must answer with
///
/// Reconciler-owned fields (`final_ranking`, `tiebreak_stats`) are left out;
/// they default when the document is parsed.
pub fn game_result_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["teams"],
        "properties": {
            "teams": {
                "type": "array",
                "description": "Every team block found across all images",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["team_name", "ranking", "total_elims", "players"],
                    "properties": {
                        "team_name": { "type": "string", "description": "The name of the team" },
                        "ranking": { "type": "integer", "description": "The placement of the team in the game" },
                        "total_elims": {
                            "type": "integer",
                            "description": "Total eliminations of the team, equal to the sum of its players' eliminations"
                        },
                        "players": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "additionalProperties": false,
                                "required": ["player_name", "elims"],
                                "properties": {
                                    "player_name": { "type": "string" },
                                    "elims": { "type": "integer" }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

/// Chat completion request body
pub fn build_request_body(model: &str, instruction: &str, images: &[ImagePayload]) -> Value {
    let mut content = vec![json!({ "type": "text", "text": instruction })];
    for image in images {
        let data = general_purpose::STANDARD.encode(&image.bytes);
        content.push(json!({
            "type": "image_url",
            "image_url": { "url": format!("data:{};base64,{}", image.mime_type, data) }
        }));
    }

    json!({
        "model": model,
        "messages": [{ "role": "user", "content": content }],
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": "game_result",
                "strict": true,
                "schema": game_result_schema()
            }
        }
    })
}

/// Parse and validate the model's message content
///
/// Tolerates a surrounding markdown code fence.
pub fn parse_game_result(content: &str) -> Result<GameResult, ExtractError> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let game: GameResult = serde_json::from_str(body)
        .map_err(|e| ExtractError::ParseError(format!("model output is not a game result: {}", e)))?;
    game.validate()?;
    Ok(game)
}

#[async_trait]
impl VisionExtractor for OpenAiVisionClient {
    async fn extract(&self, instruction: &str, images: &[ImagePayload]) -> Result<GameResult, ExtractError> {
        let body = build_request_body(&self.model, instruction, images);

        tracing::info!(model = %self.model, images = images.len(), "Requesting results extraction");

        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ExtractError::ApiError(status.as_u16(), error_text));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::ParseError(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ExtractError::ParseError("completion has no message content".to_string()))?;

        let game = parse_game_result(&content)?;
        tracing::info!(teams = game.teams.len(), "Results extracted");
        Ok(game)
    }
}
