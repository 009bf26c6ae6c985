//! Authoritative ranking source
//!
//! The authority is the scoring system of record. It returns one record per
//! team, already ordered by its own ranking. The list is fetched once per
//! check; unlike tie-break lookups, any failure here (including timeout) is
//! fatal to the check.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::model::AuthorityRecord;

const USER_AGENT: &str = concat!("scorecheck-rc/", env!("CARGO_PKG_VERSION"));

/// Authority source errors
#[derive(Debug, Error)]
pub enum AuthorityError {
    /// Network communication error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Authority returned a non-success status
    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    /// Response body is not a ranking list
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Fetch exceeded its deadline
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Local authority file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of the ordered authority list
#[async_trait]
pub trait AuthoritySource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<AuthorityRecord>, AuthorityError>;
}

/// Accepted payload shapes: `{"data": [...]}` or a bare array
#[derive(Deserialize)]
#[serde(untagged)]
enum AuthorityPayload {
    Envelope { data: Vec<AuthorityRecord> },
    Bare(Vec<AuthorityRecord>),
}

/// Parse an authority response body
pub fn parse_authority_payload(body: &str) -> Result<Vec<AuthorityRecord>, AuthorityError> {
    let payload: AuthorityPayload = serde_json::from_str(body)
        .map_err(|e| AuthorityError::ParseError(format!("unrecognized authority payload: {}", e)))?;

    Ok(match payload {
        AuthorityPayload::Envelope { data } => data,
        AuthorityPayload::Bare(records) => records,
    })
}

/// Read an authority list saved to disk
pub fn load_authority_file(path: &Path) -> Result<Vec<AuthorityRecord>, AuthorityError> {
    let body = std::fs::read_to_string(path)?;
    parse_authority_payload(&body)
}

/// HTTP authority client
pub struct HttpAuthorityClient {
    http_client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpAuthorityClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AuthorityError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AuthorityError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            url: url.into(),
            timeout,
        })
    }

    async fn request(&self) -> Result<Vec<AuthorityRecord>, AuthorityError> {
        tracing::debug!(url = %self.url, "Fetching authority ranking");

        let response = self.http_client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                AuthorityError::Timeout(self.timeout)
            } else {
                AuthorityError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuthorityError::ApiError(status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AuthorityError::NetworkError(e.to_string()))?;

        parse_authority_payload(&body)
    }
}

#[async_trait]
impl AuthoritySource for HttpAuthorityClient {
    async fn fetch(&self) -> Result<Vec<AuthorityRecord>, AuthorityError> {
        let records = tokio::time::timeout(self.timeout, self.request())
            .await
            .map_err(|_| AuthorityError::Timeout(self.timeout))??;

        tracing::info!(url = %self.url, teams = records.len(), "Authority ranking fetched");
        Ok(records)
    }
}

/// Fixed in-memory authority list
#[derive(Debug, Clone, Default)]
pub struct StaticAuthority {
    records: Vec<AuthorityRecord>,
}

impl StaticAuthority {
    pub fn new(records: Vec<AuthorityRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl AuthoritySource for StaticAuthority {
    async fn fetch(&self) -> Result<Vec<AuthorityRecord>, AuthorityError> {
        Ok(self.records.clone())
    }
}
