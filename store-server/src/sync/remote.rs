//! Remote snapshot endpoints (primary store and secondary mirror)
//!
//! Both speak the same protocol: `GET` returns the whole [`StoreDocument`],
//! `POST` with the document body replaces it.

use reqwest::Client;
use shared::StoreDocument;
use std::time::Duration;
use thiserror::Error;

/// Which remote an endpoint plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteKind {
    /// Startup fetch overwrites memory unconditionally
    Primary,
    /// Startup fetch overwrites only non-empty collections
    Mirror,
}

impl RemoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteKind::Primary => "primary",
            RemoteKind::Mirror => "mirror",
        }
    }
}

impl std::fmt::Display for RemoteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote transport errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Remote returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

pub type SyncResult<T> = Result<T, SyncError>;

/// HTTP client for one remote snapshot endpoint
#[derive(Debug, Clone)]
pub struct RemoteStore {
    kind: RemoteKind,
    url: String,
    client: Client,
}

impl RemoteStore {
    pub fn new(kind: RemoteKind, url: impl Into<String>, timeout: Duration) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Client(e.to_string()))?;
        Ok(Self {
            kind,
            url: url.into(),
            client,
        })
    }

    pub fn kind(&self) -> RemoteKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the remote document
    pub async fn fetch(&self) -> SyncResult<StoreDocument> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<StoreDocument>().await?)
    }

    /// Replace the remote document
    pub async fn push(&self, doc: &StoreDocument) -> SyncResult<()> {
        let response = self.client.post(&self.url).json(doc).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
